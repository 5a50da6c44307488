//! Missing-issue detection for a Volume (§4.9): which whole numbers in the
//! expected run are absent from what's actually on disk.

use std::collections::BTreeSet;

use longbox_model::issue::Issue;

/// Expected range is `0..count-1` if issue "0" is present among `issues`,
/// else `1..count`, where `count` is the highest `Issue.count` value found
/// (a series' own idea of how many issues it has). Returns `None` when no
/// issue in the volume carries a `count`, since there's then nothing to
/// compare against.
pub fn missing_issues(issues: &[Issue]) -> Option<Vec<i32>> {
    let count = issues.iter().filter_map(|i| i.count).max()?;
    if count <= 0 {
        return None;
    }

    let observed: BTreeSet<i32> = issues
        .iter()
        .filter_map(|i| i.number.as_deref())
        .filter_map(|n| n.trim().parse::<i32>().ok())
        .collect();

    let starts_at_zero = observed.contains(&0);
    let expected: BTreeSet<i32> =
        if starts_at_zero { (0..count).collect() } else { (1..=count).collect() };

    Some(expected.difference(&observed).copied().collect())
}

/// Formats a sorted, deduplicated run of integers as contiguous ranges,
/// e.g. `[1, 2, 3, 7, 9, 10, 11] -> "1-3, 7, 9-11"`.
pub fn format_missing_ranges(missing: &[i32]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let mut sorted: Vec<i32> = missing.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::new();
    let mut start = sorted[0];
    let mut prev = sorted[0];

    for &n in &sorted[1..] {
        if n == prev + 1 {
            prev = n;
            continue;
        }
        ranges.push(render_range(start, prev));
        start = n;
        prev = n;
    }
    ranges.push(render_range(start, prev));
    ranges.join(", ")
}

fn render_range(start: i32, end: i32) -> String {
    if start == end { start.to_string() } else { format!("{start}-{end}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_runs_collapse_into_ranges() {
        assert_eq!(format_missing_ranges(&[1, 2, 3, 7, 9, 10, 11]), "1-3, 7, 9-11");
    }

    #[test]
    fn single_missing_value_renders_without_a_dash() {
        assert_eq!(format_missing_ranges(&[5]), "5");
    }

    #[test]
    fn empty_input_renders_empty_string() {
        assert_eq!(format_missing_ranges(&[]), "");
    }
}

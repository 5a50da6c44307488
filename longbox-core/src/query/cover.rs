//! Cover-issue selection for a Volume or Series (§4.9): the issue whose
//! thumbnail represents the container at large, e.g. in a grid view.

use longbox_model::issue::Issue;

use super::sort::{compare_issues, is_reverse_numbered};

#[cfg(test)]
fn test_issue(number: &str, format: Option<&str>) -> Issue {
    use chrono::Utc;
    use longbox_model::ids::{IssueId, VolumeId};

    Issue {
        id: IssueId::new(),
        volume_id: VolumeId::new(),
        file_path: format!("/tmp/{number}.cbz"),
        filename: format!("{number}.cbz"),
        file_size: 0,
        file_mtime: Utc::now(),
        page_count: 0,
        number: Some(number.to_string()),
        title: None,
        summary: None,
        cover_year: None,
        cover_month: None,
        cover_day: None,
        web_url: None,
        notes: None,
        age_rating: None,
        language_iso: None,
        community_rating: None,
        count: None,
        publisher: None,
        imprint: None,
        format: format.map(str::to_string),
        series_group: None,
        scan_info: None,
        alternate_series: None,
        alternate_number: None,
        story_arc: None,
        raw_metadata: None,
        thumbnail_path: None,
        cover_color: None,
        is_dirty: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Picks the representative issue for `issues` belonging to `series_name`.
///
/// Steps (in order): restrict to plain-format issues; drop "0", negative and
/// half issues from that restricted pool; of what's left, take the first in
/// canonical order. If the restricted pool is empty at any step, fall back to
/// the unrestricted pool ordered the same way — something is always returned
/// as long as `issues` is non-empty.
pub fn select_cover<'a>(issues: &'a [Issue], series_name: &str) -> Option<&'a Issue> {
    if issues.is_empty() {
        return None;
    }
    let reverse = is_reverse_numbered(series_name);

    let plain: Vec<&Issue> = issues.iter().filter(|i| super::sort::format_weight(i) == 1).collect();
    let pool = if plain.is_empty() { issues.iter().collect::<Vec<_>>() } else { plain };

    let restricted: Vec<&Issue> = pool.iter().copied().filter(|i| is_eligible_number(i.number.as_deref())).collect();
    let final_pool = if restricted.is_empty() { pool } else { restricted };

    final_pool.into_iter().min_by(|a, b| compare_issues(a, b, reverse))
}

fn is_eligible_number(number: Option<&str>) -> bool {
    let Some(raw) = number else { return true };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed == "0" {
        return false;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => n > 0.0 && n.fract() == 0.0,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: &str, format: Option<&str>) -> Issue {
        test_issue(number, format)
    }

    #[test]
    fn prefers_plain_format_issue_number_one() {
        let issues = vec![issue("1", None), issue("1", Some("Annual")), issue("2", None)];
        let cover = select_cover(&issues, "Example").unwrap();
        assert_eq!(cover.number.as_deref(), Some("1"));
        assert_eq!(cover.format, None);
    }

    #[test]
    fn skips_zero_and_half_issues_when_a_normal_issue_exists() {
        let issues = vec![issue("0", None), issue("0.5", None), issue("1", None)];
        let cover = select_cover(&issues, "Example").unwrap();
        assert_eq!(cover.number.as_deref(), Some("1"));
    }

    #[test]
    fn falls_back_to_zero_issue_when_nothing_else_is_eligible() {
        let issues = vec![issue("0", None), issue("-1", None)];
        let cover = select_cover(&issues, "Example").unwrap();
        assert_eq!(cover.number.as_deref(), Some("-1"));
    }

    #[test]
    fn reverse_numbered_series_picks_the_highest_number() {
        let issues = vec![issue("1", None), issue("2", None), issue("3", None)];
        let cover = select_cover(&issues, "Countdown to Infinite Crisis").unwrap();
        assert_eq!(cover.number.as_deref(), Some("3"));
    }
}

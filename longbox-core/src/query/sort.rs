//! Canonical issue ordering within a Volume or Series (§4.9): format
//! weight, then publication date, then a natural sort of the number
//! string. Distinct from the page sort key in `archive::sort_key` — issue
//! numbers carry decimals, vulgar fractions and negative signs that page
//! filenames never do.

use std::cmp::Ordering;

use longbox_model::issue::Issue;

/// A small curated set of series whose numbering counts down rather than
/// up (e.g. countdown-style limited series). Detection is a case-insensitive
/// substring match on the series name; this only flips the number key.
const REVERSE_NUMBERED_MARKERS: &[&str] = &["countdown"];

pub fn is_reverse_numbered(series_name: &str) -> bool {
    let lower = series_name.to_ascii_lowercase();
    REVERSE_NUMBERED_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// 1 = plain, 2 = annual, 3 = all other named specials (§4.9).
pub fn format_weight(issue: &Issue) -> u8 {
    match issue.format.as_deref().map(str::trim) {
        None => 1,
        Some(f) if f.is_empty() => 1,
        Some(f) if f.eq_ignore_ascii_case("plain") => 1,
        Some(f) if f.eq_ignore_ascii_case("annual") => 2,
        Some(_) => 3,
    }
}

/// `(year, month, day)` with the 9999/99/99 sentinel so a missing part
/// always sorts after every real date (§4.9).
pub fn date_key(issue: &Issue) -> (i32, i32, i32) {
    (
        issue.cover_year.unwrap_or(9999),
        issue.cover_month.unwrap_or(99),
        issue.cover_day.unwrap_or(99),
    )
}

#[derive(Debug, Clone, PartialEq)]
enum NumSegment {
    Num(f64),
    Text(String),
}

/// Splits an issue number into alternating numeric/text runs. `-1`, `1.5`
/// and the vulgar fractions `½ ¼ ¾` are recognised as single numeric runs;
/// everything else (`"Annual"`, the `a` in `"10a"`) is text, lowercased.
fn tokenize(raw: &str) -> Vec<NumSegment> {
    let normalized = raw.replace('½', ".5").replace('¼', ".25").replace('¾', ".75");
    let chars: Vec<char> = normalized.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    let starts_number = |chars: &[char], i: usize| -> bool {
        if i >= chars.len() {
            return false;
        }
        if chars[i].is_ascii_digit() {
            return true;
        }
        chars[i] == '-' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
    };

    while i < chars.len() {
        if starts_number(&chars, i) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || (chars[i] == '.' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())))
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            segments.push(NumSegment::Num(text.parse().unwrap_or(0.0)));
        } else {
            let start = i;
            while i < chars.len() && !starts_number(&chars, i) {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();
            segments.push(NumSegment::Text(text));
        }
    }
    segments
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let (sa, sb) = (tokenize(a), tokenize(b));
    for (x, y) in sa.iter().zip(sb.iter()) {
        let ord = match (x, y) {
            (NumSegment::Num(p), NumSegment::Num(q)) => p.partial_cmp(q).unwrap_or(Ordering::Equal),
            (NumSegment::Num(_), NumSegment::Text(_)) => Ordering::Less,
            (NumSegment::Text(_), NumSegment::Num(_)) => Ordering::Greater,
            (NumSegment::Text(p), NumSegment::Text(q)) => p.cmp(q),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    sa.len().cmp(&sb.len())
}

/// Full §4.9 comparator: format weight, then date, then natural number,
/// flipped for `reverse_numbered` series on the number key only.
pub fn compare_issues(a: &Issue, b: &Issue, reverse_numbered: bool) -> Ordering {
    format_weight(a)
        .cmp(&format_weight(b))
        .then_with(|| date_key(a).cmp(&date_key(b)))
        .then_with(|| {
            let number_cmp = compare_numbers(a.number.as_deref().unwrap_or(""), b.number.as_deref().unwrap_or(""));
            if reverse_numbered {
                number_cmp.reverse()
            } else {
                number_cmp
            }
        })
}

pub fn sort_issues(issues: &mut [Issue], reverse_numbered: bool) {
    issues.sort_by(|a, b| compare_issues(a, b, reverse_numbered));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers_sort_numerically_not_lexically() {
        assert_eq!(compare_numbers("2", "10"), Ordering::Less);
        assert_eq!(compare_numbers("10", "10a"), Ordering::Less);
    }

    #[test]
    fn negative_and_half_issues_sort_before_their_whole_number() {
        assert_eq!(compare_numbers("-1", "0"), Ordering::Less);
        assert_eq!(compare_numbers("1.5", "2"), Ordering::Less);
    }

    #[test]
    fn vulgar_fraction_behaves_like_its_decimal_equivalent() {
        assert_eq!(compare_numbers("½", "1"), compare_numbers("0.5", "1"));
    }

    #[test]
    fn text_only_numbers_sort_after_numeric_ones() {
        assert_eq!(compare_numbers("1", "Annual"), Ordering::Less);
    }

    #[test]
    fn reverse_numbered_detection_is_case_insensitive() {
        assert!(is_reverse_numbered("Final Crisis: COUNTDOWN"));
        assert!(!is_reverse_numbered("Amazing Spider-Man"));
    }
}

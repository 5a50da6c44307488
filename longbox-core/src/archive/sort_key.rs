//! Page ordering: natural sort with cover priority (§4.1, boundary cases
//! in §8). Mirrors the "missing sorts last" sort-key pattern used elsewhere
//! in this crate for issue ordering (`query::sort`).

const COVER_TOKENS: &[&str] = &["fc", "cover", "front", "scan"];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Number(u64),
    Text(String),
}

/// `(cover_priority, natural_segments)`. `cover_priority` is 0 for an
/// explicit cover filename, 1 otherwise, so covers always sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageSortKey {
    cover_priority: u8,
    segments: Vec<Segment>,
}

pub fn page_sort_key(filename: &str) -> PageSortKey {
    PageSortKey {
        cover_priority: if is_cover_filename(filename) { 0 } else { 1 },
        segments: natural_segments(filename),
    }
}

/// A token is a cover marker only when delimited by start/end/non-word/`_`
/// so `"discover.jpg"` is not promoted by the `"cover"` substring inside it.
fn is_cover_filename(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    let is_word_char = |c: char| c.is_ascii_alphanumeric();

    for token in COVER_TOKENS {
        let mut search_from = 0;
        while let Some(pos) = lower[search_from..].find(token) {
            let start = search_from + pos;
            let end = start + token.len();

            let before_ok = match lower[..start].chars().next_back() {
                None => true,
                Some(c) => !is_word_char(c),
            };
            let after_ok = match lower[end..].chars().next() {
                None => true,
                Some(c) => !is_word_char(c),
            };

            if before_ok && after_ok {
                return true;
            }
            search_from = start + 1;
        }
    }
    false
}

/// Splits the lowercased name into alternating digit/non-digit runs. `-` and
/// `_` are remapped to a character above the alphabet range first, so a
/// letter run like `"c01a"` sorts before the separator run in `"c01-"`.
fn natural_segments(filename: &str) -> Vec<Segment> {
    const SEPARATOR_STANDIN: char = '\u{10FFFF}';

    let normalized: String = filename
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { SEPARATOR_STANDIN } else { c })
        .collect();

    let mut segments = Vec::new();
    let mut chars = normalized.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            segments.push(Segment::Number(digits.parse().unwrap_or(u64::MAX)));
        } else {
            let mut text = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    break;
                }
                text.push(d);
                chars.next();
            }
            segments.push(Segment::Text(text));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| page_sort_key(a).cmp(&page_sort_key(b)));
        v
    }

    #[test]
    fn natural_sort_orders_digit_runs_numerically() {
        assert_eq!(sorted(&["01.jpg", "10.jpg", "2.jpg"]), vec!["01.jpg", "2.jpg", "10.jpg"]);
    }

    #[test]
    fn cover_token_promotes_but_substring_does_not() {
        assert_eq!(
            sorted(&["002.jpg", "cover.jpg", "discover.jpg"]),
            vec!["cover.jpg", "002.jpg", "discover.jpg"]
        );
    }

    #[test]
    fn letters_sort_before_separators_at_same_prefix() {
        assert_eq!(sorted(&["c01-.jpg", "c01a.jpg"]), vec!["c01a.jpg", "c01-.jpg"]);
    }

    #[test]
    fn fc_token_is_delimited_by_underscore() {
        assert!(is_cover_filename("page_fc_01.jpg"));
        assert!(!is_cover_filename("surfconditions_01.jpg"));
    }
}

//! Normalisation rules applied during the Scan Pipeline's fan-in stage
//! (§4.4 stage 4).

pub const DEFAULT_SERIES_NAME: &str = "Unknown Series";
pub const DEFAULT_VOLUME_NUMBER: i32 = 1;

/// `"½"` -> `"0.5"`, stray whitespace trimmed. Anything else passes through
/// unchanged — issue numbers are free text (`"10a"`, `"Annual"`, `"-1"`).
pub fn normalize_issue_number(raw: &str) -> String {
    raw.trim().replace('½', "0.5").replace('¼', "0.25").replace('¾', "0.75")
}

pub fn normalize_series_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_SERIES_NAME.to_string(),
    }
}

pub fn normalize_volume_number(raw: Option<i32>) -> i32 {
    raw.unwrap_or(DEFAULT_VOLUME_NUMBER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_issue_glyph_normalizes_to_decimal() {
        assert_eq!(normalize_issue_number("  ½ "), "0.5");
    }

    #[test]
    fn ordinary_numbers_pass_through_trimmed() {
        assert_eq!(normalize_issue_number(" 10a "), "10a");
        assert_eq!(normalize_issue_number("-1"), "-1");
    }

    #[test]
    fn blank_series_defaults() {
        assert_eq!(normalize_series_name(Some("  ")), DEFAULT_SERIES_NAME);
        assert_eq!(normalize_series_name(None), DEFAULT_SERIES_NAME);
        assert_eq!(normalize_series_name(Some("Saga")), "Saga");
    }

    #[test]
    fn missing_volume_defaults_to_one() {
        assert_eq!(normalize_volume_number(None), 1);
        assert_eq!(normalize_volume_number(Some(3)), 3);
    }
}

//! Metadata Parser (C2): turn the embedded metadata document into a
//! normalised record. Lenient by design — bad or partial input degrades to
//! `None` fields rather than failing the whole archive.

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Raw deserialisation target, field names matching the well-known
/// metadata document's schema. Every field is optional; the physical page
/// count from the archive always wins over `page_count` (§4.2, invariant 9).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawDocument {
    title: Option<String>,
    series: Option<String>,
    number: Option<String>,
    volume: Option<String>,
    summary: Option<String>,
    notes: Option<String>,
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
    writer: Option<String>,
    penciller: Option<String>,
    inker: Option<String>,
    colorist: Option<String>,
    letterer: Option<String>,
    cover_artist: Option<String>,
    editor: Option<String>,
    publisher: Option<String>,
    imprint: Option<String>,
    genre: Option<String>,
    web: Option<String>,
    page_count: Option<String>,
    language_iso: Option<String>,
    format: Option<String>,
    age_rating: Option<String>,
    series_group: Option<String>,
    alternate_series: Option<String>,
    alternate_number: Option<String>,
    alternate_count: Option<String>,
    story_arc: Option<String>,
    scan_information: Option<String>,
    characters: Option<String>,
    teams: Option<String>,
    locations: Option<String>,
    community_rating: Option<String>,
    count: Option<String>,
}

/// Parsed, normalised metadata document (§4.2).
#[derive(Debug, Clone, Default)]
pub struct ParsedMetadata {
    pub title: Option<String>,
    pub series: Option<String>,
    pub number: Option<String>,
    pub volume_number: Option<i32>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub cover_year: Option<i32>,
    pub cover_month: Option<i32>,
    pub cover_day: Option<i32>,
    pub web_url: Option<String>,
    pub age_rating_raw: Option<String>,
    pub language_iso: Option<String>,
    pub community_rating: Option<f32>,
    pub count: Option<i32>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub format: Option<String>,
    pub series_group: Option<String>,
    pub scan_info: Option<String>,
    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub story_arc: Option<String>,
    pub characters: Vec<String>,
    pub teams: Vec<String>,
    pub locations: Vec<String>,
    pub genres: Vec<String>,
    pub credits: Vec<(String, longbox_model::issue::CreditRole)>,
    /// Never trusted for page count (invariant 9); kept only so callers can
    /// log a discrepancy against the archive's physical count.
    pub declared_page_count: Option<i32>,
}

/// Parses the raw bytes of a metadata document. `CoreError::BadArchive` on
/// malformed XML — the caller is expected to fold that into a scan error,
/// never surface it to HTTP.
pub fn parse(bytes: &[u8]) -> Result<ParsedMetadata> {
    let raw: RawDocument = quick_xml::de::from_reader(std::io::Cursor::new(bytes))
        .map_err(|e| CoreError::BadArchive(format!("malformed metadata document: {e}")))?;

    let mut credits = Vec::new();
    append_credits(&mut credits, &raw.writer, longbox_model::issue::CreditRole::Writer);
    append_credits(&mut credits, &raw.penciller, longbox_model::issue::CreditRole::Penciller);
    append_credits(&mut credits, &raw.inker, longbox_model::issue::CreditRole::Inker);
    append_credits(&mut credits, &raw.colorist, longbox_model::issue::CreditRole::Colorist);
    append_credits(&mut credits, &raw.letterer, longbox_model::issue::CreditRole::Letterer);
    append_credits(&mut credits, &raw.cover_artist, longbox_model::issue::CreditRole::CoverArtist);
    append_credits(&mut credits, &raw.editor, longbox_model::issue::CreditRole::Editor);

    Ok(ParsedMetadata {
        title: non_blank(raw.title),
        series: non_blank(raw.series),
        number: raw.number.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        volume_number: parse_lenient_int(raw.volume.as_deref()),
        summary: non_blank(raw.summary),
        notes: non_blank(raw.notes),
        cover_year: parse_lenient_int(raw.year.as_deref()),
        cover_month: parse_lenient_int(raw.month.as_deref()),
        cover_day: parse_lenient_int(raw.day.as_deref()),
        web_url: non_blank(raw.web),
        age_rating_raw: non_blank(raw.age_rating),
        language_iso: non_blank(raw.language_iso),
        community_rating: parse_lenient_float(raw.community_rating.as_deref())
            .map(|r| r.clamp(0.0, 5.0)),
        count: parse_lenient_int(raw.count.as_deref()),
        publisher: non_blank(raw.publisher),
        imprint: non_blank(raw.imprint),
        format: non_blank(raw.format),
        series_group: non_blank(raw.series_group),
        scan_info: non_blank(raw.scan_information),
        alternate_series: non_blank(raw.alternate_series),
        alternate_number: non_blank(raw.alternate_number),
        story_arc: non_blank(raw.story_arc),
        characters: split_list(raw.characters.as_deref()),
        teams: split_list(raw.teams.as_deref()),
        locations: split_list(raw.locations.as_deref()),
        genres: split_list(raw.genre.as_deref()),
        credits,
        declared_page_count: parse_lenient_int(raw.page_count.as_deref()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Splits a comma-separated field, trims each item, drops blanks, and
/// de-duplicates while preserving first-seen order (§4.2, §4.3).
fn split_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else { return Vec::new() };
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in raw.split(',') {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

fn append_credits(
    out: &mut Vec<(String, longbox_model::issue::CreditRole)>,
    raw: &Option<String>,
    role: longbox_model::issue::CreditRole,
) {
    for name in split_list(raw.as_deref()) {
        out.push((name, role));
    }
}

/// Trims and accepts `,` as a decimal separator before parsing, per §4.2.
fn parse_lenient_int(raw: Option<&str>) -> Option<i32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok().map(|v| v as i32)
}

fn parse_lenient_float(raw: Option<&str>) -> Option<f32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_rating_clamps_to_range() {
        assert_eq!(parse_lenient_float(Some("9.5")).map(|v| v.clamp(0.0, 5.0)), Some(5.0));
        assert_eq!(parse_lenient_float(Some("-1")).map(|v| v.clamp(0.0, 5.0)), Some(0.0));
    }

    #[test]
    fn comma_decimal_separator_is_accepted() {
        assert_eq!(parse_lenient_float(Some("4,5")), Some(4.5));
    }

    #[test]
    fn split_list_trims_dedupes_and_preserves_order() {
        assert_eq!(
            split_list(Some("Moore, Gibbons , Moore,  ")),
            vec!["Moore".to_string(), "Gibbons".to_string()]
        );
    }

    #[test]
    fn blank_tag_parses_to_empty_list() {
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }
}

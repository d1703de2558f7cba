use serde::{Deserialize, Serialize};
use std::{fmt, num::IntErrorKind};
use tracing::warn;

const SORT_PREFIX: &str = "sort:";
const PER_PAGE_PREFIX: &str = "per-page:";
const MAX_PER_PAGE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Presentation directives pulled out of the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryMetadata {
    /// A canonical sort key, or several joined with `,`. Unknown keys are kept
    /// verbatim; the caller validates them against its own columns.
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    /// Clamped to `1..=200`.
    pub per_page: Option<u32>,
}

impl QueryMetadata {
    pub fn is_empty(&self) -> bool {
        self == &QueryMetadata::default()
    }
}

/// Removes `sort:` and `per-page:` directives and returns the remaining query,
/// re-joined with single spaces.
pub fn extract_metadata(query: &str) -> (String, QueryMetadata) {
    let mut metadata = QueryMetadata::default();
    let mut kept = Vec::new();

    for word in query.split_whitespace() {
        if let Some(value) = strip_prefix_ignore_case(word, SORT_PREFIX) {
            if !value.is_empty() {
                let (sort_by, sort_order) = parse_sort_value(value);
                metadata.sort_by = sort_by;
                metadata.sort_order = sort_order;
            }
        } else if let Some(value) = strip_prefix_ignore_case(word, PER_PAGE_PREFIX) {
            match parse_per_page(value) {
                Some(count) => metadata.per_page = Some(count),
                None => warn!("Invalid per-page value: {word}"),
            }
        } else {
            kept.push(word);
        }
    }

    (kept.join(" "), metadata)
}

/// Page size clamped to `1..=MAX_PER_PAGE`. Integers too large for `i64`
/// still clamp instead of failing.
fn parse_per_page(value: &str) -> Option<u32> {
    let count = match value.parse::<i64>() {
        Ok(count) => count,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => MAX_PER_PAGE,
            IntErrorKind::NegOverflow => 1,
            _ => return None,
        },
    };
    // Lossless: the clamp keeps the value inside u32.
    Some(count.clamp(1, MAX_PER_PAGE) as u32)
}

fn strip_prefix_ignore_case<'a>(word: &'a str, prefix: &str) -> Option<&'a str> {
    let head = word.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &word[prefix.len()..])
}

/// Reads a sort directive value: `size>`, `>size`, `download-date-desc`,
/// `duration;size-asc`, ...
pub fn parse_sort_value(value: &str) -> (Option<String>, Option<SortOrder>) {
    let value = value.trim_matches(['"', '\'']);
    let (field, order) = split_direction(value);

    if field.contains(';') || field.contains(',') {
        let separator = if field.contains(';') { ';' } else { ',' };
        let joined = field
            .split(separator)
            .map(str::trim)
            .map(|part| {
                sort_alias(&part.to_lowercase().replace(' ', "-"))
                    .map_or_else(|| part.to_string(), str::to_string)
            })
            .collect::<Vec<_>>()
            .join(",");
        return (Some(joined), order);
    }

    let normalized = field.to_lowercase().replace(' ', "-");
    if normalized.is_empty() {
        return (None, order);
    }
    let sort_by = sort_alias(&normalized)
        .map(str::to_string)
        .unwrap_or(normalized);
    (Some(sort_by), order)
}

fn split_direction(value: &str) -> (&str, Option<SortOrder>) {
    if let Some(field) = value.strip_suffix('>') {
        return (field, Some(SortOrder::Asc));
    }
    if let Some(field) = value.strip_prefix('>') {
        return (field, Some(SortOrder::Desc));
    }
    if let Some(field) = value.strip_suffix('<') {
        return (field, Some(SortOrder::Desc));
    }
    if let Some(field) = value.strip_prefix('<') {
        return (field, Some(SortOrder::Asc));
    }

    const SUFFIXES: [(&str, SortOrder); 8] = [
        ("-desc", SortOrder::Desc),
        ("_desc", SortOrder::Desc),
        ("-descending", SortOrder::Desc),
        ("_descending", SortOrder::Desc),
        ("-asc", SortOrder::Asc),
        ("_asc", SortOrder::Asc),
        ("-ascending", SortOrder::Asc),
        ("_ascending", SortOrder::Asc),
    ];
    SUFFIXES
        .iter()
        .find_map(|(suffix, order)| value.strip_suffix(suffix).map(|field| (field, Some(*order))))
        .unwrap_or((value, None))
}

/// Canonical sort key for a normalized (lower-case, dashed) name.
pub fn sort_alias(name: &str) -> Option<&'static str> {
    let canonical = match name {
        "download" | "download-date" | "download_date" | "downloaded" => "downloaded_at",
        "upload" | "upload-date" | "upload_date" | "uploaded" | "created" => "created_at",
        "id" | "post-id" | "post_id" => "post_id",
        "tags" | "tag-count" | "tag_count" | "tagcount" => "tag_count",
        "file-size" | "filesize" | "file_size" | "size" => "file_size",
        "score" => "score",
        "width" => "width",
        "height" => "height",
        "owner" | "user" | "creator" => "owner",
        "rating" => "rating",
        "duration" | "time" | "length" => "duration",
        "timestamp" => "timestamp",
        "random" => "random",
        _ => return None,
    };
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_are_removed_and_the_rest_is_rejoined() {
        let (clean, metadata) = extract_metadata("  red\tsort:score-desc   blue per-page:50 ");
        assert_eq!(clean, "red blue");
        assert_eq!(metadata.sort_by.as_deref(), Some("score"));
        assert_eq!(metadata.sort_order, Some(SortOrder::Desc));
        assert_eq!(metadata.per_page, Some(50));
    }

    #[test]
    fn prefixes_are_case_insensitive() {
        let (clean, metadata) = extract_metadata("SORT:size Per-Page:10");
        assert_eq!(clean, "");
        assert_eq!(metadata.sort_by.as_deref(), Some("file_size"));
        assert_eq!(metadata.per_page, Some(10));
    }

    #[test]
    fn per_page_is_clamped() {
        assert_eq!(extract_metadata("per-page:0").1.per_page, Some(1));
        assert_eq!(extract_metadata("per-page:-4").1.per_page, Some(1));
        assert_eq!(extract_metadata("per-page:5000").1.per_page, Some(200));
        assert_eq!(
            extract_metadata("per-page:99999999999999999999999").1.per_page,
            Some(200)
        );
        assert_eq!(
            extract_metadata("per-page:-99999999999999999999999").1.per_page,
            Some(1)
        );
    }

    #[test]
    fn bad_per_page_is_dropped() {
        let (clean, metadata) = extract_metadata("cat per-page:lots");
        assert_eq!(clean, "cat");
        assert_eq!(metadata.per_page, None);
    }

    #[test]
    fn empty_sort_sets_nothing() {
        let (clean, metadata) = extract_metadata("cat sort:");
        assert_eq!(clean, "cat");
        assert!(metadata.is_empty());
    }

    #[test]
    fn later_directives_win() {
        let (_, metadata) = extract_metadata("sort:score-desc sort:width");
        assert_eq!(metadata.sort_by.as_deref(), Some("width"));
        assert_eq!(metadata.sort_order, None);
    }

    #[test]
    fn direction_glyphs() {
        assert_eq!(
            parse_sort_value("size>"),
            (Some("file_size".into()), Some(SortOrder::Asc))
        );
        assert_eq!(
            parse_sort_value(">size"),
            (Some("file_size".into()), Some(SortOrder::Desc))
        );
        assert_eq!(
            parse_sort_value("size<"),
            (Some("file_size".into()), Some(SortOrder::Desc))
        );
        assert_eq!(
            parse_sort_value("<size"),
            (Some("file_size".into()), Some(SortOrder::Asc))
        );
    }

    #[test]
    fn direction_suffixes() {
        assert_eq!(
            parse_sort_value("download-date-desc"),
            (Some("downloaded_at".into()), Some(SortOrder::Desc))
        );
        assert_eq!(
            parse_sort_value("size-ascending"),
            (Some("file_size".into()), Some(SortOrder::Asc))
        );
        assert_eq!(
            parse_sort_value("upload_descending"),
            (Some("created_at".into()), Some(SortOrder::Desc))
        );
        assert_eq!(parse_sort_value("score"), (Some("score".into()), None));
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(
            parse_sort_value("\"time-asc\""),
            (Some("duration".into()), Some(SortOrder::Asc))
        );
    }

    #[test]
    fn multiple_fields() {
        assert_eq!(
            parse_sort_value("duration;size-asc"),
            (Some("duration,file_size".into()), Some(SortOrder::Asc))
        );
        assert_eq!(
            parse_sort_value("score,Mystery"),
            (Some("score,Mystery".into()), None)
        );
    }

    #[test]
    fn unknown_single_field_is_lower_cased() {
        assert_eq!(parse_sort_value("Mystery"), (Some("mystery".into()), None));
    }

    #[test]
    fn lone_glyph_has_no_field() {
        assert_eq!(parse_sort_value(">"), (None, Some(SortOrder::Asc)));
    }
}

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{Error, Result};
use crate::taxonomy::PathNames;

/// Accepted header spellings per column, display form first.
pub const INDUSTRY_HEADERS: &[&str] = &["Industry", "industry"];
pub const ASSET_CLASS_HEADERS: &[&str] = &["Asset Class", "assetName"];
pub const MAKE_HEADERS: &[&str] = &["Make", "makeName"];
pub const MODEL_HEADERS: &[&str] = &["Model", "modelName"];

/// Decodes a base64 upload into CSV text.
///
/// The decoded size is checked against `max_bytes` before UTF-8 validation.
/// A leading byte order mark is dropped.
pub fn decode_payload(encoded: &str, max_bytes: usize) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Decode(format!("file buffer is not valid base64: {e}")))?;

    if bytes.len() > max_bytes {
        return Err(Error::PayloadTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let text = String::from_utf8(bytes)
        .map_err(|e| Error::Decode(format!("file is not valid UTF-8: {e}")))?;

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// The four taxonomy columns of one data row, trimmed. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields {
    pub industry: Option<String>,
    pub asset_class: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl RowFields {
    /// Returns the names when all four columns are present.
    pub fn names(&self) -> Option<PathNames<'_>> {
        Some(PathNames {
            industry: self.industry.as_deref()?,
            asset_class: self.asset_class.as_deref()?,
            make: self.make.as_deref()?,
            model: self.model.as_deref()?,
        })
    }
}

/// One data row and its line number in the file (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub row_num: usize,
    pub fields: RowFields,
}

/// Splits CSV text into data rows numbered `index + 2`.
///
/// Empty lines are skipped by the reader. A line of bare separators such as
/// `,,,` is still a row, with every field blank.
pub fn parse_rows(text: &str) -> Result<Vec<CsvRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let header_map = build_header_map(&headers);

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        rows.push(CsvRow {
            row_num: idx + 2,
            fields: RowFields {
                industry: get_field(&record, &header_map, INDUSTRY_HEADERS),
                asset_class: get_field(&record, &header_map, ASSET_CLASS_HEADERS),
                make: get_field(&record, &header_map, MAKE_HEADERS),
                model: get_field(&record, &header_map, MODEL_HEADERS),
            },
        });
    }

    Ok(rows)
}

/// Maps trimmed header names to column indexes; the first occurrence wins.
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        map.entry(h.trim().to_string()).or_insert(i);
    }
    map
}

/// Returns the first non-blank value among the given header aliases.
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    aliases: &[&str],
) -> Option<String> {
    aliases.iter().find_map(|alias| {
        header_map
            .get(*alias)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

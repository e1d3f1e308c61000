//! Bulk CSV import of equipment.
//!
//! An upload travels as an [`ImportRequest`] carrying the file as base64.
//! [`ImportPipeline`] decodes it, walks the rows in file order, resolves
//! each row's taxonomy path and inserts one equipment row per data row.
//! A bad row is recorded in the [`ImportSummary`] and never stops the batch;
//! only an undecodable or empty file fails the whole import.

mod pipeline;
mod rows;

pub use pipeline::ImportPipeline;
pub use rows::{
    ASSET_CLASS_HEADERS, CsvRow, INDUSTRY_HEADERS, MAKE_HEADERS, MODEL_HEADERS, RowFields,
    decode_payload, parse_rows,
};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Message recorded for rows lacking any of the four taxonomy columns.
pub const MISSING_FIELDS: &str =
    "Missing required fields (industry, assetName, makeName, or modelName)";

/// Payload of one import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// File contents, base64 encoded.
    pub file_buffer: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub user_id: String,
    #[serde(default = "default_skip_duplicates")]
    pub skip_duplicates: bool,
    #[serde(default)]
    pub update_existing: bool,
}

fn default_skip_duplicates() -> bool {
    true
}

impl ImportRequest {
    /// Builds a request from raw file bytes with default options.
    pub fn from_bytes(
        file_name: impl Into<String>,
        bytes: &[u8],
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            file_buffer: STANDARD.encode(bytes),
            file_name: file_name.into(),
            project_id: None,
            user_id: user_id.into(),
            skip_duplicates: true,
            update_existing: false,
        }
    }
}

/// Outcome of an import. `errors` counts rows listed in `error_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
}

impl ImportSummary {
    fn record_error(&mut self, row_num: usize, message: impl std::fmt::Display) {
        self.errors += 1;
        self.error_details.push(format!("Row {row_num}: {message}"));
    }
}

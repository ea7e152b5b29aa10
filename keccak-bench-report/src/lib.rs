#![warn(missing_docs)]
//! keccak-bench Report - Result Rendering
//!
//! Turns an ordered list of [`CandidateResult`] records into output:
//! - Table (pipe-separated, fixed precision)
//! - JSON (machine-readable, order-preserving)
//!
//! Rendering never filters or reorders records.

mod json;
mod report;
mod table;

pub use json::generate_json_report;
pub use report::CandidateResult;
pub use table::{CHECKSUM_PLACEHOLDER, TABLE_HEADERS, generate_table};

use thiserror::Error;

/// Rendering failure
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization failed
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON array of records
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "human" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render `results` in the requested format.
pub fn render(results: &[CandidateResult], format: OutputFormat) -> Result<String, ReportError> {
    Ok(match format {
        OutputFormat::Table => generate_table(results),
        OutputFormat::Json => generate_json_report(results)?,
    })
}

//! Plain-Text Table

use crate::report::CandidateResult;

/// Column headers, in order
pub const TABLE_HEADERS: [&str; 4] = ["implementation", "seconds", "hashes/s", "checksum"];

/// Shown in the checksum column when a candidate has none
pub const CHECKSUM_PLACEHOLDER: &str = "-";

/// Render results as a pipe-separated table.
///
/// An empty slice still produces the header and rule lines.
pub fn generate_table(results: &[CandidateResult]) -> String {
    let mut lines = Vec::with_capacity(results.len() + 2);
    lines.push(TABLE_HEADERS.join(" | "));
    lines.push(
        TABLE_HEADERS
            .iter()
            .map(|h| "-".repeat(h.len()))
            .collect::<Vec<_>>()
            .join(" | "),
    );

    for result in results {
        let checksum = result
            .checksum
            .map(|c| c.to_string())
            .unwrap_or_else(|| CHECKSUM_PLACEHOLDER.to_string());
        lines.push(format!(
            "{} | {:.6} | {:.2} | {}",
            result.implementation, result.seconds, result.hashes_per_second, checksum
        ));
    }

    lines.join("\n")
}

//! Result Records

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Measurement outcome of one candidate.
///
/// In-process candidates carry a checksum; external ones cannot observe
/// digest values and leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Implementation name
    pub implementation: String,
    /// Elapsed wall-clock seconds (> 0)
    pub seconds: f64,
    /// Total hashes divided by elapsed seconds
    pub hashes_per_second: f64,
    /// XOR of digest fragments, in-process only
    pub checksum: Option<u64>,
}

impl CandidateResult {
    /// Build a record, deriving throughput from the operation count.
    ///
    /// Durations below one nanosecond are raised to one nanosecond.
    pub fn new(
        implementation: impl Into<String>,
        elapsed: Duration,
        total_hashes: u64,
        checksum: Option<u64>,
    ) -> Self {
        let seconds = elapsed.max(Duration::from_nanos(1)).as_secs_f64();
        Self {
            implementation: implementation.into(),
            seconds,
            hashes_per_second: total_hashes as f64 / seconds,
            checksum,
        }
    }
}

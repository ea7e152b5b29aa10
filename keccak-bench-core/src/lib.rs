#![warn(missing_docs)]
//! keccak-bench Core - Workload and In-Process Timing
//!
//! This crate provides everything measured inside the harness process:
//! - [`WorkloadParameters`]: the deterministic message workload
//! - [`InProcessTimer`]: warm-up plus timed rounds with an XOR checksum
//! - [`LibraryCandidate`]: Keccak-256 library baselines behind cargo features
//! - [`Stopwatch`]: wall-clock timing with cycle counter readings

mod candidate;
mod measure;
mod timer;
mod workload;

pub use candidate::{CandidateError, DigestFn, LibraryCandidate};
pub use measure::{HAS_CYCLE_COUNTER, Lap, Stopwatch, pin_to_cpu};
pub use timer::{InProcessTimer, Measurement, WARMUP_PASSES};
pub use workload::{Messages, WorkloadError, WorkloadParameters};

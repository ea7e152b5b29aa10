#![warn(missing_docs)]
//! # keccak-bench
//!
//! Throughput harness comparing Keccak-256 implementations on one fixed,
//! deterministic workload:
//! - **Deterministic workload**: 512 messages of 32..=512 bytes derived from
//!   integer arithmetic, regenerated on every pass
//! - **In-process baselines**: the `sha3` and `tiny-keccak` crates, measured
//!   after three warm-up passes with an XOR checksum guarding the results
//! - **External toolchain**: a companion program timed end to end, both run
//!   directly and as a compiled binary
//! - **Reporting**: one table or JSON array with seconds, hashes/s and checksum
//!
//! ## Quick Start
//!
//! ```ignore
//! use keccak_bench::{InProcessTimer, LibraryCandidate, WorkloadParameters};
//!
//! let digest = LibraryCandidate::Sha3.resolve()?;
//! let m = InProcessTimer::new(WorkloadParameters::DEFAULT).run(digest);
//! println!("{:.2} hashes/s (checksum {})", m.throughput(), m.checksum);
//! ```

// Re-export core types
pub use keccak_bench_core::{
    CandidateError, DigestFn, HAS_CYCLE_COUNTER, InProcessTimer, Lap, LibraryCandidate,
    Measurement, Messages, Stopwatch, WARMUP_PASSES, WorkloadError, WorkloadParameters,
    pin_to_cpu,
};

// Re-export reporting
pub use keccak_bench_report::{
    CHECKSUM_PLACEHOLDER, CandidateResult, OutputFormat, ReportError, TABLE_HEADERS,
    generate_json_report, generate_table, render,
};

// Re-export orchestration
pub use keccak_bench_cli::{
    BenchConfig, CapabilityProbe, Cli, ExecutionPlan, ExternalMode, ExternalRunner,
    HelpTextProbe, PlannedCandidate, RunError, RunSettings, Selection, Toolchain,
    ToolchainConfig, ToolchainError, build_plan, execute_plan, run_with_cli,
};

/// Run the keccak-bench command line.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     keccak_bench::run()
/// }
/// ```
pub use keccak_bench_cli::run;

//! Candidate Planner
//!
//! Turns the skip flags into an ordered list of candidates.
//!
//! Ordering is fixed: library baselines first, then the external direct-run
//! candidate, then the external build-then-run candidate.

use keccak_bench_core::LibraryCandidate;
use std::fmt;

/// Which external measurement mode to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalMode {
    /// Run the companion source directly through the toolchain
    Direct,
    /// Build a binary first, then time the binary
    Compiled,
}

/// One planned measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedCandidate {
    /// In-process library baseline
    Library(LibraryCandidate),
    /// Companion program run through the external toolchain
    External(ExternalMode),
}

impl fmt::Display for PlannedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedCandidate::Library(lib) => write!(f, "{} (in-process)", lib),
            PlannedCandidate::External(ExternalMode::Direct) => f.write_str("external direct-run"),
            PlannedCandidate::External(ExternalMode::Compiled) => {
                f.write_str("external build-then-run")
            }
        }
    }
}

/// Candidate selection flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Skip the sha3 baseline
    pub skip_sha3: bool,
    /// Skip the tiny-keccak baseline
    pub skip_tiny_keccak: bool,
    /// Skip both external candidates
    pub skip_external: bool,
    /// Skip the direct-run candidate
    pub skip_direct: bool,
    /// Skip the build-then-run candidate
    pub skip_compiled: bool,
}

/// Execution plan for candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Candidates in execution order
    pub candidates: Vec<PlannedCandidate>,
}

impl ExecutionPlan {
    /// Whether any external candidate is planned
    pub fn needs_toolchain(&self) -> bool {
        self.candidates
            .iter()
            .any(|c| matches!(c, PlannedCandidate::External(_)))
    }
}

/// Build the execution plan from selection flags.
pub fn build_plan(selection: &Selection) -> ExecutionPlan {
    let mut candidates = Vec::with_capacity(4);

    for lib in LibraryCandidate::ALL {
        let skipped = match lib {
            LibraryCandidate::Sha3 => selection.skip_sha3,
            LibraryCandidate::TinyKeccak => selection.skip_tiny_keccak,
        };
        if !skipped {
            candidates.push(PlannedCandidate::Library(lib));
        }
    }

    if !selection.skip_external {
        if !selection.skip_direct {
            candidates.push(PlannedCandidate::External(ExternalMode::Direct));
        }
        if !selection.skip_compiled {
            candidates.push(PlannedCandidate::External(ExternalMode::Compiled));
        }
    }

    ExecutionPlan { candidates }
}

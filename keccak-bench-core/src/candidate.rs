//! In-Process Candidates
//!
//! Library implementations of Keccak-256 measured inside the harness process.
//! Each one is compiled in behind a cargo feature; a candidate whose feature
//! was left out resolves to [`CandidateError::MissingDependency`] instead of a
//! digest function.

use thiserror::Error;

/// Maps a message to an integer digest fragment (the first digest byte).
pub type DigestFn = fn(&[u8]) -> u64;

/// Failure to obtain an in-process candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// The backing crate was not compiled into this binary
    #[error(
        "Missing optional dependency '{krate}'. Rebuild with `cargo build --features {feature}` \
         (enabled by default) before running the benchmarks."
    )]
    MissingDependency {
        /// Crate providing the implementation
        krate: &'static str,
        /// Cargo feature that compiles it in
        feature: &'static str,
    },
}

/// Library baselines, in the order the harness runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryCandidate {
    /// RustCrypto `sha3::Keccak256`
    Sha3,
    /// `tiny_keccak::Keccak::v256`
    TinyKeccak,
}

impl LibraryCandidate {
    /// Every library baseline in execution order
    pub const ALL: [LibraryCandidate; 2] = [LibraryCandidate::Sha3, LibraryCandidate::TinyKeccak];

    /// Implementation name as it appears in reports
    pub fn name(self) -> &'static str {
        match self {
            LibraryCandidate::Sha3 => "sha3",
            LibraryCandidate::TinyKeccak => "tiny-keccak",
        }
    }

    /// Cargo feature gating this candidate
    pub fn feature(self) -> &'static str {
        match self {
            LibraryCandidate::Sha3 => "sha3-baseline",
            LibraryCandidate::TinyKeccak => "tiny-keccak-baseline",
        }
    }

    /// Whether the backing crate is compiled in
    pub fn is_available(self) -> bool {
        self.digest_fn().is_some()
    }

    /// Resolve the digest function, failing if the crate is absent.
    pub fn resolve(self) -> Result<DigestFn, CandidateError> {
        self.digest_fn().ok_or(CandidateError::MissingDependency {
            krate: self.name(),
            feature: self.feature(),
        })
    }

    fn digest_fn(self) -> Option<DigestFn> {
        match self {
            #[cfg(feature = "sha3-baseline")]
            LibraryCandidate::Sha3 => Some(sha3_fragment),
            #[cfg(feature = "tiny-keccak-baseline")]
            LibraryCandidate::TinyKeccak => Some(tiny_keccak_fragment),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl std::fmt::Display for LibraryCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "sha3-baseline")]
fn sha3_fragment(msg: &[u8]) -> u64 {
    use sha3::{Digest, Keccak256};

    u64::from(Keccak256::digest(msg)[0])
}

#[cfg(feature = "tiny-keccak-baseline")]
fn tiny_keccak_fragment(msg: &[u8]) -> u64 {
    use tiny_keccak::{Hasher, Keccak};

    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(msg);
    hasher.finalize(&mut out);
    u64::from(out[0])
}

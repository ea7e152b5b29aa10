//! Deterministic Workload
//!
//! Every pass over the workload re-derives the same sequence of messages from
//! integer arithmetic alone. Nothing is cached between passes, so a later pass
//! cannot benefit from work done by an earlier one.
//!
//! ```text
//! length(i) = L0 + (i * S) mod (Lmax - L0 + 1)
//! byte(i, j) = (i + j) mod 256
//! ```

use thiserror::Error;

/// Invalid workload shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadError {
    /// A parameter that must be positive was zero
    #[error("workload parameter `{0}` must be positive")]
    NotPositive(&'static str),

    /// The length range is empty
    #[error("max_length ({max_length}) must be >= base_length ({base_length})")]
    InvertedLengthRange {
        /// Requested base length
        base_length: usize,
        /// Requested maximum length
        max_length: usize,
    },
}

/// Shape of the benchmark workload.
///
/// The external companion program embeds the same numbers; keep
/// [`WorkloadParameters::DEFAULT`] in sync with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadParameters {
    messages: usize,
    rounds: usize,
    base_length: usize,
    max_length: usize,
    length_stride: usize,
}

impl WorkloadParameters {
    /// The workload every harness run measures.
    pub const DEFAULT: Self = Self {
        messages: 512,
        rounds: 200,
        base_length: 32,
        max_length: 512,
        length_stride: 31,
    };

    /// Build a custom workload, validating its shape.
    pub fn new(
        messages: usize,
        rounds: usize,
        base_length: usize,
        max_length: usize,
        length_stride: usize,
    ) -> Result<Self, WorkloadError> {
        for (name, value) in [
            ("messages", messages),
            ("rounds", rounds),
            ("base_length", base_length),
            ("max_length", max_length),
            ("length_stride", length_stride),
        ] {
            if value == 0 {
                return Err(WorkloadError::NotPositive(name));
            }
        }
        if max_length < base_length {
            return Err(WorkloadError::InvertedLengthRange {
                base_length,
                max_length,
            });
        }

        Ok(Self {
            messages,
            rounds,
            base_length,
            max_length,
            length_stride,
        })
    }

    /// Messages per pass (N)
    pub fn messages(&self) -> usize {
        self.messages
    }

    /// Measured passes (R)
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Shortest message length (L0)
    pub fn base_length(&self) -> usize {
        self.base_length
    }

    /// Longest message length (Lmax)
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Length stride (S)
    pub fn length_stride(&self) -> usize {
        self.length_stride
    }

    /// Hash invocations in one measured run (N * R)
    pub fn total_hashes(&self) -> u64 {
        self.messages as u64 * self.rounds as u64
    }

    /// Length of message `index`, always within `[base_length, max_length]`.
    pub fn message_length(&self, index: usize) -> usize {
        let span = (self.max_length - self.base_length) as u128 + 1;
        // Widened product: index * stride fits in u128 for any usize inputs.
        let step = (index as u128 * self.length_stride as u128) % span;
        self.base_length + step as usize
    }

    /// Derive message `index` into a fresh buffer.
    pub fn message(&self, index: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.message_length(index));
        self.fill_message(index, &mut buf);
        buf
    }

    /// Derive message `index` into `buf`, replacing its previous contents.
    #[inline]
    pub fn fill_message(&self, index: usize, buf: &mut Vec<u8>) {
        let len = self.message_length(index);
        buf.clear();
        buf.extend((0..len).map(|offset| ((index + offset) % 256) as u8));
    }

    /// One full pass over the workload. Each call starts a new pass.
    pub fn iter_messages(&self) -> Messages<'_> {
        Messages {
            params: self,
            next: 0,
        }
    }
}

impl Default for WorkloadParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lazy iterator over one pass of the workload
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    params: &'a WorkloadParameters,
    next: usize,
}

impl Iterator for Messages<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.params.messages {
            return None;
        }
        let msg = self.params.message(self.next);
        self.next += 1;
        Some(msg)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.params.messages - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Messages<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lengths() {
        let params = WorkloadParameters::DEFAULT;
        assert_eq!(params.message_length(0), 32);
        assert_eq!(params.message_length(1), 63);
        assert_eq!(params.total_hashes(), 512 * 200);
    }

    #[test]
    fn test_first_message_bytes() {
        let params = WorkloadParameters::DEFAULT;
        let expected: Vec<u8> = (0..32).collect();
        assert_eq!(params.message(0), expected);
    }

    #[test]
    fn test_bytes_wrap_at_256() {
        let params = WorkloadParameters::DEFAULT;
        let msg = params.message(250);
        assert_eq!(msg[0], 250);
        assert_eq!(msg[5], 255);
        assert_eq!(msg[6], 0);
    }

    #[test]
    fn test_lengths_stay_in_range() {
        let params = WorkloadParameters::DEFAULT;
        for i in 0..params.messages() {
            let len = params.message_length(i);
            assert!((32..=512).contains(&len), "length {} out of range at {}", len, i);
            assert_eq!(params.message(i).len(), len);
        }
    }

    #[test]
    fn test_regeneration_is_identical() {
        let params = WorkloadParameters::DEFAULT;
        let first: Vec<Vec<u8>> = params.iter_messages().collect();
        let second: Vec<Vec<u8>> = params.iter_messages().collect();
        assert_eq!(first.len(), 512);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_message_replaces_contents() {
        let params = WorkloadParameters::DEFAULT;
        let mut buf = vec![0xAA; 1024];
        params.fill_message(3, &mut buf);
        assert_eq!(buf, params.message(3));
    }

    #[test]
    fn test_huge_index_does_not_overflow() {
        let params = WorkloadParameters::DEFAULT;
        let len = params.message_length(usize::MAX);
        assert!((32..=512).contains(&len));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_wide_length_range_does_not_overflow() {
        let params = WorkloadParameters::new(1 << 40, 1, 1, 1 << 40, (1 << 39) + 1).unwrap();
        // (2^39 + 1)^2 = 2^78 + 2^40 + 1, which is 1 mod 2^40
        assert_eq!(params.message_length((1 << 39) + 1), 2);
        assert!((1..=1 << 40).contains(&params.message_length(usize::MAX)));
    }

    #[test]
    fn test_single_length_range() {
        let params = WorkloadParameters::new(4, 1, 16, 16, 7).unwrap();
        assert!(params.iter_messages().all(|m| m.len() == 16));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            WorkloadParameters::new(0, 1, 1, 1, 1),
            Err(WorkloadError::NotPositive("messages"))
        );
        assert_eq!(
            WorkloadParameters::new(1, 1, 64, 32, 1),
            Err(WorkloadError::InvertedLengthRange {
                base_length: 64,
                max_length: 32
            })
        );
    }
}

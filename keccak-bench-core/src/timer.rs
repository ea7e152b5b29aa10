//! In-Process Timer
//!
//! Drives a digest function over the workload in two phases:
//!
//! 1. **Warm-up**: [`WARMUP_PASSES`] full passes, results discarded, not timed.
//! 2. **Measurement**: `rounds` full passes under one stopwatch window, every
//!    digest fragment folded into an XOR checksum.
//!
//! The checksum depends only on the workload and the candidate, so two runs
//! of the same candidate agree on it regardless of timing.

use crate::measure::{Lap, Stopwatch, pin_to_cpu};
use crate::workload::WorkloadParameters;
use std::hint::black_box;
use std::time::Duration;

/// Untimed passes run before measurement
pub const WARMUP_PASSES: usize = 3;

/// Outcome of one measured run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Wall-clock time of the measured phase
    pub elapsed: Duration,
    /// Counter ticks of the measured phase (0 without a cycle counter)
    pub cycles: u64,
    /// Digest invocations in the measured phase
    pub hashes: u64,
    /// XOR of every digest fragment
    pub checksum: u64,
}

impl Measurement {
    /// Elapsed time in seconds (always > 0)
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Hashes per second
    pub fn throughput(&self) -> f64 {
        self.hashes as f64 / self.seconds()
    }
}

/// Runs digest functions against a fixed workload.
#[derive(Debug, Clone)]
pub struct InProcessTimer {
    params: WorkloadParameters,
    warmup_passes: usize,
    pin_cpu: Option<usize>,
}

impl InProcessTimer {
    /// Timer with the standard warm-up
    pub fn new(params: WorkloadParameters) -> Self {
        Self {
            params,
            warmup_passes: WARMUP_PASSES,
            pin_cpu: None,
        }
    }

    /// Pin the measuring thread to `cpu` before each run.
    pub fn with_pinned_cpu(mut self, cpu: Option<usize>) -> Self {
        self.pin_cpu = cpu;
        self
    }

    /// Warm up, then measure `digest` over every round of the workload.
    pub fn run<F>(&self, mut digest: F) -> Measurement
    where
        F: FnMut(&[u8]) -> u64,
    {
        if let Some(cpu) = self.pin_cpu {
            if let Err(e) = pin_to_cpu(cpu) {
                tracing::warn!(cpu, error = %e, "could not pin measuring thread");
            }
        }

        let mut buf = Vec::with_capacity(self.params.max_length());

        for _ in 0..self.warmup_passes {
            self.pass(&mut buf, |msg| {
                black_box(digest(msg));
            });
        }

        let mut checksum = 0u64;
        let watch = Stopwatch::start();
        for _ in 0..self.params.rounds() {
            self.pass(&mut buf, |msg| {
                checksum ^= black_box(digest(msg));
            });
        }
        let Lap { elapsed, cycles } = watch.stop();

        let measurement = Measurement {
            elapsed,
            cycles,
            hashes: self.params.total_hashes(),
            checksum,
        };
        if cycles > 0 {
            tracing::debug!(
                cycles_per_hash = cycles as f64 / measurement.hashes as f64,
                "measured phase complete"
            );
        }
        measurement
    }

    /// One full pass, regenerating every message.
    #[inline]
    fn pass(&self, buf: &mut Vec<u8>, mut f: impl FnMut(&[u8])) {
        for index in 0..self.params.messages() {
            self.params.fill_message(index, buf);
            f(black_box(buf.as_slice()));
        }
    }
}

//! Wall-Clock and Cycle Timing
//!
//! Wall-clock time comes from `std::time::Instant`. Alongside it the stopwatch
//! reads the CPU counter (RDTSCP on x86_64, CNTVCT_EL0 on AArch64) so debug
//! logs can report cycles per hash. Results only ever use wall-clock time.

use std::time::{Duration, Instant};

/// Read the CPU cycle/tick counter (platform-specific).
#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is present on every x86_64 CPU this harness targets and
    // waits for prior instructions to retire before sampling.
    unsafe {
        let mut _aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut _aux)
    }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_cycles() -> u64 {
    0
}

/// Whether [`Lap::cycles`] carries real counter values on this platform.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// A running measurement window
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    cycles_start: u64,
}

/// Elapsed wall-clock time and counter ticks of a closed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap {
    /// Wall-clock time, never shorter than one nanosecond
    pub elapsed: Duration,
    /// Counter ticks (0 without a cycle counter)
    pub cycles: u64,
}

impl Stopwatch {
    /// Open a measurement window
    #[inline(always)]
    pub fn start() -> Self {
        let cycles_start = read_cycles();
        Self {
            started: Instant::now(),
            cycles_start,
        }
    }

    /// Close the window.
    ///
    /// A zero-length window is reported as 1 ns so derived rates stay finite.
    #[inline(always)]
    pub fn stop(&self) -> Lap {
        let elapsed = self.started.elapsed().max(Duration::from_nanos(1));
        let cycles = read_cycles().saturating_sub(self.cycles_start);
        Lap { elapsed, cycles }
    }
}

/// Pin the calling thread to `cpu`.
///
/// Keeps the measured loop on one core so migrations do not show up as noise.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cpu {} exceeds CPU_SETSIZE ({})", cpu, libc::CPU_SETSIZE),
        ));
    }

    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set.
    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref) == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is only implemented on Linux.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}

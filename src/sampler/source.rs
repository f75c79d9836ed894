//! OS counter providers
//!
//! A [`CounterSource`] is bound to one process and answers black-box queries
//! for its cumulative CPU times, cumulative I/O counters and current memory
//! usage. The sampler never talks to the OS directly.

use super::error::SamplerError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// 100 ns ticks per second (FILETIME resolution).
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Cumulative CPU time consumed by a process, in 100 ns ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    pub kernel_ticks: u64,
    pub user_ticks: u64,
}

/// Cumulative I/O activity of a process since it started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCounters {
    pub read_ops: u64,
    pub write_ops: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Point-in-time memory usage. Sizes are in bytes.
///
/// Pool quotas only exist on Windows; other backends report them as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounters {
    pub page_fault_count: u64,
    pub working_set_size: u64,
    pub peak_working_set_size: u64,
    pub pagefile_usage: u64,
    pub quota_paged_pool_usage: u64,
    pub quota_nonpaged_pool_usage: u64,
    pub quota_peak_nonpaged_pool_usage: u64,
}

/// Counter queries for one bound process.
pub trait CounterSource: Send {
    /// PID of the bound process
    fn pid(&self) -> u32;

    /// Current absolute system time in 100 ns ticks.
    fn wall_clock_ticks(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_nanos() / 100) as u64)
            .unwrap_or_default()
    }

    fn cpu_times(&self) -> Result<CpuTimes, SamplerError>;

    fn io_counters(&self) -> Result<IoCounters, SamplerError>;

    fn memory_counters(&self) -> Result<MemoryCounters, SamplerError>;
}

/// Open the platform counter source for `target`.
///
/// `None` or `Some(0)` binds to the calling process.
#[cfg(windows)]
pub fn open_process(target: Option<u32>) -> Result<Box<dyn CounterSource>, SamplerError> {
    Ok(Box::new(super::windows::WindowsSource::open(target)?))
}

/// Open the platform counter source for `target`.
///
/// `None` or `Some(0)` binds to the calling process.
#[cfg(target_os = "linux")]
pub fn open_process(target: Option<u32>) -> Result<Box<dyn CounterSource>, SamplerError> {
    Ok(Box::new(super::procfs::ProcfsSource::open(target)?))
}

#[cfg(not(any(windows, target_os = "linux")))]
pub fn open_process(_target: Option<u32>) -> Result<Box<dyn CounterSource>, SamplerError> {
    Err(SamplerError::Unsupported)
}

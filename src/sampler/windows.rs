//! Windows counter source using Win32 process APIs
//!
//! CPU times come from `GetProcessTimes`, I/O from `GetProcessIoCounters`,
//! memory from `GetProcessMemoryInfo`, and the wall clock from
//! `GetSystemTimeAsFileTime`. All times are FILETIME 100 ns ticks.

use super::error::SamplerError;
use super::source::{CounterSource, CpuTimes, IoCounters, MemoryCounters};
use windows::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
use windows::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows::Win32::System::SystemInformation::GetSystemTimeAsFileTime;
use windows::Win32::System::Threading::{
    GetCurrentProcess, GetProcessIoCounters, GetProcessTimes, OpenProcess, IO_COUNTERS,
    PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Converts a FILETIME to a u64 (100-nanosecond intervals since 1601)
fn filetime_to_u64(ft: &FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | (ft.dwLowDateTime as u64)
}

#[derive(Debug)]
pub struct WindowsSource {
    handle: HANDLE,
    pid: u32,
    /// The current-process pseudo handle must not be closed.
    owned: bool,
}

// SAFETY: a process HANDLE is a kernel object reference that may be used from
// any thread. The source is only ever used by one thread at a time.
unsafe impl Send for WindowsSource {}

impl WindowsSource {
    pub fn open(target: Option<u32>) -> Result<Self, SamplerError> {
        match target {
            None | Some(0) => Ok(Self {
                // SAFETY: GetCurrentProcess has no preconditions.
                handle: unsafe { GetCurrentProcess() },
                pid: std::process::id(),
                owned: false,
            }),
            Some(pid) => {
                // SAFETY: OpenProcess is safe to call with any PID.
                let handle = unsafe {
                    OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)
                }
                .map_err(|e| SamplerError::ProcessOpen {
                    pid,
                    reason: e.to_string(),
                })?;
                Ok(Self {
                    handle,
                    pid,
                    owned: true,
                })
            }
        }
    }
}

impl CounterSource for WindowsSource {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn wall_clock_ticks(&self) -> u64 {
        // SAFETY: GetSystemTimeAsFileTime has no preconditions.
        let now = unsafe { GetSystemTimeAsFileTime() };
        filetime_to_u64(&now)
    }

    fn cpu_times(&self) -> Result<CpuTimes, SamplerError> {
        let mut creation_time = FILETIME::default();
        let mut exit_time = FILETIME::default();
        let mut kernel_time = FILETIME::default();
        let mut user_time = FILETIME::default();

        // SAFETY: the handle is open for the lifetime of self and all
        // pointers are to live locals.
        unsafe {
            GetProcessTimes(
                self.handle,
                &mut creation_time,
                &mut exit_time,
                &mut kernel_time,
                &mut user_time,
            )
        }
        .map_err(|e| SamplerError::query(self.pid, "cpu times", e))?;

        Ok(CpuTimes {
            kernel_ticks: filetime_to_u64(&kernel_time),
            user_ticks: filetime_to_u64(&user_time),
        })
    }

    fn io_counters(&self) -> Result<IoCounters, SamplerError> {
        let mut counters = IO_COUNTERS::default();

        // SAFETY: valid handle and pointer to a live local.
        unsafe { GetProcessIoCounters(self.handle, &mut counters) }
            .map_err(|e| SamplerError::query(self.pid, "io counters", e))?;

        Ok(IoCounters {
            read_ops: counters.ReadOperationCount,
            write_ops: counters.WriteOperationCount,
            read_bytes: counters.ReadTransferCount,
            write_bytes: counters.WriteTransferCount,
        })
    }

    fn memory_counters(&self) -> Result<MemoryCounters, SamplerError> {
        let mut counters = PROCESS_MEMORY_COUNTERS::default();
        let size = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;

        // SAFETY: valid handle, and `size` matches the struct passed in.
        unsafe { GetProcessMemoryInfo(self.handle, &mut counters, size) }
            .map_err(|e| SamplerError::query(self.pid, "memory info", e))?;

        Ok(MemoryCounters {
            page_fault_count: u64::from(counters.PageFaultCount),
            working_set_size: counters.WorkingSetSize as u64,
            peak_working_set_size: counters.PeakWorkingSetSize as u64,
            pagefile_usage: counters.PagefileUsage as u64,
            quota_paged_pool_usage: counters.QuotaPagedPoolUsage as u64,
            quota_nonpaged_pool_usage: counters.QuotaNonPagedPoolUsage as u64,
            quota_peak_nonpaged_pool_usage: counters.QuotaPeakNonPagedPoolUsage as u64,
        })
    }
}

impl Drop for WindowsSource {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: we opened this handle and close it exactly once.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filetime_to_u64() {
        let ft = FILETIME {
            dwLowDateTime: 0x0000_0001,
            dwHighDateTime: 0x0000_0002,
        };
        assert_eq!(filetime_to_u64(&ft), (2u64 << 32) | 1);
    }

    #[test]
    fn test_open_current_process() {
        let source = WindowsSource::open(None).unwrap();
        assert_eq!(source.pid(), std::process::id());
        assert!(source.cpu_times().is_ok());
        assert!(source.io_counters().is_ok());
        assert!(source.memory_counters().unwrap().working_set_size > 0);
    }
}

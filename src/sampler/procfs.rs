//! Linux counter source backed by `/proc/<pid>`
//!
//! CPU times come from `stat` (clock ticks at USER_HZ), I/O from `io`
//! (`syscr`/`syscw` and `rchar`/`wchar`, which like Windows transfer counts
//! include non-disk I/O) and memory from `status`.

#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use super::error::SamplerError;
use super::source::{CounterSource, CpuTimes, IoCounters, MemoryCounters, TICKS_PER_SECOND};
use std::fs;
use std::path::{Path, PathBuf};

/// Kernel clock ticks per second exposed to userspace. Fixed at 100 on every
/// mainstream Linux architecture.
const USER_HZ: u64 = 100;

/// Fields of `/proc/<pid>/stat` the sampler needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFields {
    pub minor_faults: u64,
    pub major_faults: u64,
    pub utime: u64,
    pub stime: u64,
}

/// Parse `/proc/<pid>/stat`.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is field 3 (state) in proc(5) numbering.
    let field = |n: usize| fields.get(n - 3).and_then(|v| v.parse::<u64>().ok());

    Some(StatFields {
        minor_faults: field(10)?,
        major_faults: field(12)?,
        utime: field(14)?,
        stime: field(15)?,
    })
}

/// Parse `/proc/<pid>/io`.
pub fn parse_io(content: &str) -> Option<IoCounters> {
    let mut io = IoCounters::default();
    let mut seen = 0;
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u64>() else {
            continue;
        };
        let slot = match key.trim() {
            "syscr" => &mut io.read_ops,
            "syscw" => &mut io.write_ops,
            "rchar" => &mut io.read_bytes,
            "wchar" => &mut io.write_bytes,
            _ => continue,
        };
        *slot = value;
        seen += 1;
    }
    (seen == 4).then_some(io)
}

/// Parse the memory lines of `/proc/<pid>/status` (values are in kB).
pub fn parse_status(content: &str) -> MemoryCounters {
    let mut memory = MemoryCounters::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let bytes = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb * 1024);
        let Some(bytes) = bytes else {
            continue;
        };
        match key {
            "VmRSS" => memory.working_set_size = bytes,
            "VmHWM" => memory.peak_working_set_size = bytes,
            "VmSwap" => memory.pagefile_usage = bytes,
            _ => {}
        }
    }
    memory
}

fn clock_ticks_to_ticks(clock_ticks: u64) -> u64 {
    clock_ticks.saturating_mul(TICKS_PER_SECOND / USER_HZ)
}

#[derive(Debug)]
pub struct ProcfsSource {
    pid: u32,
    dir: PathBuf,
}

impl ProcfsSource {
    pub fn open(target: Option<u32>) -> Result<Self, SamplerError> {
        Self::open_in(Path::new("/proc"), target)
    }

    /// Bind to `<root>/<pid>`. Every file the counter queries read must be
    /// readable up front, the closest thing procfs has to `OpenProcess`
    /// with the query access rights.
    fn open_in(root: &Path, target: Option<u32>) -> Result<Self, SamplerError> {
        let pid = match target {
            None | Some(0) => std::process::id(),
            Some(pid) => pid,
        };
        let dir = root.join(pid.to_string());

        for file in ["stat", "io", "status"] {
            fs::read(dir.join(file)).map_err(|e| SamplerError::ProcessOpen {
                pid,
                reason: format!("{}: {}", file, e),
            })?;
        }

        Ok(Self { pid, dir })
    }

    fn read(&self, file: &str, query: &'static str) -> Result<String, SamplerError> {
        fs::read_to_string(self.dir.join(file)).map_err(|e| SamplerError::query(self.pid, query, e))
    }

    fn stat(&self, query: &'static str) -> Result<StatFields, SamplerError> {
        let content = self.read("stat", query)?;
        parse_stat(&content).ok_or_else(|| SamplerError::query(self.pid, query, "malformed stat"))
    }
}

impl CounterSource for ProcfsSource {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn cpu_times(&self) -> Result<CpuTimes, SamplerError> {
        let stat = self.stat("cpu times")?;
        Ok(CpuTimes {
            kernel_ticks: clock_ticks_to_ticks(stat.stime),
            user_ticks: clock_ticks_to_ticks(stat.utime),
        })
    }

    fn io_counters(&self) -> Result<IoCounters, SamplerError> {
        let content = self.read("io", "io counters")?;
        parse_io(&content).ok_or_else(|| SamplerError::query(self.pid, "io counters", "malformed io"))
    }

    fn memory_counters(&self) -> Result<MemoryCounters, SamplerError> {
        let stat = self.stat("memory info")?;
        let mut memory = parse_status(&self.read("status", "memory info")?);
        memory.page_fault_count = stat.minor_faults + stat.major_faults;
        Ok(memory)
    }
}

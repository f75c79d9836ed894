//! Running process enumeration for the process list and `--name` attach

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_usage: f32,
    pub memory_bytes: u64,
}

/// Keeps a `System` between refreshes so CPU usage has a previous reading to
/// measure against.
pub struct ProcessTable {
    system: System,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Refresh and return the busiest `limit` processes.
    pub fn refresh(&mut self, limit: usize) -> Vec<ProcessEntry> {
        let updated = self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        debug!(updated, "process list refreshed");

        let mut entries: Vec<ProcessEntry> = self
            .system
            .processes()
            .values()
            .map(|proc| ProcessEntry {
                pid: proc.pid().as_u32(),
                name: proc.name().to_string_lossy().to_string(),
                cpu_usage: proc.cpu_usage(),
                memory_bytes: proc.memory(),
            })
            .collect();

        sort_entries(&mut entries);
        entries.truncate(limit);
        entries
    }

    /// PIDs whose name matches `name`, lowest PID first.
    pub fn find_by_name(&mut self, name: &str) -> Vec<u32> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new(),
        );
        let mut pids: Vec<u32> = self
            .system
            .processes()
            .values()
            .filter(|proc| name_matches(&proc.name().to_string_lossy(), name))
            .map(|proc| proc.pid().as_u32())
            .collect();
        pids.sort_unstable();
        pids
    }
}

/// One-shot listing with meaningful CPU figures (two refreshes).
pub fn list_processes(limit: usize) -> Vec<ProcessEntry> {
    let mut table = ProcessTable::new();
    table.refresh(limit);
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    table.refresh(limit)
}

pub fn find_by_name(name: &str) -> Vec<u32> {
    ProcessTable::new().find_by_name(name)
}

/// Name of a running process, if it exists.
pub fn process_name(pid: u32) -> Option<String> {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, ProcessRefreshKind::new());
    system
        .process(pid)
        .map(|proc| proc.name().to_string_lossy().into_owned())
}

/// CPU descending, then memory descending, then PID.
fn sort_entries(entries: &mut [ProcessEntry]) {
    entries.sort_by(|a, b| {
        b.cpu_usage
            .partial_cmp(&a.cpu_usage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.memory_bytes.cmp(&a.memory_bytes))
            .then_with(|| a.pid.cmp(&b.pid))
    });
}

/// Case-insensitive match that tolerates a missing `.exe` on either side.
fn name_matches(candidate: &str, wanted: &str) -> bool {
    fn stem(s: &str) -> String {
        let lower = s.to_lowercase();
        match lower.strip_suffix(".exe") {
            Some(stripped) => stripped.to_string(),
            None => lower,
        }
    }
    !wanted.is_empty() && stem(candidate) == stem(wanted)
}

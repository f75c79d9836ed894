//! Deterministic counter source that replays recorded readings
//!
//! Used to drive the sampler and the polling loop without touching the OS.
//! Each snapshot the sampler takes consumes the next reading; once the script
//! is exhausted the last reading repeats.

use super::error::SamplerError;
use super::source::{CounterSource, CpuTimes, IoCounters, MemoryCounters};
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted set of OS readings. `None` simulates a failed query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedReading {
    pub wall_clock_ticks: u64,
    pub cpu: Option<CpuTimes>,
    pub io: Option<IoCounters>,
    pub memory: Option<MemoryCounters>,
}

impl ScriptedReading {
    pub fn new(wall_clock_ticks: u64) -> Self {
        Self {
            wall_clock_ticks,
            ..Self::default()
        }
    }

    pub fn cpu(mut self, kernel_ticks: u64, user_ticks: u64) -> Self {
        self.cpu = Some(CpuTimes {
            kernel_ticks,
            user_ticks,
        });
        self
    }

    pub fn io(mut self, io: IoCounters) -> Self {
        self.io = Some(io);
        self
    }

    pub fn memory(mut self, memory: MemoryCounters) -> Self {
        self.memory = Some(memory);
        self
    }
}

#[derive(Debug)]
pub struct ScriptedSource {
    pid: u32,
    readings: Vec<ScriptedReading>,
    next: AtomicUsize,
    current: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(pid: u32, readings: Vec<ScriptedReading>) -> Self {
        Self {
            pid,
            readings,
            next: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
        }
    }

    fn reading(&self) -> Option<&ScriptedReading> {
        self.readings.get(self.current.load(Ordering::Relaxed))
    }

    fn failed(&self, query: &'static str) -> SamplerError {
        SamplerError::query(self.pid, query, "scripted failure")
    }
}

impl CounterSource for ScriptedSource {
    fn pid(&self) -> u32 {
        self.pid
    }

    // A snapshot always starts with the wall clock, so this is where the
    // script advances.
    fn wall_clock_ticks(&self) -> u64 {
        if self.readings.is_empty() {
            return 0;
        }
        let idx = self
            .next
            .fetch_add(1, Ordering::Relaxed)
            .min(self.readings.len() - 1);
        self.current.store(idx, Ordering::Relaxed);
        self.readings[idx].wall_clock_ticks
    }

    fn cpu_times(&self) -> Result<CpuTimes, SamplerError> {
        self.reading()
            .and_then(|r| r.cpu)
            .ok_or_else(|| self.failed("cpu times"))
    }

    fn io_counters(&self) -> Result<IoCounters, SamplerError> {
        self.reading()
            .and_then(|r| r.io)
            .ok_or_else(|| self.failed("io counters"))
    }

    fn memory_counters(&self) -> Result<MemoryCounters, SamplerError> {
        self.reading()
            .and_then(|r| r.memory)
            .ok_or_else(|| self.failed("memory info"))
    }
}

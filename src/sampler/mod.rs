//! Counter-delta sampling for a single process
//!
//! The OS only exposes cumulative counters: total CPU time since the process
//! started, total bytes read, and so on. A [`Sampler`] keeps the previous
//! snapshot of those counters and, on every [`Sampler::sample`] call, turns
//! the difference against a fresh snapshot into percentages and rates.

pub mod error;
pub mod procfs;
pub mod scripted;
pub mod source;
#[cfg(windows)]
pub mod windows;

pub use error::SamplerError;
pub use scripted::{ScriptedReading, ScriptedSource};
pub use source::{CounterSource, CpuTimes, IoCounters, MemoryCounters, TICKS_PER_SECOND};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deltas below this many ticks count as "no progress".
const EPSILON: f64 = 0.001;

/// One full set of cumulative counter readings taken at a single instant.
///
/// A `None` group means the OS query failed for that snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCounterSnapshot {
    pub wall_clock_ticks: u64,
    pub cpu: Option<CpuTimes>,
    pub io: Option<IoCounters>,
}

impl RawCounterSnapshot {
    /// Take a snapshot from `source`, recording failed groups as `None`.
    pub fn capture(source: &dyn CounterSource) -> Self {
        let wall_clock_ticks = source.wall_clock_ticks();
        let cpu = source
            .cpu_times()
            .map_err(|e| debug!("cpu times unavailable: {}", e))
            .ok();
        let io = source
            .io_counters()
            .map_err(|e| debug!("io counters unavailable: {}", e))
            .ok();

        Self {
            wall_clock_ticks,
            cpu,
            io,
        }
    }
}

/// How CPU percentages are scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum CpuNormalization {
    /// Share of a single core. Busy multi-threaded processes exceed 100.
    #[default]
    Raw,
    /// Share of the whole machine, divided across `cores` logical CPUs.
    PerCore { cores: u32 },
}

impl CpuNormalization {
    /// Per-core scaling using the logical CPU count of this machine.
    pub fn per_core() -> Self {
        use sysinfo::{CpuRefreshKind, RefreshKind, System};

        let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
        let cores = u32::try_from(system.cpus().len()).unwrap_or(1).max(1);
        Self::PerCore { cores }
    }

    fn divisor(&self) -> f64 {
        match self {
            Self::Raw => 1.0,
            Self::PerCore { cores } => f64::from((*cores).max(1)),
        }
    }
}

/// Which field groups of a [`MetricsRecord`] come from successful queries.
///
/// A `false` group is zeroed, which is different from a group that is zero
/// because nothing happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStatus {
    pub cpu: bool,
    pub io: bool,
    pub memory: bool,
}

impl SampleStatus {
    pub fn is_complete(&self) -> bool {
        self.cpu && self.io && self.memory
    }

    pub(crate) fn to_bits(self) -> i64 {
        i64::from(self.cpu) | (i64::from(self.io) << 1) | (i64::from(self.memory) << 2)
    }

    pub(crate) fn from_bits(bits: i64) -> Self {
        Self {
            cpu: bits & 1 != 0,
            io: bits & 2 != 0,
            memory: bits & 4 != 0,
        }
    }
}

/// Metrics for one sampling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub cpu_kernel_percent: u64,
    pub cpu_user_percent: u64,
    pub cpu_kernel_delta_ticks: u64,
    pub cpu_user_delta_ticks: u64,
    pub io_read_ops_delta: u64,
    pub io_write_ops_delta: u64,
    pub io_read_bytes_delta: u64,
    pub io_write_bytes_delta: u64,
    pub io_read_bytes_per_sec: u64,
    pub io_write_bytes_per_sec: u64,
    pub memory: MemoryCounters,
    pub status: SampleStatus,
}

impl MetricsRecord {
    pub fn cpu_total_percent(&self) -> u64 {
        self.cpu_kernel_percent.saturating_add(self.cpu_user_percent)
    }
}

/// Turn two snapshots into a [`MetricsRecord`].
///
/// All deltas saturate at zero, so a counter that went backwards (process
/// restart, handle reuse, wraparound) reads as no activity.
pub fn derive_metrics(
    previous: &RawCounterSnapshot,
    current: &RawCounterSnapshot,
    memory: Option<MemoryCounters>,
    normalization: CpuNormalization,
) -> MetricsRecord {
    derive_from(&Baseline::from_snapshot(previous), current, memory, normalization)
}

/// Last good reading of each counter group, stamped with the wall clock of
/// the snapshot it came from. A failed query leaves its group untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Baseline {
    cpu: Option<(u64, CpuTimes)>,
    io: Option<(u64, IoCounters)>,
}

impl Baseline {
    fn from_snapshot(snapshot: &RawCounterSnapshot) -> Self {
        let mut baseline = Self::default();
        baseline.advance(snapshot);
        baseline
    }

    fn advance(&mut self, snapshot: &RawCounterSnapshot) {
        let wall = snapshot.wall_clock_ticks;
        if let Some(cpu) = snapshot.cpu {
            self.cpu = Some((wall, cpu));
        }
        if let Some(io) = snapshot.io {
            self.io = Some((wall, io));
        }
    }
}

/// Each group is measured over the time since its own last good reading.
fn derive_from(
    baseline: &Baseline,
    current: &RawCounterSnapshot,
    memory: Option<MemoryCounters>,
    normalization: CpuNormalization,
) -> MetricsRecord {
    let mut record = MetricsRecord::default();

    if let (Some((since, prev)), Some(cur)) = (baseline.cpu, current.cpu) {
        let system_diff = current.wall_clock_ticks.saturating_sub(since);
        let kernel_diff = cur.kernel_ticks.saturating_sub(prev.kernel_ticks);
        let user_diff = cur.user_ticks.saturating_sub(prev.user_ticks);

        record.cpu_kernel_delta_ticks = kernel_diff;
        record.cpu_user_delta_ticks = user_diff;
        record.cpu_kernel_percent = cpu_percent(kernel_diff, system_diff, normalization);
        record.cpu_user_percent = cpu_percent(user_diff, system_diff, normalization);
        record.status.cpu = true;
    }

    if let (Some((since, prev)), Some(cur)) = (baseline.io, current.io) {
        let system_diff = current.wall_clock_ticks.saturating_sub(since);
        record.io_read_ops_delta = cur.read_ops.saturating_sub(prev.read_ops);
        record.io_write_ops_delta = cur.write_ops.saturating_sub(prev.write_ops);
        record.io_read_bytes_delta = cur.read_bytes.saturating_sub(prev.read_bytes);
        record.io_write_bytes_delta = cur.write_bytes.saturating_sub(prev.write_bytes);
        record.io_read_bytes_per_sec = bytes_per_sec(record.io_read_bytes_delta, system_diff);
        record.io_write_bytes_per_sec = bytes_per_sec(record.io_write_bytes_delta, system_diff);
        record.status.io = true;
    }

    if let Some(memory) = memory {
        record.memory = memory;
        record.status.memory = true;
    }

    record
}

/// Percentage of `system_diff` spent in `diff`, truncated toward zero.
fn cpu_percent(diff: u64, system_diff: u64, normalization: CpuNormalization) -> u64 {
    let diff = diff as f64;
    let system_diff = system_diff as f64;
    if system_diff > EPSILON && diff > EPSILON {
        ((diff / system_diff) * 100.0 / normalization.divisor()) as u64
    } else {
        0
    }
}

fn bytes_per_sec(delta: u64, system_diff: u64) -> u64 {
    if delta == 0 || system_diff == 0 {
        return 0;
    }
    let seconds = system_diff as f64 / TICKS_PER_SECOND as f64;
    (delta as f64 / seconds) as u64
}

/// Samples one process. Owns the bound process handle (through its source)
/// and the per-group baseline.
pub struct Sampler {
    source: Box<dyn CounterSource>,
    normalization: CpuNormalization,
    baseline: Baseline,
}

impl Sampler {
    /// Bind to `target`, or to the calling process for `None` / `Some(0)`.
    pub fn attach(target: Option<u32>) -> Result<Self, SamplerError> {
        let source = source::open_process(target)?;
        Ok(Self::with_source(source, CpuNormalization::Raw))
    }

    /// Bind to an already-open source. The first snapshot is taken here.
    pub fn with_source(source: Box<dyn CounterSource>, normalization: CpuNormalization) -> Self {
        let baseline = Baseline::from_snapshot(&RawCounterSnapshot::capture(source.as_ref()));
        debug!(pid = source.pid(), "sampler baseline captured");
        Self {
            source,
            normalization,
            baseline,
        }
    }

    pub fn with_normalization(mut self, normalization: CpuNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn pid(&self) -> u32 {
        self.source.pid()
    }

    pub fn normalization(&self) -> CpuNormalization {
        self.normalization
    }

    /// Snapshot, diff against the last good reading of each group, and advance.
    ///
    /// Never fails: groups whose query failed come back zeroed and flagged in
    /// [`MetricsRecord::status`], and keep their previous baseline.
    pub fn sample(&mut self) -> MetricsRecord {
        let current = RawCounterSnapshot::capture(self.source.as_ref());
        let memory = self
            .source
            .memory_counters()
            .map_err(|e| debug!("memory info unavailable: {}", e))
            .ok();

        let record = derive_from(&self.baseline, &current, memory, self.normalization);
        self.baseline.advance(&current);
        record
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("pid", &self.source.pid())
            .field("normalization", &self.normalization)
            .field("baseline", &self.baseline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::{ScriptedReading, ScriptedSource};
    use super::*;

    fn snapshot(wall: u64, kernel: u64, user: u64) -> RawCounterSnapshot {
        RawCounterSnapshot {
            wall_clock_ticks: wall,
            cpu: Some(CpuTimes {
                kernel_ticks: kernel,
                user_ticks: user,
            }),
            io: Some(IoCounters::default()),
        }
    }

    fn with_io(mut snap: RawCounterSnapshot, io: IoCounters) -> RawCounterSnapshot {
        snap.io = Some(io);
        snap
    }

    #[test]
    fn test_short_interval_truncates_to_zero() {
        let prev = snapshot(0, 1000, 2000);
        let cur = snapshot(1_000_000, 1500, 2500);

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.cpu_kernel_delta_ticks, 500);
        assert_eq!(record.cpu_user_delta_ticks, 500);
        assert_eq!(record.cpu_kernel_percent, 0);
        assert_eq!(record.cpu_user_percent, 0);
        assert!(record.status.cpu);
    }

    #[test]
    fn test_cpu_percent_of_interval() {
        let prev = snapshot(0, 0, 0);
        let cur = snapshot(TICKS_PER_SECOND, TICKS_PER_SECOND / 4, TICKS_PER_SECOND / 2);

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.cpu_kernel_percent, 25);
        assert_eq!(record.cpu_user_percent, 50);
        assert_eq!(record.cpu_total_percent(), 75);
    }

    #[test]
    fn test_zero_elapsed_reports_zero_cpu() {
        let prev = snapshot(5_000, 0, 0);
        let cur = snapshot(5_000, 9_999, 9_999);

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.cpu_kernel_percent, 0);
        assert_eq!(record.cpu_user_percent, 0);
    }

    #[test]
    fn test_kernel_percent_monotonic_and_bounded() {
        let system_diff = TICKS_PER_SECOND;
        let mut last = 0;
        for kernel in (0..=system_diff).step_by(125_000) {
            let record = derive_metrics(
                &snapshot(0, 0, 0),
                &snapshot(system_diff, kernel, 0),
                None,
                CpuNormalization::Raw,
            );
            assert!(record.cpu_kernel_percent >= last);
            assert!(record.cpu_kernel_percent <= 100);
            last = record.cpu_kernel_percent;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_per_core_normalization() {
        let prev = snapshot(0, 0, 0);
        // Four cores fully busy in user mode for one second.
        let cur = snapshot(TICKS_PER_SECOND, 0, 4 * TICKS_PER_SECOND);

        let raw = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);
        let per_core = derive_metrics(&prev, &cur, None, CpuNormalization::PerCore { cores: 4 });

        assert_eq!(raw.cpu_user_percent, 400);
        assert_eq!(per_core.cpu_user_percent, 100);
    }

    #[test]
    fn test_read_rate_one_mebibyte_per_second() {
        let prev = with_io(snapshot(0, 0, 0), IoCounters::default());
        let cur = with_io(
            snapshot(10_000_000, 0, 0),
            IoCounters {
                read_ops: 16,
                write_ops: 0,
                read_bytes: 1_048_576,
                write_bytes: 0,
            },
        );

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.io_read_bytes_delta, 1_048_576);
        assert_eq!(record.io_read_bytes_per_sec, 1_048_576);
        assert_eq!(record.io_read_ops_delta, 16);
        assert_eq!(record.io_write_bytes_per_sec, 0);
    }

    #[test]
    fn test_zero_byte_delta_has_zero_rate() {
        let io = IoCounters {
            read_ops: 3,
            write_ops: 3,
            read_bytes: 4096,
            write_bytes: 4096,
        };
        let prev = with_io(snapshot(0, 0, 0), io);
        let cur = with_io(snapshot(0, 0, 0), io);

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.io_read_bytes_per_sec, 0);
        assert_eq!(record.io_write_bytes_per_sec, 0);
    }

    #[test]
    fn test_zero_elapsed_gives_zero_rate() {
        let prev = with_io(snapshot(7_000, 0, 0), IoCounters::default());
        let cur = with_io(
            snapshot(7_000, 0, 0),
            IoCounters {
                read_ops: 2,
                write_ops: 1,
                read_bytes: 65_536,
                write_bytes: 4_096,
            },
        );

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.io_read_bytes_delta, 65_536);
        assert_eq!(record.io_write_bytes_delta, 4_096);
        assert_eq!(record.io_read_bytes_per_sec, 0);
        assert_eq!(record.io_write_bytes_per_sec, 0);
        assert!(record.status.io);
    }

    #[test]
    fn test_counter_reset_is_clamped() {
        let prev = with_io(
            snapshot(0, 50_000_000, 70_000_000),
            IoCounters {
                read_ops: 1_000,
                write_ops: 1_000,
                read_bytes: 1 << 40,
                write_bytes: 1 << 40,
            },
        );
        let cur = with_io(
            snapshot(TICKS_PER_SECOND, 10, 20),
            IoCounters {
                read_ops: 1,
                write_ops: 2,
                read_bytes: 512,
                write_bytes: 256,
            },
        );

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.cpu_kernel_delta_ticks, 0);
        assert_eq!(record.cpu_user_delta_ticks, 0);
        assert_eq!(record.cpu_kernel_percent, 0);
        assert_eq!(record.io_read_ops_delta, 0);
        assert_eq!(record.io_write_ops_delta, 0);
        assert_eq!(record.io_read_bytes_per_sec, 0);
        assert_eq!(record.io_write_bytes_per_sec, 0);
    }

    #[test]
    fn test_failed_groups_are_flagged() {
        let prev = RawCounterSnapshot {
            wall_clock_ticks: 0,
            cpu: None,
            io: Some(IoCounters::default()),
        };
        let cur = RawCounterSnapshot {
            wall_clock_ticks: TICKS_PER_SECOND,
            cpu: Some(CpuTimes::default()),
            io: None,
        };

        let record = derive_metrics(&prev, &cur, None, CpuNormalization::Raw);

        assert_eq!(record.status, SampleStatus::default());
        assert!(!record.status.is_complete());
    }

    #[test]
    fn test_status_bits_round_trip() {
        let status = SampleStatus {
            cpu: true,
            io: false,
            memory: true,
        };
        assert_eq!(SampleStatus::from_bits(status.to_bits()), status);
    }

    #[test]
    fn test_sampler_advances_baseline() {
        let memory = MemoryCounters {
            working_set_size: 8 << 20,
            ..MemoryCounters::default()
        };
        let source = ScriptedSource::new(
            42,
            vec![
                ScriptedReading::new(0).cpu(0, 0).io(IoCounters::default()),
                ScriptedReading::new(TICKS_PER_SECOND)
                    .cpu(TICKS_PER_SECOND / 10, 0)
                    .io(IoCounters::default())
                    .memory(memory),
                ScriptedReading::new(2 * TICKS_PER_SECOND)
                    .cpu(TICKS_PER_SECOND / 10, TICKS_PER_SECOND / 5)
                    .io(IoCounters::default())
                    .memory(memory),
            ],
        );
        let mut sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);
        assert_eq!(sampler.pid(), 42);

        let first = sampler.sample();
        assert_eq!(first.cpu_kernel_percent, 10);
        assert_eq!(first.cpu_user_percent, 0);
        assert_eq!(first.memory.working_set_size, 8 << 20);

        // Measured against the previous call, not the construction-time reading.
        let second = sampler.sample();
        assert_eq!(second.cpu_kernel_percent, 0);
        assert_eq!(second.cpu_user_percent, 20);
        assert!(second.status.is_complete());
    }

    #[test]
    fn test_failed_io_keeps_last_good_baseline() {
        let io_at = |read_bytes: u64| IoCounters {
            read_ops: read_bytes / 4096,
            write_ops: 0,
            read_bytes,
            write_bytes: 0,
        };
        let source = ScriptedSource::new(
            3,
            vec![
                ScriptedReading::new(0).cpu(0, 0).io(io_at(0)),
                // I/O query fails here while 4 MiB is being read.
                ScriptedReading::new(TICKS_PER_SECOND).cpu(0, TICKS_PER_SECOND / 10),
                ScriptedReading::new(2 * TICKS_PER_SECOND)
                    .cpu(0, TICKS_PER_SECOND / 5)
                    .io(io_at(4 << 20)),
            ],
        );
        let mut sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);

        let failed = sampler.sample();
        assert!(failed.status.cpu);
        assert!(!failed.status.io);
        assert_eq!(failed.io_read_bytes_delta, 0);

        // Measured against the reading at 0 s, so nothing is lost and the
        // rate is spread over both seconds.
        let recovered = sampler.sample();
        assert!(recovered.status.io);
        assert_eq!(recovered.io_read_bytes_delta, 4 << 20);
        assert_eq!(recovered.io_read_ops_delta, 1024);
        assert_eq!(recovered.io_read_bytes_per_sec, 2 << 20);
        // CPU advanced normally through the I/O failure.
        assert_eq!(recovered.cpu_user_percent, 10);
    }

    #[test]
    fn test_failed_cpu_measures_over_time_since_last_good() {
        let source = ScriptedSource::new(
            4,
            vec![
                ScriptedReading::new(0).cpu(0, 0).io(IoCounters::default()),
                ScriptedReading::new(TICKS_PER_SECOND).io(IoCounters::default()),
                ScriptedReading::new(4 * TICKS_PER_SECOND)
                    .cpu(TICKS_PER_SECOND, 0)
                    .io(IoCounters::default()),
            ],
        );
        let mut sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);

        assert!(!sampler.sample().status.cpu);
        let record = sampler.sample();
        assert!(record.status.cpu);
        assert_eq!(record.cpu_kernel_delta_ticks, TICKS_PER_SECOND);
        // One second of kernel time over four seconds, not over the last three.
        assert_eq!(record.cpu_kernel_percent, 25);
    }

    #[test]
    fn test_identical_readings_give_zero_cpu() {
        let reading = ScriptedReading::new(TICKS_PER_SECOND)
            .cpu(300, 700)
            .io(IoCounters::default());
        let source = ScriptedSource::new(7, vec![reading, reading, reading]);
        let mut sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);

        sampler.sample();
        let record = sampler.sample();

        assert_eq!(record.cpu_kernel_percent, 0);
        assert_eq!(record.cpu_user_percent, 0);
    }

    #[test]
    fn test_memory_failure_leaves_zeroes() {
        let source = ScriptedSource::new(
            9,
            vec![
                ScriptedReading::new(0).cpu(0, 0).io(IoCounters::default()),
                ScriptedReading::new(TICKS_PER_SECOND)
                    .cpu(0, 0)
                    .io(IoCounters::default()),
            ],
        );
        let mut sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);

        let record = sampler.sample();

        assert!(record.status.cpu);
        assert!(record.status.io);
        assert!(!record.status.memory);
        assert_eq!(record.memory, MemoryCounters::default());
    }
}

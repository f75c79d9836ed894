//! SQLite history of samples
//!
//! One flat `stats` row per sample, every metric a 64-bit integer. The
//! sampler does not depend on this; the CLI and dashboard feed it when
//! recording is enabled.

use crate::monitor::Sample;
use crate::sampler::{MemoryCounters, MetricsRecord, SampleStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DB_BUSY_TIMEOUT_SECS: u64 = 30;

const CREATE_STATS: &str = "CREATE TABLE IF NOT EXISTS stats (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    TIME_STAMP INTEGER NOT NULL,
    PID INTEGER NOT NULL,
    STATUS INTEGER NOT NULL,
    IO_IOPS_READ INTEGER,
    IO_IOPS_WRITE INTEGER,
    IO_BYTESREADPERSEC INTEGER,
    IO_BYTESWRITEPERSEC INTEGER,
    IO_TOTALBYTESREAD INTEGER,
    IO_TOTALBYTESWRITE INTEGER,
    CPU_KERNPERCENT INTEGER,
    CPU_USERPERCENT INTEGER,
    CPU_KERNTOTAL INTEGER,
    CPU_USERTOTAL INTEGER,
    PROC_PAGEFAULTCOUNT INTEGER,
    PROC_WORKINGSETSIZE INTEGER,
    PROC_PEAKWORKINGSETSIZE INTEGER,
    PROC_PAGEFILEUSAGE INTEGER,
    PROC_QUOTAPAGEDPOOLUSAGE INTEGER,
    PROC_QUOTANONPAGEDPOOLUSAGE INTEGER,
    PROC_QUOTAPEAKNONPAGEDPOOLUSAGE INTEGER
)";

const SELECT_COLUMNS: &str = "ID, TIME_STAMP, PID, STATUS, IO_IOPS_READ, IO_IOPS_WRITE, \
    IO_BYTESREADPERSEC, IO_BYTESWRITEPERSEC, IO_TOTALBYTESREAD, IO_TOTALBYTESWRITE, \
    CPU_KERNPERCENT, CPU_USERPERCENT, CPU_KERNTOTAL, CPU_USERTOTAL, PROC_PAGEFAULTCOUNT, \
    PROC_WORKINGSETSIZE, PROC_PEAKWORKINGSETSIZE, PROC_PAGEFILEUSAGE, \
    PROC_QUOTAPAGEDPOOLUSAGE, PROC_QUOTANONPAGEDPOOLUSAGE, PROC_QUOTAPEAKNONPAGEDPOOLUSAGE";

/// A sample read back from the database.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub metrics: MetricsRecord,
}

pub struct StatsStore {
    db: Connection,
}

impl StatsStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let db = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL lets `healthops history` read while a monitor is writing.
        db.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;
        db.busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS))
            .context("Failed to set busy timeout")?;
        db.pragma_update(None, "synchronous", "NORMAL")
            .context("Failed to set synchronous mode")?;

        Self::init(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(db)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute(CREATE_STATS, [])
            .context("Failed to create stats table")?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_stats_time ON stats(TIME_STAMP)",
            [],
        )
        .context("Failed to create stats index")?;
        Ok(Self { db })
    }

    /// Insert one sample and return its row id.
    pub fn save(&self, sample: &Sample) -> Result<i64> {
        let m = &sample.metrics;
        let mem = &m.memory;
        self.db
            .execute(
                "INSERT INTO stats (TIME_STAMP, PID, STATUS, IO_IOPS_READ, IO_IOPS_WRITE, \
                 IO_BYTESREADPERSEC, IO_BYTESWRITEPERSEC, IO_TOTALBYTESREAD, IO_TOTALBYTESWRITE, \
                 CPU_KERNPERCENT, CPU_USERPERCENT, CPU_KERNTOTAL, CPU_USERTOTAL, \
                 PROC_PAGEFAULTCOUNT, PROC_WORKINGSETSIZE, PROC_PEAKWORKINGSETSIZE, \
                 PROC_PAGEFILEUSAGE, PROC_QUOTAPAGEDPOOLUSAGE, PROC_QUOTANONPAGEDPOOLUSAGE, \
                 PROC_QUOTAPEAKNONPAGEDPOOLUSAGE) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                 ?17, ?18, ?19, ?20)",
                params![
                    sample.timestamp.timestamp_millis(),
                    i64::from(sample.pid),
                    m.status.to_bits(),
                    to_sql(m.io_read_ops_delta),
                    to_sql(m.io_write_ops_delta),
                    to_sql(m.io_read_bytes_per_sec),
                    to_sql(m.io_write_bytes_per_sec),
                    to_sql(m.io_read_bytes_delta),
                    to_sql(m.io_write_bytes_delta),
                    to_sql(m.cpu_kernel_percent),
                    to_sql(m.cpu_user_percent),
                    to_sql(m.cpu_kernel_delta_ticks),
                    to_sql(m.cpu_user_delta_ticks),
                    to_sql(mem.page_fault_count),
                    to_sql(mem.working_set_size),
                    to_sql(mem.peak_working_set_size),
                    to_sql(mem.pagefile_usage),
                    to_sql(mem.quota_paged_pool_usage),
                    to_sql(mem.quota_nonpaged_pool_usage),
                    to_sql(mem.quota_peak_nonpaged_pool_usage),
                ],
            )
            .context("Failed to insert sample")?;
        Ok(self.db.last_insert_rowid())
    }

    /// Samples with `start <= timestamp < end`, oldest first.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<StoredSample>> {
        let sql = format!(
            "SELECT {} FROM stats WHERE TIME_STAMP >= ?1 AND TIME_STAMP < ?2 ORDER BY ID ASC",
            SELECT_COLUMNS
        );
        let mut stmt = self.db.prepare(&sql).context("Failed to prepare range query")?;
        let rows = stmt
            .query_map(
                params![start.timestamp_millis(), end.timestamp_millis()],
                read_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read samples")?;
        Ok(rows)
    }

    /// The newest `limit` samples, optionally for one PID, newest first.
    pub fn recent(&self, limit: usize, pid: Option<u32>) -> Result<Vec<StoredSample>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match pid {
            Some(pid) => {
                let sql = format!(
                    "SELECT {} FROM stats WHERE PID = ?1 ORDER BY ID DESC LIMIT ?2",
                    SELECT_COLUMNS
                );
                let mut stmt = self.db.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![i64::from(pid), limit], read_row)?
                    .collect::<rusqlite::Result<Vec<_>>>();
                rows
            }
            None => {
                let sql = format!("SELECT {} FROM stats ORDER BY ID DESC LIMIT ?1", SELECT_COLUMNS);
                let mut stmt = self.db.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit], read_row)?
                    .collect::<rusqlite::Result<Vec<_>>>();
                rows
            }
        };
        rows.context("Failed to read samples")
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM stats", [], |row| row.get(0))
            .context("Failed to count samples")?;
        Ok(from_sql(count))
    }
}

fn to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredSample> {
    let u = |idx: usize| -> rusqlite::Result<u64> {
        row.get::<_, Option<i64>>(idx)
            .map(|v| from_sql(v.unwrap_or(0)))
    };

    let millis: i64 = row.get(1)?;
    let timestamp = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default();

    let metrics = MetricsRecord {
        io_read_ops_delta: u(4)?,
        io_write_ops_delta: u(5)?,
        io_read_bytes_per_sec: u(6)?,
        io_write_bytes_per_sec: u(7)?,
        io_read_bytes_delta: u(8)?,
        io_write_bytes_delta: u(9)?,
        cpu_kernel_percent: u(10)?,
        cpu_user_percent: u(11)?,
        cpu_kernel_delta_ticks: u(12)?,
        cpu_user_delta_ticks: u(13)?,
        memory: MemoryCounters {
            page_fault_count: u(14)?,
            working_set_size: u(15)?,
            peak_working_set_size: u(16)?,
            pagefile_usage: u(17)?,
            quota_paged_pool_usage: u(18)?,
            quota_nonpaged_pool_usage: u(19)?,
            quota_peak_nonpaged_pool_usage: u(20)?,
        },
        status: SampleStatus::from_bits(row.get(3)?),
    };

    Ok(StoredSample {
        id: row.get(0)?,
        timestamp,
        pid: u32::try_from(row.get::<_, i64>(2)?).unwrap_or_default(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(index: u64, pid: u32, millis: i64) -> Sample {
        Sample {
            index,
            timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
            pid,
            metrics: MetricsRecord {
                cpu_kernel_percent: 3,
                cpu_user_percent: 12,
                io_read_bytes_per_sec: 1_048_576,
                memory: MemoryCounters {
                    working_set_size: 64 << 20,
                    ..MemoryCounters::default()
                },
                status: SampleStatus {
                    cpu: true,
                    io: true,
                    memory: false,
                },
                ..MetricsRecord::default()
            },
        }
    }

    #[test]
    fn test_save_and_read_back() {
        let store = StatsStore::open_in_memory().unwrap();
        let saved = sample(0, 100, 1_700_000_000_000);

        let id = store.save(&saved).unwrap();
        let rows = store.recent(10, None).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].pid, 100);
        assert_eq!(rows[0].timestamp, saved.timestamp);
        assert_eq!(rows[0].metrics, saved.metrics);
    }

    #[test]
    fn test_ids_autoincrement() {
        let store = StatsStore::open_in_memory().unwrap();
        let first = store.save(&sample(0, 1, 1_000)).unwrap();
        let second = store.save(&sample(1, 1, 2_000)).unwrap();
        assert!(second > first);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_range_is_half_open() {
        let store = StatsStore::open_in_memory().unwrap();
        for (i, millis) in [1_000, 2_000, 3_000, 4_000].into_iter().enumerate() {
            store.save(&sample(i as u64, 1, millis)).unwrap();
        }

        let start = Utc.timestamp_millis_opt(2_000).unwrap();
        let end = Utc.timestamp_millis_opt(4_000).unwrap();
        let rows = store.range(start, end).unwrap();

        let stamps: Vec<i64> = rows.iter().map(|r| r.timestamp.timestamp_millis()).collect();
        assert_eq!(stamps, vec![2_000, 3_000]);
    }

    #[test]
    fn test_recent_filters_by_pid() {
        let store = StatsStore::open_in_memory().unwrap();
        store.save(&sample(0, 1, 1_000)).unwrap();
        store.save(&sample(0, 2, 2_000)).unwrap();
        store.save(&sample(1, 1, 3_000)).unwrap();

        let rows = store.recent(10, Some(1)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.pid == 1));
        // Newest first
        assert_eq!(rows[0].timestamp.timestamp_millis(), 3_000);
    }
}

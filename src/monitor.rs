//! Background polling loop
//!
//! One dedicated thread owns the [`Sampler`] and calls it once per interval.
//! Samples are handed to the consumer through an mpsc queue: the sampling
//! thread never waits on the consumer, and samples arrive in the order they
//! were produced. The consumer drains the queue on its own schedule.

use crate::sampler::{MetricsRecord, Sampler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryIter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One metrics record tagged with where and when it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Position in this monitor's stream, starting at 0
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub metrics: MetricsRecord,
}

/// Owns the sampling thread and the receiving end of its queue.
pub struct Monitor {
    pid: u32,
    interval: Duration,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    receiver: Receiver<Sample>,
}

impl Monitor {
    /// Move `sampler` onto a new thread and start polling every `interval`.
    pub fn spawn(sampler: Sampler, interval: Duration) -> anyhow::Result<Self> {
        let pid = sampler.pid();
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, receiver) = mpsc::channel();

        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(format!("sampler-{}", pid))
            .spawn(move || poll_loop(sampler, interval, thread_stop, tx))?;

        info!(pid, interval_ms = interval.as_millis() as u64, "sampling started");

        Ok(Self {
            pid,
            interval,
            stop,
            handle: Some(handle),
            receiver,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drain every sample queued so far without blocking.
    pub fn try_iter(&self) -> TryIter<'_, Sample> {
        self.receiver.try_iter()
    }

    /// Wait up to `timeout` for the next sample.
    ///
    /// Returns `None` on timeout or once the sampling thread has exited.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Sample> {
        match self.receiver.recv_timeout(timeout) {
            Ok(sample) => Some(sample),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the next sample arrives.
    pub fn recv(&self) -> Option<Sample> {
        self.receiver.recv().ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it. Takes at most one interval.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(pid = self.pid, "sampling thread panicked");
            } else {
                debug!(pid = self.pid, "sampling thread joined");
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_loop(mut sampler: Sampler, interval: Duration, stop: Arc<AtomicBool>, tx: Sender<Sample>) {
    let pid = sampler.pid();
    let mut index = 0u64;

    loop {
        thread::sleep(interval);
        if stop.load(Ordering::Acquire) {
            break;
        }

        let metrics = sampler.sample();
        if !metrics.status.is_complete() {
            debug!(pid, index, status = ?metrics.status, "partial sample");
        }

        let sample = Sample {
            index,
            timestamp: Utc::now(),
            pid,
            metrics,
        };
        if tx.send(sample).is_err() {
            debug!(pid, "sample receiver dropped, stopping");
            break;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::scripted::{ScriptedReading, ScriptedSource};
    use crate::sampler::{CpuNormalization, IoCounters, TICKS_PER_SECOND};
    use std::time::Instant;

    fn scripted_sampler(readings: usize) -> Sampler {
        let script = (0..readings as u64)
            .map(|i| {
                ScriptedReading::new(i * TICKS_PER_SECOND)
                    .cpu(i * TICKS_PER_SECOND / 10, 0)
                    .io(IoCounters::default())
            })
            .collect();
        Sampler::with_source(Box::new(ScriptedSource::new(11, script)), CpuNormalization::Raw)
    }

    #[test]
    fn test_samples_arrive_in_order() {
        let monitor = Monitor::spawn(scripted_sampler(8), Duration::from_millis(5)).unwrap();

        let mut indices = Vec::new();
        while indices.len() < 4 {
            let sample = monitor.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(sample.pid, 11);
            indices.push(sample.index);
        }

        assert_eq!(indices, vec![0, 1, 2, 3]);
        monitor.stop();
    }

    #[test]
    fn test_first_sample_uses_construction_baseline() {
        let monitor = Monitor::spawn(scripted_sampler(4), Duration::from_millis(5)).unwrap();
        let sample = monitor.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(sample.metrics.cpu_kernel_percent, 10);
    }

    #[test]
    fn test_stop_joins_within_interval() {
        let monitor = Monitor::spawn(scripted_sampler(2), Duration::from_millis(20)).unwrap();
        assert!(monitor.recv_timeout(Duration::from_secs(5)).is_some());

        let started = Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

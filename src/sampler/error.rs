//! Errors raised while binding to or querying a process

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    /// The OS refused to open the process, or the PID does not exist.
    #[error("failed to open process {pid}: {reason}")]
    ProcessOpen { pid: u32, reason: String },

    /// One counter query failed for an already-open process.
    #[error("{query} query failed for process {pid}: {reason}")]
    Query {
        pid: u32,
        query: &'static str,
        reason: String,
    },

    #[error("per-process counters are not available on this platform")]
    Unsupported,
}

impl SamplerError {
    pub(crate) fn query(pid: u32, query: &'static str, reason: impl ToString) -> Self {
        Self::Query {
            pid,
            query,
            reason: reason.to_string(),
        }
    }
}

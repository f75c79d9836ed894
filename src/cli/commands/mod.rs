//! Command feature handlers.
//!
//! Each module owns one command feature.

pub mod config_command;
pub mod history_command;
pub mod monitor_command;
pub mod processes_command;
pub mod report_command;
pub mod sample_command;

use crate::monitor::Sample;

/// One-line summary of a sample, shared by `sample` and `history`
pub(crate) fn format_sample_line(sample: &Sample) -> String {
    let m = &sample.metrics;
    let mut line = format!(
        "{:>6}  {}  {:>7}  cpu {:>3}% (user {:>3}%, kernel {:>3}%)  read {:>10}/s  write {:>10}/s  ws {:>10}",
        sample.index,
        sample.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S%.3f"),
        sample.pid,
        m.cpu_total_percent(),
        m.cpu_user_percent,
        m.cpu_kernel_percent,
        bytesize::to_string(m.io_read_bytes_per_sec, false),
        bytesize::to_string(m.io_write_bytes_per_sec, false),
        bytesize::to_string(m.memory.working_set_size, false),
    );
    if !m.status.is_complete() {
        let failed: Vec<&str> = [("cpu", m.status.cpu), ("io", m.status.io), ("memory", m.status.memory)]
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect();
        line.push_str(&format!("  [unavailable: {}]", failed.join(", ")));
    }
    line
}

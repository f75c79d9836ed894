//! Processes command feature.
//!
//! This module owns and handles the "healthops processes" command behavior.

use crate::processes::list_processes;
use crate::theme::Theme;

pub(crate) fn handle_processes(limit: usize, json: bool) -> anyhow::Result<()> {
    let entries = list_processes(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", Theme::header("Running Processes"));
    println!("{}", Theme::divider_bold(60));
    println!("{:>8}  {:<32}  {:>7}  {:>10}", "PID", "NAME", "CPU %", "MEMORY");
    for entry in &entries {
        println!(
            "{:>8}  {:<32}  {:>7.1}  {:>10}",
            entry.pid,
            entry.name,
            entry.cpu_usage,
            bytesize::to_string(entry.memory_bytes, false)
        );
    }
    println!();
    println!("{}", Theme::muted(&format!("{} processes shown", entries.len())));
    Ok(())
}

//! History command feature.
//!
//! This module owns and handles the "healthops history" command behavior.

use super::format_sample_line;
use crate::config::Config;
use crate::monitor::Sample;
use crate::store::StatsStore;
use crate::theme::Theme;

pub(crate) fn handle_history(
    config: &Config,
    limit: usize,
    pid: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let path = config.database_path()?;
    if !path.exists() {
        if json {
            println!("[]");
        } else {
            println!("No samples recorded yet ({} does not exist).", path.display());
            println!(
                "{}",
                Theme::muted("Tip: run 'healthops sample --record' or 'healthops monitor --record'")
            );
        }
        return Ok(());
    }

    let store = StatsStore::open(&path)?;
    let rows = store.recent(limit, pid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", Theme::header("Recorded Samples"));
    println!("{}", Theme::divider_bold(60));
    if rows.is_empty() {
        println!("(none)");
    }
    for row in &rows {
        // The database id stands in for the stream index.
        let sample = Sample {
            index: row.id.max(0) as u64,
            timestamp: row.timestamp,
            pid: row.pid,
            metrics: row.metrics,
        };
        println!("{}", format_sample_line(&sample));
    }
    println!();
    println!(
        "{}",
        Theme::muted(&format!(
            "{} of {} stored samples, newest first ({})",
            rows.len(),
            store.count()?,
            path.display()
        ))
    );
    Ok(())
}

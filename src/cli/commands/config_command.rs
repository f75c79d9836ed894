//! Config command feature.
//!
//! This module owns and handles the "healthops config" command behavior.

use crate::config::Config;
use crate::theme::Theme;

pub(crate) fn handle_config(show: bool, reset: bool, edit: bool) -> anyhow::Result<()> {
    if show || !(reset || edit) {
        print_config(&Config::load());
    } else if reset {
        let default_config = Config::default();
        default_config.save()?;
        println!("{} Configuration reset to defaults.", Theme::success("OK"));
    } else {
        let path = Config::config_path()?;
        // Create default config if it doesn't exist
        if !path.exists() {
            Config::default().save()?;
        }
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| default_editor().to_string());
        std::process::Command::new(editor)
            .arg(&path)
            .status()
            .map_err(|e| anyhow::anyhow!("Failed to open editor: {}", e))?;
    }
    Ok(())
}

fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn print_config(config: &Config) {
    println!("{}", Theme::header("Current Configuration"));
    println!("{}", Theme::divider_bold(60));
    println!();
    println!("Sampling:");
    println!("  Interval: {} ms", config.sampling.interval_ms);
    println!("  Per-core CPU: {}", config.sampling.per_core);
    println!();
    println!("Dashboard:");
    println!("  Chart points: {}", config.chart.points);
    println!("  Event rows: {}", config.table.max_rows);
    println!();
    println!("Processes:");
    println!("  Limit: {}", config.processes.limit);
    println!("  Refresh: {} s", config.processes.refresh_secs);
    println!();
    println!("Storage:");
    println!("  Record by default: {}", config.storage.record);
    match config.database_path() {
        Ok(path) => println!("  Database: {}", path.display()),
        Err(_) => println!("  Database: (unavailable)"),
    }
    println!();
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

mod commands;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;
use crate::logging;
use crate::processes;
use crate::theme::Theme;

#[derive(Parser)]
#[command(name = "healthops")]
#[command(version)]
#[command(about = "Live CPU, memory and I/O usage for a single process")]
#[command(
    long_about = "AI-Healthops samples one process's cumulative OS counters on a fixed \
    interval and turns them into per-interval CPU percentages, I/O rates and \
    memory figures.\n\n\
    Examples:\n  \
    healthops monitor                      # Dashboard for this process\n  \
    healthops monitor --name chrome        # Dashboard for a process by name\n  \
    healthops sample --pid 4242 --count 5  # Five samples, one per second\n  \
    healthops report analysis.txt          # Print an AI analysis report\n  \
    healthops history --limit 10           # Last ten recorded samples"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Which process to attach to. Neither flag means this process.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Process ID to sample
    #[arg(short = 'p', long, value_name = "PID", conflicts_with = "name")]
    pub pid: Option<u32>,

    /// Process name to sample (first match wins)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,
}

/// Sampling options shared by `monitor` and `sample`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SamplingArgs {
    /// Sampling interval in milliseconds [default: from config, 1000]
    #[arg(short = 'i', long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Divide CPU percentages by the logical core count
    #[arg(long)]
    pub per_core: bool,

    /// Store every sample in the history database
    #[arg(long)]
    pub record: bool,

    /// History database path [default: <data dir>/stats.db]
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Live dashboard for one process (CPU chart, process list, AI analysis)
    #[command(visible_alias = "m")]
    Monitor {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        sampling: SamplingArgs,

        /// AI analysis report to show on the analysis tab
        #[arg(short = 'r', long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Print samples to stdout without the dashboard
    #[command(visible_alias = "s")]
    Sample {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        sampling: SamplingArgs,

        /// Number of samples to take
        #[arg(short = 'c', long, default_value = "10", value_name = "N",
              value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,

        /// Output one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// List running processes, busiest first
    #[command(visible_alias = "ps")]
    Processes {
        /// Maximum number of processes to show [default: from config, 100]
        #[arg(short = 'l', long, value_name = "N")]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an AI analysis report file
    Report {
        /// Report file: free text followed by a JSON object
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output the parsed report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recorded samples, newest first
    History {
        /// History database path [default: <data dir>/stats.db]
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Number of samples to show
        #[arg(short = 'l', long, default_value = "20", value_name = "N")]
        limit: usize,

        /// Only show samples for this PID
        #[arg(short = 'p', long, value_name = "PID")]
        pid: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or modify configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long, conflicts_with = "edit")]
        reset: bool,

        /// Open the configuration file in $EDITOR
        #[arg(long)]
        edit: bool,
    },
}

/// Resolve `--pid`/`--name` to the PID to attach to, `None` meaning this process.
pub(crate) fn resolve_target(target: &TargetArgs) -> Result<Option<u32>> {
    if let Some(pid) = target.pid {
        return Ok(Some(pid));
    }
    let Some(name) = target.name.as_deref() else {
        return Ok(None);
    };

    let pids = processes::find_by_name(name);
    match pids.as_slice() {
        [] => bail!("No running process named '{}'", name),
        [pid] => Ok(Some(*pid)),
        [pid, ..] => {
            warn!(name, matches = pids.len(), pid, "several processes match, using the lowest PID");
            Ok(Some(*pid))
        }
    }
}

impl Cli {
    /// Print the command overview shown when no arguments are given
    pub fn show_interactive_menu() {
        println!();
        println!("{}", Theme::header("AI-Healthops - Per-Process Usage Monitor"));
        println!("{}", Theme::divider_bold(60));
        println!();
        println!("{}", Theme::primary("Available Commands:"));
        println!();
        println!(
            "  {}  {}  {}",
            Theme::command("monitor"),
            Theme::muted("or"),
            Theme::command("m"),
        );
        println!("     {} Live dashboard for one process", Theme::muted("→"));
        println!();
        println!(
            "  {}  {}  {}",
            Theme::command("sample"),
            Theme::muted("or"),
            Theme::command("s"),
        );
        println!("     {} Print samples without the dashboard", Theme::muted("→"));
        println!();
        println!(
            "  {}  {}  {}",
            Theme::command("processes"),
            Theme::muted("or"),
            Theme::command("ps"),
        );
        println!("     {} List running processes", Theme::muted("→"));
        println!();
        println!("  {}", Theme::command("report"));
        println!("     {} Print an AI analysis report", Theme::muted("→"));
        println!();
        println!("  {}", Theme::command("history"));
        println!("     {} Show recorded samples", Theme::muted("→"));
        println!();
        println!("  {}", Theme::command("config"));
        println!("     {} View or modify configuration", Theme::muted("→"));
        println!();
        println!("{}", Theme::divider(60));
        println!();
        println!("{}", Theme::primary("Quick Examples:"));
        println!();
        println!("  {} Dashboard for this process", Theme::command("healthops monitor"));
        println!(
            "  {} Dashboard with an analysis report",
            Theme::command("healthops monitor --name chrome --report analysis.txt")
        );
        println!(
            "  {} Five JSON samples, half a second apart",
            Theme::command("healthops sample --pid 4242 -c 5 -i 500 --json")
        );
        println!(
            "  {} Record while sampling",
            Theme::command("healthops sample --record")
        );
        println!();
        println!(
            "{}",
            Theme::muted("Tip: Use --help with any command for detailed options")
        );
        println!();
    }

    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            // No command provided - show interactive menu
            Self::show_interactive_menu();
            return Ok(());
        };

        // The dashboard owns the terminal, so its log goes to a file.
        if matches!(command, Commands::Monitor { .. }) {
            let log_path = Config::data_dir()?.join("healthops.log");
            logging::init_file(self.verbose, self.quiet, &log_path)?;
        } else {
            logging::init(self.verbose, self.quiet)?;
        }

        let mut config = Config::load();

        match command {
            Commands::Monitor {
                target,
                sampling,
                report,
            } => {
                config.apply_cli_overrides(sampling.interval_ms, sampling.per_core, sampling.record, sampling.db);
                commands::monitor_command::handle_monitor(&target, report, &config)
            }
            Commands::Sample {
                target,
                sampling,
                count,
                json,
            } => {
                config.apply_cli_overrides(sampling.interval_ms, sampling.per_core, sampling.record, sampling.db);
                commands::sample_command::handle_sample(&target, count, json, &config)
            }
            Commands::Processes { limit, json } => {
                let limit = limit.unwrap_or(config.processes.limit);
                commands::processes_command::handle_processes(limit, json)
            }
            Commands::Report { file, json } => commands::report_command::handle_report(&file, json),
            Commands::History { db, limit, pid, json } => {
                config.apply_cli_overrides(None, false, false, db);
                commands::history_command::handle_history(&config, limit, pid, json)
            }
            Commands::Config { show, reset, edit } => {
                commands::config_command::handle_config(show, reset, edit)
            }
        }
    }
}

//! Monitor command feature.
//!
//! This module owns and handles the "healthops monitor" command behavior.

use anyhow::Context;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cli::{resolve_target, TargetArgs};
use crate::config::Config;
use crate::monitor::Monitor;
use crate::processes;
use crate::report::load_report;
use crate::sampler::Sampler;
use crate::store::StatsStore;
use crate::tui::{
    self,
    state::{AppState, ReportState},
};

pub(crate) fn handle_monitor(
    target: &TargetArgs,
    report: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let pid = resolve_target(target)?;
    let sampler = Sampler::attach(pid)
        .context("Failed to attach to process")?
        .with_normalization(config.normalization());
    let pid = sampler.pid();

    let target_name = target
        .name
        .clone()
        .or_else(|| processes::process_name(pid))
        .unwrap_or_else(|| "unknown".to_string());

    let store = if config.storage.record {
        let path = config.database_path()?;
        info!(path = %path.display(), "recording samples");
        Some(StatsStore::open(&path)?)
    } else {
        None
    };

    let mut state = AppState::new(pid, target_name, config);
    if let Some(path) = report {
        let source = path.display().to_string();
        state.set_report(match load_report(&path) {
            Ok(report) => ReportState::Loaded { source, report },
            Err(e) => {
                warn!("Failed to load report {}: {}", source, e);
                ReportState::Failed {
                    source,
                    error: e.to_string(),
                }
            }
        });
    }

    let monitor = Monitor::spawn(sampler, config.interval())?;
    tui::run(state, monitor, store, config)
}

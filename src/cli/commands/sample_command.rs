//! Sample command feature.
//!
//! This module owns and handles the "healthops sample" command behavior.

use anyhow::Context;
use tracing::{info, warn};

use super::format_sample_line;
use crate::cli::{resolve_target, TargetArgs};
use crate::config::Config;
use crate::monitor::Monitor;
use crate::sampler::Sampler;
use crate::store::StatsStore;
use crate::theme::Theme;

pub(crate) fn handle_sample(
    target: &TargetArgs,
    count: u64,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let pid = resolve_target(target)?;
    let sampler = Sampler::attach(pid)
        .context("Failed to attach to process")?
        .with_normalization(config.normalization());

    let store = if config.storage.record {
        let path = config.database_path()?;
        info!(path = %path.display(), "recording samples");
        Some(StatsStore::open(&path)?)
    } else {
        None
    };

    if !json {
        println!(
            "Sampling PID {} every {} ms ({} samples)",
            Theme::value(&sampler.pid().to_string()),
            config.interval().as_millis(),
            count
        );
        println!("{}", Theme::divider(60));
    }

    let monitor = Monitor::spawn(sampler, config.interval())?;
    let mut received = 0;
    let mut record_errors = 0;
    while received < count {
        let Some(sample) = monitor.recv() else {
            warn!(received, "sampling thread ended early");
            break;
        };
        received += 1;

        if let Some(store) = &store {
            if let Err(e) = store.save(&sample) {
                record_errors += 1;
                warn!(index = sample.index, "failed to record sample: {:#}", e);
            }
        }

        if json {
            println!("{}", serde_json::to_string(&sample)?);
        } else {
            println!("{}", format_sample_line(&sample));
        }
    }
    monitor.stop();

    if store.is_some() && !json {
        let saved = received - record_errors;
        println!();
        if record_errors == 0 {
            println!("{} Recorded {} samples.", Theme::success("OK"), saved);
        } else {
            println!(
                "{} Recorded {} of {} samples.",
                Theme::warning("WARN"),
                saved,
                received
            );
        }
    }

    Ok(())
}

//! Report command feature.
//!
//! This module owns and handles the "healthops report" command behavior.

use anyhow::Context;
use std::path::Path;

use crate::report::{baseline_recommendations, load_report};
use crate::theme::Theme;

pub(crate) fn handle_report(file: &Path, json: bool) -> anyhow::Result<()> {
    let report = load_report(file).with_context(|| format!("Failed to read report {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", report.render_text());
    if report.is_empty() {
        println!();
        println!("{}", Theme::muted("(the report contained no findings)"));
    }

    println!();
    println!("{}", Theme::header("General Recommendations"));
    println!("{}", Theme::divider(60));
    for group in baseline_recommendations() {
        println!();
        println!("{}", group.title);
        for (label, details) in group.items {
            println!("  • {}: {}", label, details);
        }
    }
    Ok(())
}

//! AI-Healthops library crate
//!
//! Samples one process's cumulative OS counters and derives per-interval CPU,
//! I/O and memory figures. This crate provides both the `healthops` binary
//! and a library API for programmatic use.

pub mod chart;
pub mod cli;
pub mod config;
pub mod logging;
pub mod monitor;
pub mod processes;
pub mod report;
pub mod sampler;
pub mod store;
pub mod theme;
pub mod tui;

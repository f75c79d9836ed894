use crate::sampler::CpuNormalization;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Shortest polling interval accepted from config or CLI.
const MIN_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sampling: Sampling,

    #[serde(default)]
    pub chart: Chart,

    #[serde(default)]
    pub table: Table,

    #[serde(default)]
    pub processes: Processes,

    #[serde(default)]
    pub storage: Storage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sampling {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Divide CPU percentages by the logical core count
    #[serde(default)]
    pub per_core: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default = "default_chart_points")]
    pub points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processes {
    #[serde(default = "default_process_limit")]
    pub limit: usize,

    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Storage {
    /// Persist every sample to SQLite
    #[serde(default)]
    pub record: bool,

    /// Database path; defaults to the data directory
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            per_core: false,
        }
    }
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            points: default_chart_points(),
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

impl Default for Processes {
    fn default() -> Self {
        Self {
            limit: default_process_limit(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

fn default_interval_ms() -> u64 { 1000 }
fn default_chart_points() -> usize { crate::chart::DEFAULT_POINTS }
fn default_max_rows() -> usize { 50 }
fn default_process_limit() -> usize { crate::processes::DEFAULT_LIMIT }
fn default_refresh_secs() -> u64 { 10 }

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "healthops").context("Could not determine home directory")
}

impl Config {
    /// Get the config file path, e.g. %APPDATA%\healthops\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory for the sample database and the dashboard log
    pub fn data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Load config from file or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Self::default(),
        }
    }

    /// Load from `path`; unreadable or invalid files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(
        &mut self,
        interval_ms: Option<u64>,
        per_core: bool,
        record: bool,
        database: Option<PathBuf>,
    ) {
        if let Some(ms) = interval_ms {
            self.sampling.interval_ms = ms;
        }
        if per_core {
            self.sampling.per_core = true;
        }
        if record {
            self.storage.record = true;
        }
        if let Some(path) = database {
            self.storage.database = Some(path);
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sampling.interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn normalization(&self) -> CpuNormalization {
        if self.sampling.per_core {
            CpuNormalization::per_core()
        } else {
            CpuNormalization::Raw
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("stats.db")),
        }
    }
}

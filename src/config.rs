//! # Configuration Module
//!
//! Tunable thresholds, weights and fetch pacing for Vibeshuffle.
//!
//! Settings are read from a JSON file. Every key is optional, so a file only
//! needs the values it overrides:
//!
//! ```json
//! { "classifier": { "banger_tempo": 110.0 }, "fetch": { "pacing_ms": 0 } }
//! ```
//!
//! Lookup order:
//! 1. an explicit path (`--config`)
//! 2. `config.json` in the platform config directory
//!    - Linux: `~/.config/vibeshuffle/`
//!    - macOS: `~/Library/Application Support/vibeshuffle/`
//!    - Windows: `%APPDATA%\vibeshuffle\`
//! 3. built-in defaults

use crate::algorithm::ArrangementWeights;
use crate::classify::ClassifierThresholds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paging, batching and retry limits for catalog calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Items requested per playlist page.
    pub page_size: usize,
    /// Track IDs per audio-feature lookup.
    pub batch_size: usize,
    /// Artist IDs per genre lookup.
    pub artist_batch_size: usize,
    /// Pause between consecutive catalog requests.
    pub pacing_ms: u64,
    /// Attempts per batch while rate limited.
    pub max_attempts: u32,
    /// Used when a rate-limit response carries no retry hint.
    pub default_retry_after_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            batch_size: 100,
            artist_batch_size: 100,
            pacing_ms: 200,
            max_attempts: 3,
            default_retry_after_secs: 1,
        }
    }
}

impl FetchSettings {
    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// What goes into the final playlist report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub include_stats: bool,
    pub genre_limit: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            include_stats: true,
            genre_limit: 20,
        }
    }
}

/// All runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub classifier: ClassifierThresholds,
    pub weights: ArrangementWeights,
    pub fetch: FetchSettings,
    pub report: ReportSettings,
}

impl Settings {
    /// Loads settings from `path`, or from the default location when `path`
    /// is `None`. A missing default file, or no config directory at all,
    /// means built-in defaults. Nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, or if any file read is not valid
    /// settings JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match get_config_path() {
                Ok(default_path) if default_path.exists() => Self::from_file(&default_path),
                Ok(default_path) => {
                    log::debug!("No config at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
                Err(e) => {
                    log::debug!("{e:#}; using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file at {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// Returns the platform-appropriate config file path.
///
/// Only resolves the path; nothing is created on disk.
///
/// # Errors
///
/// This function will return an error if the system config directory cannot
/// be determined.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Please ensure your platform supports standard config directories."
        )
    })?;

    Ok(config_file_in(&config_dir))
}

fn config_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join("vibeshuffle").join("config.json")
}

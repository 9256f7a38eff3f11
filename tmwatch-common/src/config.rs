// Centralized configuration for tmwatch

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default poll interval in seconds
pub const DEFAULT_INTERVAL_SECS: f64 = 2.0;

/// tmwatch configuration with support for file and environment overrides
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between polls (default: 2.0)
    pub interval_secs: f64,

    /// Keep polling after the backup finishes
    pub run_indefinitely: bool,

    /// Show the full `tmutil status` output
    pub show_status: bool,

    /// Show the progress bar (default: true)
    pub show_progress: bool,

    /// Column width reserved for the phase label (default: 24)
    pub phase_width: usize,

    /// Width of the progress bar itself (default: 32)
    pub bar_width: usize,

    /// Program used to query Time Machine (default: tmutil)
    pub tmutil: PathBuf,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            run_indefinitely: false,
            show_status: false,
            show_progress: true,
            phase_width: 24,
            bar_width: 32,
            tmutil: PathBuf::from("tmutil"),
        }
    }
}

impl WatchConfig {
    /// Default location of the config file (~/.config/tmwatch/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tmwatch").join("config.toml"))
    }

    /// Load configuration with file and environment variable overrides
    ///
    /// The file is `explicit` if given, then `TMWATCH_CONFIG`, then the
    /// default path. Only an explicitly named file is required to exist.
    /// Values are not validated here; command line flags may still replace
    /// them, so callers validate the final configuration.
    ///
    /// Supported environment variables:
    /// - TMWATCH_CONFIG: Override config file path
    /// - TMWATCH_INTERVAL: Override poll interval (seconds)
    /// - TMWATCH_TMUTIL: Override the tmutil program
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("TMWATCH_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load_from_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: WatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(interval) = lookup("TMWATCH_INTERVAL") {
            match interval.trim().parse::<f64>() {
                Ok(secs) => self.interval_secs = secs,
                Err(_) => log::warn!("Ignoring invalid TMWATCH_INTERVAL '{}'", interval),
            }
        }

        if let Some(program) = lookup("TMWATCH_TMUTIL") {
            if !program.is_empty() {
                self.tmutil = PathBuf::from(program);
            }
        }
    }

    /// Running forever with nothing on screen is pointless, so fall back to
    /// the status view in that case
    pub fn ensure_visible_output(&mut self) {
        if self.run_indefinitely && !self.show_status && !self.show_progress {
            log::debug!("Nothing to display while running indefinitely, enabling status view");
            self.show_status = true;
        }
    }

    /// Validate this configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.interval_secs.is_finite() || self.interval_secs <= 0.0 {
            return Err(format!(
                "Invalid interval {}. Must be a positive number of seconds",
                self.interval_secs
            ));
        }

        if Duration::try_from_secs_f64(self.interval_secs).is_err() {
            return Err(format!("Interval {} is too large", self.interval_secs));
        }

        if self.phase_width < 2 {
            return Err(format!(
                "Invalid phase_width {}. Must be at least 2",
                self.phase_width
            ));
        }

        if self.bar_width == 0 {
            return Err("bar_width must be at least 1".to_string());
        }

        if self.tmutil.as_os_str().is_empty() {
            return Err("tmutil program cannot be empty".to_string());
        }

        Ok(())
    }

    /// Poll interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_INTERVAL_SECS))
    }
}

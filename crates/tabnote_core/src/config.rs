//! Widget configuration.
//!
//! # Responsibility
//! - Deserialize the JSON config file with per-field defaults.
//! - Validate values that would otherwise break the scheduler.
//!
//! # Invariants
//! - `{}` is a complete, valid configuration.
//! - The vault directory is never part of the configuration.

use crate::logging::default_log_level;
use crate::wallpaper::scheduler::DEFAULT_SLIDESHOW_PERIOD;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_FILE_NAME: &str = "tabnote.sqlite3";
const DEFAULT_WALLPAPER_DIR: &str = "wallpapers";
const DEFAULT_WALLPAPERS: &[&str] = &["bg1.jpg", "bg2.jpg", "bg3.jpg"];

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Runtime configuration for one widget session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WidgetConfig {
    /// SQLite file holding the durable state.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub wallpaper_dir: PathBuf,
    /// Wallpaper file names, in rotation order.
    pub wallpapers: Vec<String>,
    pub slideshow_period_secs: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            wallpaper_dir: PathBuf::from(DEFAULT_WALLPAPER_DIR),
            wallpapers: DEFAULT_WALLPAPERS.iter().map(|name| name.to_string()).collect(),
            slideshow_period_secs: DEFAULT_SLIDESHOW_PERIOD.as_secs(),
        }
    }
}

impl WidgetConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parses and validates config JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slideshow_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "slideshow_period_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(blank) = self.wallpapers.iter().position(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "wallpapers[{blank}] must not be blank"
            )));
        }
        Ok(())
    }

    pub fn slideshow_period(&self) -> Duration {
        Duration::from_secs(self.slideshow_period_secs)
    }

    /// Wallpaper locations handed to the scheduler, in rotation order.
    pub fn wallpaper_urls(&self) -> Vec<String> {
        self.wallpapers
            .iter()
            .map(|name| self.wallpaper_dir.join(name).display().to_string())
            .collect()
    }
}

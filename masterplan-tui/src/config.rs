//! Command line and configuration file.
//!
//! Settings are resolved in three layers: built-in defaults, then the TOML
//! config file, then command line flags.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info};

use crate::layout::DEFAULT_PAD_DAYS;
use crate::models::Zoom;

/// Prefix of exported file names
pub const DEFAULT_EXPORT_PREFIX: &str = "LS×sena";

const APP_DIR: &str = "masterplan-tui";

/// Terminal Gantt chart and goal sheet for the LS x sena master plan
#[derive(Debug, Default, Parser)]
#[command(name = "masterplan-tui", version, about)]
pub struct Cli {
    /// Config file (default: <config dir>/masterplan-tui/config.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Plan JSON file to load instead of the built-in plan
    #[arg(long, value_name = "PATH")]
    pub plan: Option<PathBuf>,

    /// Initial zoom level
    #[arg(long, value_enum)]
    pub zoom: Option<Zoom>,

    /// Days of padding around the chart domain
    #[arg(long = "pad", value_name = "DAYS")]
    pub pad_days: Option<u32>,

    /// Date used for the today marker
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Directory for exported files
    #[arg(long, value_name = "PATH")]
    pub out_dir: Option<PathBuf>,

    /// Directory for log files
    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Config file contents; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub zoom: Option<Zoom>,
    pub pad_days: Option<u32>,
    pub today: Option<NaiveDate>,
    pub out_dir: Option<PathBuf>,
    pub export_prefix: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub plan: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `<config dir>/masterplan-tui/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR).join("config.toml"))
}

/// `<data dir>/masterplan-tui/logs`
pub fn default_log_dir() -> Option<PathBuf> {
    Some(dirs::data_local_dir()?.join(APP_DIR).join("logs"))
}

/// Effective settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub zoom: Zoom,
    pub pad_days: u32,
    /// Fixed today; `None` means the local date at start-up
    pub today: Option<NaiveDate>,
    pub out_dir: PathBuf,
    pub export_prefix: String,
    pub log_dir: Option<PathBuf>,
    pub plan: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: Zoom::default(),
            pad_days: DEFAULT_PAD_DAYS,
            today: None,
            out_dir: PathBuf::from("."),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            log_dir: None,
            plan: None,
        }
    }
}

impl Settings {
    /// Resolve settings for a parsed command line.
    ///
    /// An explicit `--config` must exist; the default location is only read
    /// when present.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => Some(FileConfig::load(path)?),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Some(FileConfig::load(&path)?),
                None => {
                    debug!("no config file, using defaults");
                    None
                }
            },
        };
        let mut settings = Self::default();
        if let Some(file) = file {
            settings.apply_file(file);
        }
        settings.apply_cli(cli);
        Ok(settings)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(zoom) = file.zoom {
            self.zoom = zoom;
        }
        if let Some(pad) = file.pad_days {
            self.pad_days = pad;
        }
        if let Some(prefix) = file.export_prefix {
            self.export_prefix = prefix;
        }
        if let Some(out_dir) = file.out_dir {
            self.out_dir = out_dir;
        }
        self.today = file.today.or(self.today);
        self.log_dir = file.log_dir.or(self.log_dir.take());
        self.plan = file.plan.or(self.plan.take());
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(zoom) = cli.zoom {
            self.zoom = zoom;
        }
        if let Some(pad) = cli.pad_days {
            self.pad_days = pad;
        }
        if let Some(out_dir) = &cli.out_dir {
            self.out_dir = out_dir.clone();
        }
        self.today = cli.today.or(self.today);
        if cli.log_dir.is_some() {
            self.log_dir = cli.log_dir.clone();
        }
        if cli.plan.is_some() {
            self.plan = cli.plan.clone();
        }
    }

    pub fn today_or(&self, local: NaiveDate) -> NaiveDate {
        self.today.unwrap_or(local)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone().or_else(default_log_dir)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "masterplan-tui",
            "--zoom",
            "month",
            "--pad",
            "5",
            "--today",
            "2025-09-01",
            "--out-dir",
            "exports",
        ])
        .unwrap();
        assert_eq!(cli.zoom, Some(Zoom::Month));
        assert_eq!(cli.pad_days, Some(5));
        assert_eq!(cli.today, Some(date(2025, 9, 1)));
        assert_eq!(cli.out_dir, Some(PathBuf::from("exports")));
        assert!(cli.plan.is_none());
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["masterplan-tui", "--zoom", "year"]).is_err());
        assert!(Cli::try_parse_from(["masterplan-tui", "--today", "09/01"]).is_err());
        assert!(Cli::try_parse_from(["masterplan-tui", "--pad", "-1"]).is_err());
    }

    #[test]
    fn test_cli_overrides_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "zoom = \"day\"\npad_days = 4\ntoday = \"2025-08-20\"\nexport_prefix = \"plan\"\n",
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            pad_days: Some(1),
            ..Cli::default()
        };
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(
            settings,
            Settings {
                zoom: Zoom::Day,
                pad_days: 1,
                today: Some(date(2025, 8, 20)),
                out_dir: PathBuf::from("."),
                export_prefix: "plan".to_string(),
                log_dir: None,
                plan: None,
            }
        );
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let mut settings = Settings::default();
        settings.apply_file(toml::from_str("").unwrap());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.today_or(date(2026, 1, 2)), date(2026, 1, 2));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "zoom = \"week\"\ncolour = \"red\"\n").unwrap();
        assert!(matches!(FileConfig::load(&path), Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("missing.toml")),
            ..Cli::default()
        };
        assert!(matches!(Settings::resolve(&cli), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_log_dir_override() {
        let settings = Settings {
            log_dir: Some(PathBuf::from("/tmp/logs")),
            ..Settings::default()
        };
        assert_eq!(settings.log_dir(), Some(PathBuf::from("/tmp/logs")));
    }
}

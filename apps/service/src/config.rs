use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::WorkerSettings;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    ReadFailed(std::io::Error),
    #[error("failed to write config file: {0}")]
    WriteFailed(std::io::Error),
    #[error("failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no usable config path (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: Storage,
    pub worker: WorkerTimers,
    pub alerts: Alerts,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Root of the record collections (`checks`, `users`, `tokens`).
    pub data_dir: path::PathBuf,
    /// Root of the per-check log files and rotation archives.
    pub logs_dir: path::PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self { data_dir: ".data".into(), logs_dir: ".logs".into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerTimers {
    pub probe_interval_seconds: u64,
    pub rotation_interval_seconds: u64,
    pub max_concurrent_probes: usize,
}

impl Default for WorkerTimers {
    fn default() -> Self {
        Self {
            probe_interval_seconds: 30,
            rotation_interval_seconds: 24 * 60 * 60,
            max_concurrent_probes: 64,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alerts {
    /// SMS delivery credentials. Absent means alerts only go to the
    /// process log.
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/vigil/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("vigil/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Internal Configuration State:")?;
        writeln!(f, "  Storage")?;
        writeln!(f, "    Data Directory: {}", self.storage.data_dir.display())?;
        writeln!(f, "    Logs Directory: {}", self.storage.logs_dir.display())?;
        writeln!(f, "  Worker")?;
        writeln!(f, "    Probe Interval: {}s", self.worker.probe_interval_seconds)?;
        writeln!(f, "    Rotation Interval: {}s", self.worker.rotation_interval_seconds)?;
        writeln!(f, "    Max Concurrent Probes: {}", self.worker.max_concurrent_probes)?;
        writeln!(f, "  Alerts")?;
        writeln!(
            f,
            "    SMS: {}",
            if self.alerts.twilio.is_some() { "twilio" } else { "process log only" }
        )?;
        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/vigil/config.toml
    /// or the specified path, with the name config.toml if one does not
    /// exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(Error::WriteFailed)
    }

    /// Timer settings in the worker's own terms.
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            probe_interval: std::time::Duration::from_secs(self.worker.probe_interval_seconds),
            rotation_interval: std::time::Duration::from_secs(
                self.worker.rotation_interval_seconds,
            ),
            max_concurrent_probes: self.worker.max_concurrent_probes,
        }
    }
}

use crate::resolver::host::HostInfo;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolver settings, read from a TOML file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Node.js executable used for helper invocations and version checks.
    pub node_runtime: Option<PathBuf>,
    /// Time limit for a single network probe of a debug port.
    pub probe_timeout_ms: u64,
    /// Override of the ARM architecture version used in nvs directory names.
    pub arm_version: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_runtime: None,
            probe_timeout_ms: 2000,
            arm_version: None,
        }
    }
}

impl Settings {
    const DEFAULT_PATH: &'static str = ".config/ndr/settings.toml";

    /// Load settings from file. Return [`None`] on errors.
    /// Without an explicit path a file in the user home directory is used, if it exists.
    pub fn from_file(path: Option<&Path>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?;
                let path = path.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load settings file: {err}");
                    return None;
                }
            },
        };

        weak_error!(toml::de::from_str(&data))
    }

    /// Load settings, fall back to defaults on errors.
    pub fn load(path: Option<&Path>) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Current platform with settings overrides applied.
    pub fn host(&self) -> HostInfo {
        let mut host = HostInfo::current();
        if self.arm_version.is_some() {
            host.arm_version = self.arm_version;
        }
        host
    }
}

//! Capabilities that the resolver consumes from its host: environment, filesystem,
//! user interaction and target process introspection.

use crate::resolver::config::LaunchConfiguration;
use crate::resolver::error::Error;
use crate::resolver::protocol::{DebugType, ProtocolKind};
use crate::resolver::Pid;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Host operating system family.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OsFamily {
    Windows,
    Unix,
}

/// Platform facts the resolver depends on.
#[derive(Clone, Debug)]
pub struct HostInfo {
    pub os: OsFamily,
    /// Native architecture in Node.js naming (`x64`, `ia32`, `arm64`, ...).
    pub arch: String,
    /// ARM architecture version, if the host is an ARM build.
    pub arm_version: Option<u32>,
}

impl HostInfo {
    /// Describe the platform this binary was built for.
    pub fn current() -> Self {
        let os = if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        };

        let arch = match std::env::consts::ARCH {
            "x86_64" => "x64",
            "x86" => "ia32",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            other => other,
        };

        let arm_version = if cfg!(all(target_arch = "arm", target_feature = "v7")) {
            Some(7)
        } else if cfg!(all(target_arch = "arm", target_feature = "v6")) {
            Some(6)
        } else {
            None
        };

        Self {
            os,
            arch: arch.to_string(),
            arm_version,
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == OsFamily::Windows
    }

    /// Environment key and separator used for the executable search path.
    pub fn path_var(&self) -> (&'static str, char) {
        match self.os {
            OsFamily::Windows => ("Path", ';'),
            OsFamily::Unix => ("PATH", ':'),
        }
    }
}

/// Read access to environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;

    fn home_dir(&self) -> Option<PathBuf>;
}

/// Filesystem existence probes.
pub trait FileSystem {
    fn is_dir(&self, path: &Path) -> bool;
}

/// Interactive selection of a process to attach to.
pub trait ProcessPicker {
    /// Return the picked pid as entered by the user, or `None` if selection was cancelled.
    fn pick(&self) -> anyhow::Result<Option<String>>;
}

/// Sink for messages presented to the user when a launch is aborted.
pub trait Notifier {
    fn notify(&self, message: &str, modal: bool);
}

/// External debug type detection used when neither pid nor protocol are given.
pub trait AutoDetect {
    fn detect(&self, config: &LaunchConfiguration) -> Option<DebugType>;
}

/// Live inspection of a process already switched into debug mode.
pub trait ProtocolProbe {
    /// Return a protocol the process listens on, `None` if it can't be determined.
    fn probe(&self, pid: Pid) -> Result<Option<ProtocolKind>, Error>;
}

/// Switches a running process into debug mode.
pub trait DebugModeActivator {
    fn activate(&self, pid: Pid) -> Result<(), Error>;
}

/// Process environment.
#[derive(Default, Clone, Copy)]
pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        home::home_dir()
    }
}

#[derive(Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Environment backed by a map, for embedding and tests.
#[derive(Default, Clone, Debug)]
pub struct MemoryEnvironment {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl Environment for MemoryEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

/// Filesystem with a fixed set of existing directories.
#[derive(Default, Clone, Debug)]
pub struct MemoryFileSystem {
    dirs: HashSet<PathBuf>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}

/// Picker for non-interactive hosts, any pick is cancelled.
#[derive(Default, Clone, Copy)]
pub struct NoPicker;

impl ProcessPicker for NoPicker {
    fn pick(&self) -> anyhow::Result<Option<String>> {
        log::info!(target: "resolver", "interactive process selection is not available");
        Ok(None)
    }
}

/// Notifier that writes messages into the log.
#[derive(Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, _modal: bool) {
        log::error!(target: "resolver", "{message}");
    }
}

//! Resolution of a Node.js debug launch configuration: which adapter `type` should start a
//! session, on which port, with which runtime on `PATH`.

pub mod activate;
pub mod auto;
pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod protocol;
pub mod version;

use crate::resolver::activate::OsActivator;
use crate::resolver::auto::RuntimeAutoDetect;
use crate::resolver::config::{LaunchConfiguration, ProcessId, Request};
use crate::resolver::error::Error;
use crate::resolver::host::{
    AutoDetect, DebugModeActivator, Environment, FileSystem, HostInfo, LogNotifier, NoPicker,
    Notifier, OsEnvironment, OsFileSystem, ProcessPicker, ProtocolProbe,
};
use crate::resolver::protocol::{detect_protocol, DebugType, ProcessProbe};
use log::{info, warn};
use once_cell::sync;
use regex::Regex;

/// Operating system process identifier.
pub type Pid = u32;

/// Outcome of a configuration resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resolution {
    /// Launch may proceed. Contains a debug type if one was determined.
    Resolved(Option<DebugType>),
    /// Launch cancelled by the user or because of an error already shown to the user.
    Aborted,
}

/// Validate a process id entered by a user or written in a configuration.
pub fn parse_pid(s: &str) -> Result<Pid, Error> {
    static PID_RE: sync::Lazy<Regex> =
        sync::Lazy::new(|| Regex::new(r"^[0-9]+$").expect("must compile"));

    let s = s.trim();
    if !PID_RE.is_match(s) {
        return Err(Error::NotAProcessId(s.to_string()));
    }

    match s.parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(pid as Pid),
        _ => Err(Error::NotAProcessId(s.to_string())),
    }
}

pub struct ResolverBuilder {
    host: HostInfo,
    env: Box<dyn Environment>,
    fs: Box<dyn FileSystem>,
    picker: Box<dyn ProcessPicker>,
    notifier: Box<dyn Notifier>,
    activator: Box<dyn DebugModeActivator>,
    probe: Box<dyn ProtocolProbe>,
    auto: Box<dyn AutoDetect>,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    /// Create a builder with OS backed capabilities, a picker that always cancels and
    /// a notifier that writes into the log.
    pub fn new() -> Self {
        let host = HostInfo::current();
        Self {
            auto: Box::new(RuntimeAutoDetect::new(host.clone())),
            host,
            env: Box::new(OsEnvironment),
            fs: Box::new(OsFileSystem),
            picker: Box::new(NoPicker),
            notifier: Box::new(LogNotifier),
            activator: Box::new(OsActivator::new()),
            probe: Box::new(ProcessProbe::new()),
        }
    }

    pub fn with_host(self, host: HostInfo) -> Self {
        Self { host, ..self }
    }

    pub fn with_environment(self, env: impl Environment + 'static) -> Self {
        Self {
            env: Box::new(env),
            ..self
        }
    }

    pub fn with_file_system(self, fs: impl FileSystem + 'static) -> Self {
        Self {
            fs: Box::new(fs),
            ..self
        }
    }

    pub fn with_picker(self, picker: impl ProcessPicker + 'static) -> Self {
        Self {
            picker: Box::new(picker),
            ..self
        }
    }

    pub fn with_notifier(self, notifier: impl Notifier + 'static) -> Self {
        Self {
            notifier: Box::new(notifier),
            ..self
        }
    }

    pub fn with_activator(self, activator: impl DebugModeActivator + 'static) -> Self {
        Self {
            activator: Box::new(activator),
            ..self
        }
    }

    pub fn with_probe(self, probe: impl ProtocolProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            ..self
        }
    }

    pub fn with_auto_detect(self, auto: impl AutoDetect + 'static) -> Self {
        Self {
            auto: Box::new(auto),
            ..self
        }
    }

    pub fn build(self) -> Resolver {
        Resolver {
            host: self.host,
            env: self.env,
            fs: self.fs,
            picker: self.picker,
            notifier: self.notifier,
            activator: self.activator,
            probe: self.probe,
            auto: self.auto,
        }
    }
}

/// Turns a launch request into a launch configuration a debug adapter can start.
pub struct Resolver {
    host: HostInfo,
    env: Box<dyn Environment>,
    fs: Box<dyn FileSystem>,
    picker: Box<dyn ProcessPicker>,
    notifier: Box<dyn Notifier>,
    activator: Box<dyn DebugModeActivator>,
    probe: Box<dyn ProtocolProbe>,
    auto: Box<dyn AutoDetect>,
}

impl Resolver {
    /// Resolve a configuration in place.
    ///
    /// Errors addressed to the user (wrong pid, missing version manager, etc.) are shown with
    /// a [`Notifier`] and turn into [`Resolution::Aborted`]. Other errors, like a malformed
    /// `runtimeVersion`, are returned as is.
    ///
    /// # Arguments
    ///
    /// * `config`: launch configuration, updated with a debug type, a port and an environment
    pub fn resolve(&self, config: &mut LaunchConfiguration) -> Result<Resolution, Error> {
        match self.try_resolve(config) {
            Ok(Resolution::Resolved(Some(debug_type))) => {
                info!(target: "resolver", "debug type resolved: {debug_type}");
                config.debug_type = Some(debug_type);
                Ok(Resolution::Resolved(Some(debug_type)))
            }
            Ok(Resolution::Resolved(None)) => {
                info!(target: "resolver", "debug type is not determined, configuration kept");
                Ok(Resolution::Resolved(None))
            }
            Ok(Resolution::Aborted) => {
                info!(target: "resolver", "launch cancelled");
                Ok(Resolution::Aborted)
            }
            Err(e) if e.is_user_facing() => {
                warn!(target: "resolver", "launch aborted: {e:#}");
                self.notifier.notify(&e.to_string(), true);
                Ok(Resolution::Aborted)
            }
            Err(e) => Err(e),
        }
    }

    fn try_resolve(&self, config: &mut LaunchConfiguration) -> Result<Resolution, Error> {
        config.validate()?;
        // version managers only affect a runtime started by the session
        if config.request == Some(Request::Launch) {
            manager::apply_runtime_version(config, &self.host, &*self.env, &*self.fs)?;
        }
        self.determine_debug_type(config)
    }

    fn determine_debug_type(&self, config: &mut LaunchConfiguration) -> Result<Resolution, Error> {
        if config.is_attach() {
            if let Some(process_id) = config.process_id.clone() {
                return self.resolve_by_pid(config, process_id);
            }
        }

        if let Some(kind) = config.protocol.and_then(|p| p.kind()) {
            return Ok(Resolution::Resolved(Some(DebugType::from(kind))));
        }

        Ok(Resolution::Resolved(self.auto.detect(config)))
    }

    fn resolve_by_pid(
        &self,
        config: &mut LaunchConfiguration,
        process_id: ProcessId,
    ) -> Result<Resolution, Error> {
        let raw_pid = match process_id {
            ProcessId::Number(pid) => pid.to_string(),
            ref id if id.is_pick_command() => match self.picker.pick().map_err(Error::Picker)? {
                Some(pid) if !pid.trim().is_empty() => pid,
                _ => return Ok(Resolution::Aborted),
            },
            ProcessId::String(pid) => pid,
        };

        let pid = parse_pid(&raw_pid)?;
        self.activator.activate(pid)?;

        let Some(kind) = detect_protocol(config, pid, &*self.probe)? else {
            return Ok(Resolution::Resolved(None));
        };

        info!(target: "resolver", "process {pid} listens with {kind} protocol");
        config.process_id = None;
        config.port = Some(kind.default_port());
        Ok(Resolution::Resolved(Some(DebugType::from(kind))))
    }
}

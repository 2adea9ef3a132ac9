use crate::resolver::config::LaunchConfiguration;
use crate::resolver::error::Error;
use crate::resolver::host::ProtocolProbe;
use crate::resolver::version::RuntimeVersion;
use crate::resolver::Pid;
use crate::{muted_error, weak_error};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumString, IntoStaticStr};
use sysinfo::{Process, RefreshKind, System};

/// Default port of an inspector protocol listener.
pub const INSPECTOR_PORT_DEFAULT: u16 = 9229;
/// Default port of a legacy protocol listener.
pub const LEGACY_PORT_DEFAULT: u16 = 5858;

/// Debug wire protocol spoken by a target process.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, IntoStaticStr)]
pub enum ProtocolKind {
    #[strum(serialize = "legacy")]
    Legacy,
    #[strum(serialize = "inspector")]
    Inspector,
}

impl ProtocolKind {
    pub fn default_port(self) -> u16 {
        match self {
            ProtocolKind::Legacy => LEGACY_PORT_DEFAULT,
            ProtocolKind::Inspector => INSPECTOR_PORT_DEFAULT,
        }
    }

    /// Return protocol which listens on this port by default.
    pub fn from_default_port(port: u16) -> Option<Self> {
        match port {
            INSPECTOR_PORT_DEFAULT => Some(ProtocolKind::Inspector),
            LEGACY_PORT_DEFAULT => Some(ProtocolKind::Legacy),
            _ => None,
        }
    }
}

/// Value of the `protocol` launch attribute.
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolSetting {
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "legacy")]
    Legacy,
    #[strum(serialize = "inspector")]
    Inspector,
}

impl ProtocolSetting {
    /// Return an explicitly requested protocol, `None` for `auto`.
    pub fn kind(self) -> Option<ProtocolKind> {
        match self {
            ProtocolSetting::Auto => None,
            ProtocolSetting::Legacy => Some(ProtocolKind::Legacy),
            ProtocolSetting::Inspector => Some(ProtocolKind::Inspector),
        }
    }
}

/// Debug adapter family, written into the `type` launch attribute.
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum DebugType {
    /// Adapter for the legacy protocol.
    #[serde(rename = "node")]
    #[strum(serialize = "node")]
    Node,
    /// Adapter for the inspector protocol.
    #[serde(rename = "node2")]
    #[strum(serialize = "node2")]
    Node2,
}

impl From<ProtocolKind> for DebugType {
    fn from(kind: ProtocolKind) -> Self {
        match kind {
            ProtocolKind::Legacy => DebugType::Node,
            ProtocolKind::Inspector => DebugType::Node2,
        }
    }
}

impl From<DebugType> for ProtocolKind {
    fn from(debug_type: DebugType) -> Self {
        match debug_type {
            DebugType::Node => ProtocolKind::Legacy,
            DebugType::Node2 => ProtocolKind::Inspector,
        }
    }
}

/// Determine a protocol of a process that is already in debug mode. Explicit configuration
/// wins over live inspection, probe is called only if configuration says nothing.
///
/// # Arguments
///
/// * `config`: launch configuration
/// * `pid`: target process
/// * `probe`: live process inspector
pub fn detect_protocol(
    config: &LaunchConfiguration,
    pid: Pid,
    probe: &dyn ProtocolProbe,
) -> Result<Option<ProtocolKind>, Error> {
    if let Some(kind) = config.port.and_then(ProtocolKind::from_default_port) {
        debug!(target: "resolver", "protocol {kind} selected by port");
        return Ok(Some(kind));
    }

    if let Some(kind) = config.protocol.and_then(ProtocolSetting::kind) {
        debug!(target: "resolver", "protocol {kind} selected by configuration");
        return Ok(Some(kind));
    }

    let detected = probe.probe(pid)?;
    debug!(target: "resolver", "probe process {pid}: {detected:?}");
    Ok(detected)
}

/// Runtime options that take a value as a separate argument.
const VALUE_OPTIONS: &[&str] = &[
    "-r",
    "--require",
    "--loader",
    "--experimental-loader",
    "--import",
];

/// Inspect a command line of a process for debug flags.
fn protocol_from_args<S: AsRef<str>>(args: &[S]) -> Option<ProtocolKind> {
    // runtime options stop at the first script argument
    let mut args = args.iter().skip(1);
    while let Some(arg) = args.next() {
        let arg: &str = arg.as_ref();
        if !arg.starts_with('-') {
            break;
        }
        if VALUE_OPTIONS.contains(&arg) {
            args.next();
            continue;
        }

        let flag = arg.split('=').next().unwrap_or(arg);
        match flag {
            "--inspect" | "--inspect-brk" | "--inspect-port" | "--inspect-wait" => {
                return Some(ProtocolKind::Inspector)
            }
            "--debug" | "--debug-brk" | "--debug-port" => return Some(ProtocolKind::Legacy),
            _ => {}
        }
    }
    None
}

/// True if an executable path names a Node.js runtime.
pub fn is_node_executable(path: impl AsRef<Path>) -> bool {
    path.as_ref().file_stem().is_some_and(|stem| {
        let stem = stem.to_string_lossy();
        if cfg!(windows) {
            stem.eq_ignore_ascii_case("node")
        } else {
            stem == "node"
        }
    })
}

/// True if a process runs a Node.js runtime.
pub fn is_node_process(process: &Process) -> bool {
    process.exe().is_some_and(is_node_executable)
        || is_node_executable(process.name())
        || process.cmd().first().is_some_and(is_node_executable)
}

/// Run a command and collect its stdout. A command running longer than `timeout` is killed.
fn output_with_timeout(mut command: Command, timeout: Duration) -> Option<String> {
    let mut child = weak_error!(
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn(),
        "run runtime executable:"
    )?;

    let deadline = Instant::now() + timeout;
    loop {
        match weak_error!(child.try_wait(), "wait runtime executable:") {
            Some(Some(_)) => break,
            Some(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
            _ => {
                warn!(target: "resolver", "runtime executable doesn't respond in {timeout:?}, kill it");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }

    let mut pipe = child.stdout.take()?;
    let mut stdout = String::new();
    muted_error!(pipe.read_to_string(&mut stdout))?;
    Some(stdout)
}

/// Ask a runtime executable for its version.
pub(crate) fn runtime_version(runtime: &Path, timeout: Duration) -> Option<RuntimeVersion> {
    let mut command = Command::new(runtime);
    command.arg("--version");
    RuntimeVersion::parse(&output_with_timeout(command, timeout)?)
}

/// Live-process probe built on process table introspection.
#[derive(Clone, Copy, Debug)]
pub struct ProcessProbe {
    timeout: Duration,
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit for a runtime version request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ProtocolProbe for ProcessProbe {
    fn probe(&self, pid: Pid) -> Result<Option<ProtocolKind>, Error> {
        let sys =
            System::new_with_specifics(RefreshKind::everything().without_cpu().without_memory());

        let process = System::process(&sys, sysinfo::Pid::from_u32(pid))
            .ok_or(Error::ProcessNotFound(pid))?;

        if !is_node_process(process) {
            debug!(target: "resolver", "process {pid} is not a Node.js runtime");
            return Ok(None);
        }

        if let Some(kind) = protocol_from_args(process.cmd()) {
            debug!(target: "resolver", "process {pid} started with {kind} flags");
            return Ok(Some(kind));
        }

        // debug mode activated by a signal, so the runtime version decides what is listening
        let Some(exe) = process.exe() else {
            return Ok(None);
        };
        let Some(version) = runtime_version(exe, self.timeout) else {
            return Ok(None);
        };
        debug!(target: "resolver", "process {pid} runtime version: {version:?}");

        Ok(Some(if version.inspector_by_default() {
            ProtocolKind::Inspector
        } else {
            ProtocolKind::Legacy
        }))
    }
}

use crate::resolver::config::{LaunchConfiguration, Request};
use crate::resolver::host::{AutoDetect, HostInfo};
use crate::resolver::protocol::{
    is_node_executable, runtime_version, DebugType, ProtocolKind, INSPECTOR_PORT_DEFAULT,
    LEGACY_PORT_DEFAULT,
};
use crate::{muted_error, weak_error};
use log::{debug, warn};
use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// First bytes a legacy debugger sends to a connected client.
const LEGACY_GREETING: &[u8] = b"Type: connect";

const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Classify a debug listener by its greeting. A legacy debugger greets a client right after
/// connect, an inspector keeps silent until it gets an HTTP or websocket request.
fn greeting_protocol(stream: &mut impl Read) -> Option<ProtocolKind> {
    let mut greeting = Vec::with_capacity(LEGACY_GREETING.len());
    let mut buf = [0u8; 64];

    loop {
        match stream.read(&mut buf) {
            Ok(0) if greeting.is_empty() => return None,
            Ok(0) => break,
            Ok(n) => {
                greeting.extend_from_slice(&buf[..n]);
                if greeting.len() >= LEGACY_GREETING.len() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if greeting.is_empty() {
                    return Some(ProtocolKind::Inspector);
                }
                break;
            }
            Err(e) => {
                warn!(target: "resolver", "read debugger greeting: {e:#}");
                return None;
            }
        }
    }

    greeting
        .starts_with(LEGACY_GREETING)
        .then_some(ProtocolKind::Legacy)
}

/// Default debug type detection: asks a runtime for its version on launch, and listens
/// for a debugger greeting on attach.
#[derive(Clone, Debug)]
pub struct RuntimeAutoDetect {
    host: HostInfo,
    runtime: Option<PathBuf>,
    timeout: Duration,
}

impl RuntimeAutoDetect {
    pub fn new(host: HostInfo) -> Self {
        Self {
            host,
            runtime: None,
            timeout: Duration::from_secs(2),
        }
    }

    /// Runtime used when a configuration doesn't set `runtimeExecutable`.
    pub fn with_runtime(mut self, runtime: Option<PathBuf>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Limit for a connect and a greeting wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return a runtime executable that a launch request will start, if it is a Node.js one.
    fn launch_runtime(&self, config: &LaunchConfiguration) -> Option<PathBuf> {
        let runtime = config
            .runtime_executable
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| self.runtime.clone())
            .unwrap_or_else(|| PathBuf::from("node"));

        if !is_node_executable(&runtime) {
            debug!(target: "resolver", "runtime {} is not a Node.js executable", runtime.display());
            return None;
        }

        if runtime.components().count() > 1 {
            return Some(runtime);
        }

        let (path_key, _) = self.host.path_var();
        let search_path = config
            .env
            .as_ref()
            .and_then(|env| env.get(path_key))
            .cloned()
            .or_else(|| std::env::var(path_key).ok());
        let cwd = match config.cwd.as_deref() {
            Some(cwd) => PathBuf::from(cwd),
            None => std::env::current_dir().ok()?,
        };

        weak_error!(
            which::which_in(&runtime, search_path, cwd),
            "find runtime executable:"
        )
    }

    fn detect_launch(&self, config: &LaunchConfiguration) -> Option<DebugType> {
        let runtime = self.launch_runtime(config)?;
        let version = runtime_version(&runtime, self.timeout)?;
        debug!(target: "resolver", "runtime {} version: {version:?}", runtime.display());

        Some(if version.inspector_by_default() {
            DebugType::Node2
        } else {
            DebugType::Node
        })
    }

    fn sniff(&self, address: &str, port: u16) -> Option<ProtocolKind> {
        let addr = weak_error!(
            (address, port).to_socket_addrs(),
            "resolve debug address:"
        )?
        .next()?;

        let mut stream = muted_error!(
            TcpStream::connect_timeout(&addr, self.timeout),
            "connect to debug port:"
        )?;
        weak_error!(stream.set_read_timeout(Some(self.timeout)))?;

        let protocol = greeting_protocol(&mut stream);
        debug!(target: "resolver", "listener at {addr}: {protocol:?}");
        protocol
    }

    fn detect_attach(&self, config: &LaunchConfiguration) -> Option<DebugType> {
        let address = config.address.as_deref().unwrap_or(DEFAULT_ADDRESS);
        let ports = match config.port {
            Some(port) => vec![port],
            None => vec![INSPECTOR_PORT_DEFAULT, LEGACY_PORT_DEFAULT],
        };

        ports
            .into_iter()
            .find_map(|port| self.sniff(address, port))
            .map(DebugType::from)
    }
}

impl AutoDetect for RuntimeAutoDetect {
    fn detect(&self, config: &LaunchConfiguration) -> Option<DebugType> {
        match config.request {
            Some(Request::Launch) => self.detect_launch(config),
            Some(Request::Attach) => self.detect_attach(config),
            None => None,
        }
    }
}

use crate::resolver::error::Error;
use crate::resolver::host::DebugModeActivator;
use crate::resolver::Pid;
use log::info;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Build a command that asks a runtime to switch another process into debug mode.
pub(crate) fn debug_process_command(runtime: &Path, pid: Pid) -> Command {
    let mut cmd = Command::new(runtime);
    cmd.arg("-e").arg(format!("process._debugProcess({pid})"));
    cmd
}

/// Switches processes into debug mode with OS facilities: `SIGUSR1` on unix,
/// a helper runtime invocation on windows.
#[derive(Default, Clone, Debug)]
pub struct OsActivator {
    runtime: Option<PathBuf>,
}

impl OsActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this runtime for helper invocations instead of one found in `PATH`.
    pub fn with_runtime(mut self, runtime: impl Into<PathBuf>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    #[allow(unused)]
    fn activate_with_helper(&self, pid: Pid) -> Result<(), Error> {
        let activation_err = |source| Error::DebugModeActivation { pid, source };

        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => which::which("node").map_err(|e| {
                activation_err(std::io::Error::new(std::io::ErrorKind::NotFound, e))
            })?,
        };

        let output = debug_process_command(&runtime, pid)
            .output()
            .map_err(activation_err)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(activation_err(std::io::Error::new(
                std::io::ErrorKind::Other,
                stderr.trim().to_string(),
            )));
        }
        Ok(())
    }

    #[cfg(unix)]
    fn activate_with_signal(&self, pid: Pid) -> Result<(), Error> {
        use nix::sys::signal::{kill, Signal};

        let raw_pid = i32::try_from(pid).map_err(|_| Error::NotAProcessId(pid.to_string()))?;
        kill(nix::unistd::Pid::from_raw(raw_pid), Signal::SIGUSR1).map_err(|errno| {
            Error::DebugModeActivation {
                pid,
                source: errno.into(),
            }
        })
    }
}

impl DebugModeActivator for OsActivator {
    fn activate(&self, pid: Pid) -> Result<(), Error> {
        info!(target: "resolver", "enable debug mode for process {pid}");

        #[cfg(unix)]
        let result = self.activate_with_signal(pid);
        #[cfg(not(unix))]
        let result = self.activate_with_helper(pid);

        result
    }
}

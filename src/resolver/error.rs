use crate::resolver::Pid;
use std::string::FromUtf8Error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    FromUtf8(#[from] FromUtf8Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    // --------------------------------- parsing errors --------------------------------------------
    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    // --------------------------------- launch configuration errors -------------------------------
    #[error("invalid launch configuration: {0}")]
    InvalidConfiguration(String),
    #[error("attach to process: '{0}' doesn't look like a process id")]
    NotAProcessId(String),
    #[error("process picker: {0}")]
    Picker(anyhow::Error),

    // --------------------------------- version manager errors ------------------------------------
    #[error("attribute 'runtimeVersion' requires Node.js version manager '{0}'")]
    VersionManagerNotFound(&'static str),
    #[error("Node.js version '{version}' not installed for '{manager}'")]
    VersionNotInstalled {
        version: String,
        manager: &'static str,
    },

    // --------------------------------- target process errors -------------------------------------
    #[error("attach to process: cannot enable debug mode for process '{pid}' ({source})")]
    DebugModeActivation {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },
    #[error("process pid {0} not found")]
    ProcessNotFound(Pid),
}

impl Error {
    /// Return a hint to a frontend - show error to the user and cancel launch, or propagate it
    /// to the caller as is.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Error::InvalidConfiguration(_) => true,
            Error::NotAProcessId(_) => true,
            Error::Picker(_) => true,
            Error::VersionManagerNotFound(_) => true,
            Error::VersionNotInstalled { .. } => true,
            Error::DebugModeActivation { .. } => true,
            Error::ProcessNotFound(_) => true,

            // propagated errors
            Error::IO(_) => false,
            Error::FromUtf8(_) => false,
            Error::Json(_) => false,
            Error::InvalidVersion(_) => false,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "resolver", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "resolver", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}

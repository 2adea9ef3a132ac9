use crate::resolver::error::Error;
use crate::resolver::protocol::{DebugType, ProtocolSetting};
use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

/// Command tokens that ask a host to pick a process interactively.
pub const PICK_PROCESS_COMMANDS: &[&str] =
    &["${command:PickProcess}", "${command:extension.pickNodeProcess}"];

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Request {
    #[strum(serialize = "launch")]
    Launch,
    #[strum(serialize = "attach")]
    Attach,
}

/// Target process of an attach request, as written by a user.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessId {
    Number(u32),
    String(String),
}

impl ProcessId {
    /// True if the id is a command token for interactive selection.
    pub fn is_pick_command(&self) -> bool {
        match self {
            ProcessId::Number(_) => false,
            ProcessId::String(s) => PICK_PROCESS_COMMANDS.contains(&s.trim()),
        }
    }
}

/// Debug session launch configuration.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub debug_type: Option<DebugType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_executable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ProtocolSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<ProcessId>,
    /// Attributes that are passed to a debug adapter untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LaunchConfiguration {
    /// Take a configuration out of a JSON document. The document is either a single
    /// configuration or a `launch.json` with a `configurations` list, where a configuration
    /// is selected by its name (the first one by default).
    pub fn from_document(document: serde_json::Value, name: Option<&str>) -> Result<Self, Error> {
        let Some(configurations) = document.get("configurations").and_then(|c| c.as_array())
        else {
            return Ok(serde_json::from_value(document)?);
        };

        let selected = match name {
            Some(name) => configurations
                .iter()
                .find(|c| c.get("name").and_then(|n| n.as_str()) == Some(name))
                .ok_or_else(|| {
                    Error::InvalidConfiguration(format!("configuration '{name}' not found"))
                })?,
            None => configurations.first().ok_or_else(|| {
                Error::InvalidConfiguration("launch.json has no configurations".to_string())
            })?,
        };
        Ok(serde_json::from_value(selected.clone())?)
    }

    pub fn is_attach(&self) -> bool {
        self.request == Some(Request::Attach)
    }

    /// Check attribute values before resolution.
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == Some(0) {
            return Err(Error::InvalidConfiguration(
                "attribute 'port' must be a positive number".to_string(),
            ));
        }

        if let Some(ProcessId::String(s)) = &self.process_id {
            if s.trim().is_empty() {
                return Err(Error::InvalidConfiguration(
                    "attribute 'processId' is empty".to_string(),
                ));
            }
        }

        match self.request {
            Some(Request::Launch) if self.process_id.is_some() => {
                warn!(target: "resolver", "attribute 'processId' is ignored by a launch request");
            }
            Some(Request::Attach) if self.runtime_version.is_some() => {
                warn!(target: "resolver", "attribute 'runtimeVersion' has no effect on an attach request");
            }
            _ => {}
        }

        if !self.extra.is_empty() {
            debug!(
                target: "resolver",
                "pass-through attributes: {}",
                self.extra.keys().join(", ")
            );
        }

        Ok(())
    }
}

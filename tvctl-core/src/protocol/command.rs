//! Outbound remote-key command.

use serde::{Deserialize, Serialize};

/// Control method of a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMethod {
    #[serde(rename = "ms.remote.control")]
    RemoteControl,
}

/// What the key press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Click,
}

/// Which remote surface the command emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteType {
    SendRemoteKey,
}

/// `params` member of a remote command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteParams {
    pub cmd: CommandKind,
    /// The remote key, e.g. `KEY_VOLUP`.
    pub data_of_cmd: String,
    pub option: bool,
    pub type_of_remote: RemoteType,
}

/// A single key press sent to the TV.
///
/// ```text
/// { "method": "ms.remote.control",
///   "params": { "Cmd": "Click", "DataOfCmd": <key>, "Option": false,
///               "TypeOfRemote": "SendRemoteKey" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub method: ControlMethod,
    pub params: RemoteParams,
}

impl RemoteCommand {
    /// A click of `key`.
    pub fn click(key: impl Into<String>) -> Self {
        Self {
            method: ControlMethod::RemoteControl,
            params: RemoteParams {
                cmd: CommandKind::Click,
                data_of_cmd: key.into(),
                option: false,
                type_of_remote: RemoteType::SendRemoteKey,
            },
        }
    }

    /// The remote key this command presses.
    pub fn key(&self) -> &str {
        &self.params.data_of_cmd
    }
}

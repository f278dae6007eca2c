use serde::{Deserialize, Serialize};

/// Protocol version (bumped when breaking changes are introduced)
pub const VERSION: u8 = 1;

/// A command sent by a client to a calibration session.
///
/// `data` is opaque here; the session decides which fields each command
/// needs (`jog` wants `{"vector": [x, y, z]}`, the rest want nothing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct CommandRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub command: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl CommandRequest {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self { v: Some(VERSION), id: None, command: command.into(), data: serde_json::Value::Null }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn jog(x: f64, y: f64, z: f64) -> Self {
        Self::new("jog").with_data(serde_json::json!({ "vector": [x, y, z] }))
    }
}

/// Reply to a [`CommandRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResponse {
    Ok(CommandOk),
    Error(CommandError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct CommandOk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Session state after the command, e.g. `measuringNozzleOffset`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct CommandError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// snake_case error kind, e.g. `illegal_transition`
    pub kind: String,
    pub message: String,
    /// State the session is still in; absent when no session was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl CommandResponse {
    pub fn ok<S: Into<String>>(state: S, warnings: Vec<String>, reply_to: Option<String>) -> Self {
        CommandResponse::Ok(CommandOk { v: Some(VERSION), reply_to, state: state.into(), warnings })
    }

    pub fn error<K: Into<String>, M: Into<String>>(
        kind: K,
        message: M,
        state: Option<String>,
        reply_to: Option<String>,
    ) -> Self {
        CommandResponse::Error(CommandError {
            v: Some(VERSION),
            reply_to,
            kind: kind.into(),
            message: message.into(),
            state,
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CommandResponse::Ok(_))
    }

    /// State name carried by the response, if any.
    pub fn state(&self) -> Option<&str> {
        match self {
            CommandResponse::Ok(ok) => Some(&ok.state),
            CommandResponse::Error(err) => err.state.as_deref(),
        }
    }
}

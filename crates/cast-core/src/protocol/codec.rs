//! JSON codec for control-channel payloads.
//!
//! One JSON object per message, no envelope, no length prefix; the transport
//! frames messages.  Decoding never panics: anything that is not exactly a
//! valid [`RemoteControlCommand`] becomes a [`CommandError`], which callers
//! log and drop.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::command::RemoteControlCommand;

/// Why a payload could not be encoded or decoded as a command.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    /// Not JSON, not an object, unknown `type`, or a field missing or of the
    /// wrong type or value.
    #[error("invalid command: {0}")]
    Malformed(String),

    /// A binary payload that is not valid UTF-8 text.
    #[error("invalid command: payload is not UTF-8 text")]
    NotUtf8,

    /// A touch coordinate is NaN or infinite.
    #[error("invalid command: touch coordinate is not a finite number")]
    NonFiniteCoordinate,

    #[error("command encoding failed: {0}")]
    Encode(String),
}

/// A message as delivered by the transport on a control leg.
///
/// Transports may hand over raw text, raw bytes, an already-parsed structured
/// value, or a command object that never left the process.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPayload {
    Text(String),
    Binary(Vec<u8>),
    Json(Value),
    Command(RemoteControlCommand),
}

impl From<RemoteControlCommand> for ControlPayload {
    fn from(cmd: RemoteControlCommand) -> Self {
        ControlPayload::Command(cmd)
    }
}

/// Encodes a command as its wire JSON text.
///
/// # Errors
///
/// [`CommandError::NonFiniteCoordinate`] if a touch coordinate is not finite
/// (JSON cannot represent it).
pub fn serialize_command(cmd: &RemoteControlCommand) -> Result<String, CommandError> {
    if !cmd.is_well_formed() {
        return Err(CommandError::NonFiniteCoordinate);
    }
    serde_json::to_string(cmd).map_err(|e| CommandError::Encode(e.to_string()))
}

/// Decodes wire text into a command.
///
/// # Errors
///
/// [`CommandError::Malformed`] for any text that is not exactly a valid
/// command.
pub fn decode_command(text: &str) -> Result<RemoteControlCommand, CommandError> {
    let cmd: RemoteControlCommand =
        serde_json::from_str(text).map_err(|e| CommandError::Malformed(e.to_string()))?;
    validate(cmd)
}

/// Decodes wire text into a command, or `None` if it is not a valid command.
pub fn deserialize_command(text: &str) -> Option<RemoteControlCommand> {
    decode_command(text).ok()
}

/// Decodes any control payload.
///
/// Text and binary payloads are parsed; a structured value is checked field by
/// field; an in-memory command is passed through after the same field checks.
///
/// # Errors
///
/// See [`CommandError`].
pub fn decode_payload(payload: &ControlPayload) -> Result<RemoteControlCommand, CommandError> {
    match payload {
        ControlPayload::Text(text) => decode_command(text),
        ControlPayload::Binary(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| CommandError::NotUtf8)?;
            decode_command(text)
        }
        ControlPayload::Json(value) => {
            let cmd = RemoteControlCommand::deserialize(value)
                .map_err(|e| CommandError::Malformed(e.to_string()))?;
            validate(cmd)
        }
        ControlPayload::Command(cmd) => validate(cmd.clone()),
    }
}

fn validate(cmd: RemoteControlCommand) -> Result<RemoteControlCommand, CommandError> {
    if cmd.is_well_formed() {
        Ok(cmd)
    } else {
        Err(CommandError::NonFiniteCoordinate)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

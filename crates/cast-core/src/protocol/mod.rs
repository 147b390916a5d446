//! Control-channel protocol: the command model, its JSON codec, and the
//! protocol constants the host uses when injecting commands.

pub mod codec;
pub mod command;
pub mod constants;

pub use codec::{decode_command, decode_payload, deserialize_command, serialize_command, CommandError, ControlPayload};
pub use command::*;
pub use constants::ControlConstants;

//! Remote-control command model.
//!
//! A command is one of exactly two variants, encoded on the wire as a flat JSON
//! object with a `type` discriminator:
//!
//! ```text
//! {"type":"touch","action":"down"|"move"|"up","x":<0..1>,"y":<0..1>,"pointerId":<int>}
//! {"type":"key","key":"back"|"home"|"recents"}
//! ```
//!
//! The serde derives below *are* the validation rules: an unknown `type`, an
//! unknown `action` or `key`, a missing field, or a field of the wrong type all
//! fail deserialization, so there is no way to obtain a partially populated
//! command.  Unknown extra fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// A command sent from a viewer to the host over the control channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteControlCommand {
    Touch(TouchCommand),
    Key(KeyCommand),
}

/// Phase of a touch pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchAction {
    Down,
    Move,
    Up,
}

/// A single-pointer touch event in normalized coordinates.
///
/// `x` and `y` are expected in `[0, 1]` but are not range-checked here; the
/// host's coordinate mapper clamps them when converting to device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchCommand {
    pub action: TouchAction,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "pointerId", deserialize_with = "integral_pointer_id")]
    pub pointer_id: i64,
}

/// Navigation keys the viewer can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKey {
    Back,
    Home,
    Recents,
}

/// A navigation key tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCommand {
    pub key: RemoteKey,
}

impl RemoteControlCommand {
    pub fn touch(action: TouchAction, x: f64, y: f64, pointer_id: i64) -> Self {
        RemoteControlCommand::Touch(TouchCommand {
            action,
            x,
            y,
            pointer_id,
        })
    }

    pub fn key(key: RemoteKey) -> Self {
        RemoteControlCommand::Key(KeyCommand { key })
    }

    /// Field-level checks that serde cannot express: touch coordinates must be
    /// finite numbers.
    pub fn is_well_formed(&self) -> bool {
        match self {
            RemoteControlCommand::Touch(t) => t.x.is_finite() && t.y.is_finite(),
            RemoteControlCommand::Key(_) => true,
        }
    }
}

/// Accepts any JSON number with no fractional part that fits in an `i64`.
///
/// Peers written in languages with a single number type send `3.0` and `3`
/// interchangeably.
fn integral_pointer_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(i) => Ok(i),
        Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            Ok(f as i64)
        }
        Number::Float(f) => Err(serde::de::Error::custom(format!(
            "pointerId must be an integer, got {f}"
        ))),
    }
}

//! Share identifiers.
//!
//! A share identifier is the rendezvous key a host registers under and a
//! viewer types in to join.  The format is fixed: the prefix `SHR` followed by
//! exactly ten characters from `[A-Z0-9]`, for example `SHRK3Z9QA1LMNO`.
//!
//! Generated identifiers combine six random base-36 characters with the last
//! four base-36 characters of the current Unix timestamp in milliseconds, so
//! two hosts starting in the same millisecond still differ in the random part.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fixed prefix of every share identifier.
pub const SHARE_ID_PREFIX: &str = "SHR";

/// Number of characters following [`SHARE_ID_PREFIX`].
pub const SHARE_ID_BODY_LEN: usize = 10;

const RANDOM_LEN: usize = 6;
const TIMESTAMP_LEN: usize = SHARE_ID_BODY_LEN - RANDOM_LEN;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors returned when parsing a share identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareIdError {
    #[error("share id must start with {SHARE_ID_PREFIX}: {0:?}")]
    MissingPrefix(String),
    #[error("share id must have {SHARE_ID_BODY_LEN} characters after the prefix, got {len}")]
    WrongLength { len: usize },
    #[error("share id may only contain A-Z and 0-9: {0:?}")]
    InvalidCharacter(String),
}

/// A validated share identifier.
///
/// Construct one with [`ShareId::generate`] or [`ShareId::parse`]; both
/// guarantee the `SHR` + 10 × `[A-Z0-9]` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareId(String);

impl ShareId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        let mut body = String::with_capacity(SHARE_ID_BODY_LEN);

        let mut random = Uuid::new_v4().as_u128();
        for _ in 0..RANDOM_LEN {
            body.push(BASE36[(random % 36) as usize] as char);
            random /= 36;
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let stamp = to_base36(millis);
        // Left-pad in the (theoretical) case the timestamp is shorter than 4 digits.
        let tail: String = if stamp.len() >= TIMESTAMP_LEN {
            stamp[stamp.len() - TIMESTAMP_LEN..].to_string()
        } else {
            format!("{stamp:0>width$}", width = TIMESTAMP_LEN)
        };
        body.push_str(&tail);

        Self(format!("{SHARE_ID_PREFIX}{body}"))
    }

    /// Parses and validates `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ShareIdError`] describing the first rule the value breaks.
    pub fn parse(value: &str) -> Result<Self, ShareIdError> {
        let body = value
            .strip_prefix(SHARE_ID_PREFIX)
            .ok_or_else(|| ShareIdError::MissingPrefix(value.to_string()))?;
        if body.chars().count() != SHARE_ID_BODY_LEN {
            return Err(ShareIdError::WrongLength {
                len: body.chars().count(),
            });
        }
        if !body.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            return Err(ShareIdError::InvalidCharacter(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` iff `value` is `SHR` followed by exactly ten `[A-Z0-9]` characters.
pub fn is_valid_share_id(value: &str) -> bool {
    ShareId::parse(value).is_ok()
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareId {
    type Err = ShareIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShareId {
    type Error = ShareIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareId> for String {
    fn from(id: ShareId) -> Self {
        id.0
    }
}

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

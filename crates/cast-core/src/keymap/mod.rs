//! Key name translation for the device input backend.
//!
//! The wire protocol names navigation keys `back`, `home` and `recents`.  The
//! Android input backend expects its own key names, so the host translates at
//! the injection boundary.

use crate::protocol::command::RemoteKey;

/// Unified key mapper.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a [`RemoteKey`] to the platform key name passed to
    /// `key_down`/`key_up`.
    pub fn to_platform_name(key: RemoteKey) -> &'static str {
        match key {
            RemoteKey::Back => "Back",
            RemoteKey::Home => "AndroidHome",
            RemoteKey::Recents => "AppSwitch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_names() {
        assert_eq!(KeyMapper::to_platform_name(RemoteKey::Back), "Back");
        assert_eq!(KeyMapper::to_platform_name(RemoteKey::Home), "AndroidHome");
        assert_eq!(KeyMapper::to_platform_name(RemoteKey::Recents), "AppSwitch");
    }
}

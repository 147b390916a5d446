//! Protocol constants used when turning commands into device input.
//!
//! The default values are what existing peers expect and must be kept for
//! interoperability; hosts may override them from configuration.

use std::time::Duration;

use crate::protocol::command::TouchAction;

/// Injection action codes and the synthesized key-tap duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConstants {
    pub touch_down_code: i32,
    pub touch_move_code: i32,
    pub touch_up_code: i32,
    /// Delay between the key-down and key-up of a tap.
    pub key_tap: Duration,
}

impl Default for ControlConstants {
    fn default() -> Self {
        // down → 0, move → 2, up → 1 (not alphabetical).
        Self {
            touch_down_code: 0,
            touch_move_code: 2,
            touch_up_code: 1,
            key_tap: Duration::from_millis(50),
        }
    }
}

impl ControlConstants {
    /// Returns the injection action code for `action`.
    pub fn action_code(&self, action: TouchAction) -> i32 {
        match action {
            TouchAction::Down => self.touch_down_code,
            TouchAction::Move => self.touch_move_code,
            TouchAction::Up => self.touch_up_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_codes_are_down0_move2_up1() {
        let c = ControlConstants::default();
        assert_eq!(c.action_code(TouchAction::Down), 0);
        assert_eq!(c.action_code(TouchAction::Move), 2);
        assert_eq!(c.action_code(TouchAction::Up), 1);
        assert_eq!(c.key_tap, Duration::from_millis(50));
    }
}

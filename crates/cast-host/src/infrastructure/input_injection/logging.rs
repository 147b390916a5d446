//! An input backend that only logs.
//!
//! Useful on machines without an injectable device, e.g. when running the
//! demo on a desktop.

use tracing::info;

use crate::application::dispatch_command::{InjectionError, InputInjector, TouchInjection};

#[derive(Debug, Default)]
pub struct LoggingInjector;

impl LoggingInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LoggingInjector {
    fn inject_touch(&self, touch: TouchInjection) -> Result<(), InjectionError> {
        info!(
            action = touch.action_code,
            pointer = touch.pointer_id,
            x = touch.x,
            y = touch.y,
            pressure = touch.pressure,
            buttons = touch.buttons,
            "inject touch"
        );
        Ok(())
    }

    fn key_down(&self, name: &str) -> Result<(), InjectionError> {
        info!(key = name, "inject key down");
        Ok(())
    }

    fn key_up(&self, name: &str) -> Result<(), InjectionError> {
        info!(key = name, "inject key up");
        Ok(())
    }
}

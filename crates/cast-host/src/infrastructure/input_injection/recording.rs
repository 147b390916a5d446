//! Recording input backend.
//!
//! # Why a recording backend?
//!
//! A real injector moves touches on a physical device, which tests cannot
//! observe.  `RecordingInjector` pushes every event into a `Mutex<Vec<...>>`
//! so integration tests (and the demo's summary) can inspect exactly what was
//! injected and in what order.
//!
//! Set `should_fail = true` to make every call return
//! [`InjectionError::Backend`], for exercising error paths.

use std::sync::{Mutex, MutexGuard};

use crate::application::dispatch_command::{InjectionError, InputInjector, TouchInjection};

/// One injected event.
#[derive(Debug, Clone, PartialEq)]
pub enum InjectedEvent {
    Touch(TouchInjection),
    KeyDown(String),
    KeyUp(String),
}

#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<InjectedEvent>>,
    pub should_fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event injected so far, in order.
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.lock().clone()
    }

    pub fn touches(&self) -> Vec<TouchInjection> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                InjectedEvent::Touch(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InjectedEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Backend("injected failure".to_string()));
        }
        self.lock().push(event);
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn inject_touch(&self, touch: TouchInjection) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Touch(touch))
    }

    fn key_down(&self, name: &str) -> Result<(), InjectionError> {
        self.record(InjectedEvent::KeyDown(name.to_string()))
    }

    fn key_up(&self, name: &str) -> Result<(), InjectionError> {
        self.record(InjectedEvent::KeyUp(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_events_in_order() {
        let injector = RecordingInjector::new();

        injector.key_down("Back").unwrap();
        injector.key_up("Back").unwrap();

        assert_eq!(
            injector.events(),
            vec![
                InjectedEvent::KeyDown("Back".to_string()),
                InjectedEvent::KeyUp("Back".to_string()),
            ]
        );
    }

    #[test]
    fn test_should_fail_returns_error_and_records_nothing() {
        let injector = RecordingInjector {
            should_fail: true,
            ..RecordingInjector::default()
        };

        let result = injector.key_down("Back");

        assert!(matches!(result, Err(InjectionError::Backend(_))));
        assert!(injector.events().is_empty());
    }
}

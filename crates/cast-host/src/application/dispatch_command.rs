//! DispatchCommand: turns a decoded remote-control command into device input.
//!
//! Device geometry and the injector are passed in explicitly through a
//! [`DeviceContext`] on every call; nothing is read from shared state.  The
//! caller supplies a fresh context whenever the device rotates.
//!
//! # Touch
//!
//! The normalized coordinates are mapped to device pixels under the current
//! rotation, the action is translated to its injection code (`down → 0`,
//! `move → 2`, `up → 1` by default), and pressure/buttons are binary: `1`
//! while the pointer is down, `0` on `up`.
//!
//! # Keys
//!
//! A key command is a synthesized tap: key-down now, key-up after
//! [`ControlConstants::key_tap`].  Two taps of the same key inside that window
//! are dispatched independently and may overlap.

use std::sync::Arc;

use cast_core::{
    keymap::KeyMapper, normalized_to_device, ControlConstants, RemoteControlCommand, Rotation,
    TouchAction,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Error type for the device input backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InjectionError {
    #[error("input backend error: {0}")]
    Backend(String),
    #[error("input backend unavailable")]
    Unavailable,
}

/// Error type for command dispatch.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    /// The device context has a zero dimension, so no pixel can be addressed.
    #[error("device geometry unknown: {width}x{height}")]
    NoDeviceGeometry { width: u32, height: u32 },

    #[error(transparent)]
    Injection(#[from] InjectionError),
}

/// One touch event as handed to the input backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInjection {
    pub action_code: i32,
    pub pointer_id: i64,
    pub x: u32,
    pub y: u32,
    pub pressure: f32,
    pub buttons: u32,
}

/// The on-device input-injection backend.
///
/// Infrastructure implementations talk to the OS; test implementations record
/// calls.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    fn inject_touch(&self, touch: TouchInjection) -> Result<(), InjectionError>;

    fn key_down(&self, name: &str) -> Result<(), InjectionError>;

    fn key_up(&self, name: &str) -> Result<(), InjectionError>;
}

/// Device geometry and input backend for one dispatch.
#[derive(Clone)]
pub struct DeviceContext {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub injector: Arc<dyn InputInjector>,
}

impl DeviceContext {
    pub fn new(width: u32, height: u32, rotation: Rotation, injector: Arc<dyn InputInjector>) -> Self {
        Self {
            width,
            height,
            rotation,
            injector,
        }
    }

    /// Returns a copy of this context after the device rotated.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        Self {
            rotation,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

/// What a successful dispatch did.
#[derive(Debug)]
pub enum DispatchOutcome {
    Touch(TouchInjection),
    /// Key-down was injected; `release` completes once key-up has been sent.
    KeyTap {
        key: &'static str,
        release: JoinHandle<()>,
    },
}

/// Dispatches `command` to the device described by `device`.
///
/// Must be called from within a Tokio runtime (key taps schedule their
/// key-up on it).
///
/// # Errors
///
/// [`DispatchError::NoDeviceGeometry`] for a touch when the device has a zero
/// dimension; [`DispatchError::Injection`] if the backend rejects the event.
pub fn dispatch(
    command: &RemoteControlCommand,
    device: &DeviceContext,
    constants: &ControlConstants,
) -> Result<DispatchOutcome, DispatchError> {
    match command {
        RemoteControlCommand::Touch(touch) => {
            if device.width == 0 || device.height == 0 {
                return Err(DispatchError::NoDeviceGeometry {
                    width: device.width,
                    height: device.height,
                });
            }
            let point = normalized_to_device(
                touch.x,
                touch.y,
                device.width,
                device.height,
                device.rotation,
            );
            let pressed = touch.action != TouchAction::Up;
            let injection = TouchInjection {
                action_code: constants.action_code(touch.action),
                pointer_id: touch.pointer_id,
                x: point.x,
                y: point.y,
                pressure: if pressed { 1.0 } else { 0.0 },
                buttons: u32::from(pressed),
            };
            device.injector.inject_touch(injection)?;
            debug!(?injection, "touch injected");
            Ok(DispatchOutcome::Touch(injection))
        }
        RemoteControlCommand::Key(key) => {
            let name = KeyMapper::to_platform_name(key.key);
            device.injector.key_down(name)?;

            let injector = Arc::clone(&device.injector);
            let tap = constants.key_tap;
            let release = tokio::spawn(async move {
                tokio::time::sleep(tap).await;
                if let Err(e) = injector.key_up(name) {
                    error!(key = name, error = %e, "key-up injection failed");
                }
            });
            debug!(key = name, "key tap started");
            Ok(DispatchOutcome::KeyTap { key: name, release })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

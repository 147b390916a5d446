//! Coordinate mapping between a viewer's input surface and the host device.
//!
//! Three coordinate spaces are involved:
//!
//! 1. **Client space** – pixels on the viewer's rendering element, relative to
//!    the page/window, as reported by pointer events.
//! 2. **Normalized space** – `[0, 1] × [0, 1]`, a fraction of the element's
//!    size.  This is what travels on the wire, so viewer and host never need
//!    to agree on resolutions.
//! 3. **Device space** – the host device's native pixel grid after correcting
//!    for the device's current rotation.
//!
//! # Rotation (for beginners)
//!
//! The rotation is a count of clockwise quarter turns applied as a rotation of
//! the coordinate frame.  With `W × H` device pixels:
//!
//! | rotation | device x        | device y        |
//! |----------|-----------------|-----------------|
//! | 0        | `nx · W`        | `ny · H`        |
//! | 1        | `ny · W`        | `(1 − nx) · H`  |
//! | 2        | `(1 − nx) · W`  | `(1 − ny) · H`  |
//! | 3        | `(1 − ny) · W`  | `nx · H`        |
//!
//! The result is rounded to the nearest pixel and clamped to `[0, W] × [0, H]`.

use serde::{Deserialize, Serialize};

/// The on-screen rectangle of the viewer's input element, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// A pointer position as a fraction of the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// The centre of the surface.  Used when a pointer is cancelled without a
    /// known last position.
    pub const CENTER: NormalizedPoint = NormalizedPoint { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A pointer position in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: u32,
    pub y: u32,
}

/// Clockwise rotation of the device's coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Converts a quarter-turn count.  Values outside `0..=3` fall back to
    /// [`Rotation::Deg0`].
    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Returns the quarter-turn count (`0..=3`).
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }
}

/// Maps a client-space pointer position to normalized space.
///
/// The element's top-left is subtracted, the result divided by the element's
/// size, and each axis clamped to `[0, 1]`.  An axis whose size is zero,
/// negative, or not finite maps to `0.0`, as does a non-finite pointer
/// coordinate.
pub fn client_to_normalized(pointer_x: f64, pointer_y: f64, bounds: &ElementBounds) -> NormalizedPoint {
    NormalizedPoint {
        x: normalize_axis(pointer_x, bounds.left, bounds.width),
        y: normalize_axis(pointer_y, bounds.top, bounds.height),
    }
}

fn normalize_axis(pointer: f64, origin: f64, extent: f64) -> f64 {
    if !(extent.is_finite() && extent > 0.0) {
        return 0.0;
    }
    let n = (pointer - origin) / extent;
    if n.is_nan() {
        return 0.0;
    }
    n.clamp(0.0, 1.0)
}

/// Maps a normalized position to device pixels under `rotation`.
///
/// Non-finite inputs are treated as `0.0`.  The output always lies within
/// `[0, device_width] × [0, device_height]`.
pub fn normalized_to_device(
    nx: f64,
    ny: f64,
    device_width: u32,
    device_height: u32,
    rotation: Rotation,
) -> DevicePoint {
    let nx = if nx.is_finite() { nx } else { 0.0 };
    let ny = if ny.is_finite() { ny } else { 0.0 };
    let w = f64::from(device_width);
    let h = f64::from(device_height);

    let (x, y) = match rotation {
        Rotation::Deg0 => (nx * w, ny * h),
        Rotation::Deg90 => (ny * w, (1.0 - nx) * h),
        Rotation::Deg180 => ((1.0 - nx) * w, (1.0 - ny) * h),
        Rotation::Deg270 => ((1.0 - ny) * w, nx * h),
    };

    DevicePoint {
        x: x.round().clamp(0.0, w) as u32,
        y: y.round().clamp(0.0, h) as u32,
    }
}

/// Returns `true` iff both coordinates are finite and within `[0, 1]`.
pub fn is_valid_normalized_coord(x: f64, y: f64) -> bool {
    let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    in_range(x) && in_range(y)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

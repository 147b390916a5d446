//! Pointer-to-command translation for the viewer.
//!
//! The viewer's video element reports pointer events in client pixels.
//! [`TouchController`] normalizes them against the element's bounds and keeps
//! a table of pointers that are currently down, so a `move` or `up` for a
//! pointer that never went down produces nothing.

use std::collections::HashMap;

use cast_core::{
    client_to_normalized, ElementBounds, NormalizedPoint, RemoteControlCommand, RemoteKey,
    TouchAction,
};

/// Tracks active pointers and builds the commands to send for them.
#[derive(Debug, Default)]
pub struct TouchController {
    active: HashMap<i64, NormalizedPoint>,
}

impl TouchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pointer went down.  Always produces a `down` command.
    pub fn pointer_down(
        &mut self,
        pointer_id: i64,
        client_x: f64,
        client_y: f64,
        bounds: &ElementBounds,
    ) -> RemoteControlCommand {
        let at = client_to_normalized(client_x, client_y, bounds);
        self.active.insert(pointer_id, at);
        RemoteControlCommand::touch(TouchAction::Down, at.x, at.y, pointer_id)
    }

    pub fn pointer_move(
        &mut self,
        pointer_id: i64,
        client_x: f64,
        client_y: f64,
        bounds: &ElementBounds,
    ) -> Option<RemoteControlCommand> {
        let last = self.active.get_mut(&pointer_id)?;
        let at = client_to_normalized(client_x, client_y, bounds);
        *last = at;
        Some(RemoteControlCommand::touch(TouchAction::Move, at.x, at.y, pointer_id))
    }

    pub fn pointer_up(
        &mut self,
        pointer_id: i64,
        client_x: f64,
        client_y: f64,
        bounds: &ElementBounds,
    ) -> Option<RemoteControlCommand> {
        self.active.remove(&pointer_id)?;
        let at = client_to_normalized(client_x, client_y, bounds);
        Some(RemoteControlCommand::touch(TouchAction::Up, at.x, at.y, pointer_id))
    }

    /// The platform cancelled a pointer.  The device still needs an `up`, sent
    /// at the last position the pointer was seen.
    pub fn pointer_cancel(&mut self, pointer_id: i64) -> Option<RemoteControlCommand> {
        let last = self.active.remove(&pointer_id)?;
        Some(RemoteControlCommand::touch(TouchAction::Up, last.x, last.y, pointer_id))
    }

    pub fn back(&self) -> RemoteControlCommand {
        RemoteControlCommand::key(RemoteKey::Back)
    }

    pub fn home(&self) -> RemoteControlCommand {
        RemoteControlCommand::key(RemoteKey::Home)
    }

    pub fn recents(&self) -> RemoteControlCommand {
        RemoteControlCommand::key(RemoteKey::Recents)
    }

    pub fn active_pointers(&self) -> usize {
        self.active.len()
    }

    pub fn last_position(&self, pointer_id: i64) -> Option<NormalizedPoint> {
        self.active.get(&pointer_id).copied()
    }

    /// Forgets every active pointer without producing commands.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

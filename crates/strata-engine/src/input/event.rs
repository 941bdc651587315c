use std::time::Duration;

use crate::resources::ResourceId;

/// Keyboard key, by meaning rather than physical position.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Printable key; the first character the layout produces.
    Char(char),
    /// Anything not represented above.
    Unknown,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// What happened. Positions are in physical window pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The user asked to close the window. The window stops after delivery.
    CloseRequested,
    Resized { width: u32, height: u32 },
    Focused(bool),
    PointerMoved { x: f32, y: f32 },
    PointerButton {
        button: MouseButton,
        state: ButtonState,
        x: f32,
        y: f32,
    },
    Key {
        key: Key,
        state: ButtonState,
        repeat: bool,
    },
}

/// Event addressed to a tracked resource.
///
/// Hosts produce these; [`ResourceTracker::dispatch`](crate::resources::ResourceTracker::dispatch)
/// routes them to the resource registered under `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    /// Host timer time at which the event was collected.
    pub timestamp: Duration,
    pub target: ResourceId,
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn new(timestamp: Duration, target: ResourceId, kind: EventKind) -> Self {
        Self {
            timestamp,
            target,
            kind,
        }
    }

    #[inline]
    pub fn is_close_request(&self) -> bool {
        self.kind == EventKind::CloseRequested
    }

    /// `true` for a press of `key` (including repeats).
    pub fn is_key_press(&self, key: Key) -> bool {
        matches!(
            self.kind,
            EventKind::Key { key: k, state: ButtonState::Pressed, .. } if k == key
        )
    }
}

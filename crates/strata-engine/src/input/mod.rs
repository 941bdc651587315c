//! Input events.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Hosts translate platform events into [`EngineEvent`]s addressed to a
//! resource id; the window delivers them to `App::on_event` at the next tick
//! boundary.

mod event;

pub use event::{ButtonState, EngineEvent, EventKind, Key, MouseButton};

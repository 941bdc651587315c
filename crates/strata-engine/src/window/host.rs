use std::collections::VecDeque;
use std::time::Duration;

use crate::input::{EngineEvent, EventKind};
use crate::resources::ResourceId;

/// Platform side of a window: visibility and event collection.
///
/// Presentation lives in the [`Backend`](crate::surface::Backend); a host
/// only owns the native window object, if there is one.
pub trait Host {
    /// Native identifier of the window, when the platform provides one.
    fn native_id(&self) -> Option<ResourceId>;

    fn show(&mut self);

    fn is_visible(&self) -> bool;

    /// Drawable size in physical pixels.
    fn inner_size(&self) -> (u32, u32);

    /// Collects pending platform events, addressed to `target` and stamped
    /// with `now`.
    fn pump_events(&mut self, now: Duration, target: ResourceId, out: &mut Vec<EngineEvent>);

    /// Releases the native window. Idempotent.
    fn close(&mut self);
}

/// Host without a native window.
///
/// Events can be scripted to arrive at given timer times, which lets tests
/// drive the full run loop.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    width: u32,
    height: u32,
    visible: bool,
    closed: bool,
    scripted: VecDeque<(Duration, EventKind)>,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Delivers `kind` at the first pump at or after `at`. Events must be
    /// added in time order.
    pub fn with_event(mut self, at: Duration, kind: EventKind) -> Self {
        self.scripted.push_back((at, kind));
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Host for HeadlessHost {
    fn native_id(&self) -> Option<ResourceId> {
        None
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn inner_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pump_events(&mut self, now: Duration, target: ResourceId, out: &mut Vec<EngineEvent>) {
        if self.closed {
            return;
        }
        while self.scripted.front().is_some_and(|(at, _)| *at <= now) {
            let Some((_, kind)) = self.scripted.pop_front() else {
                break;
            };
            if let EventKind::Resized { width, height } = kind {
                self.width = width;
                self.height = height;
            }
            out.push(EngineEvent::new(now, target, kind));
        }
    }

    fn close(&mut self) {
        self.visible = false;
        self.closed = true;
        self.scripted.clear();
    }
}

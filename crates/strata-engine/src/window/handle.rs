use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::input::EngineEvent;
use crate::resources::{Resource, ResourceId, ResourceType};

/// Cloneable, thread-safe request to stop a window's run loop.
///
/// The loop notices the request at its next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A window's entry in the [`ResourceTracker`](crate::resources::ResourceTracker).
///
/// Accepts events addressed to the window and queues them until the run loop
/// drains them. Destroying it through the tracker stops the window.
pub(crate) struct WindowResource {
    id: ResourceId,
    stop: StopHandle,
    destroyed: AtomicBool,
    queue: Mutex<VecDeque<EngineEvent>>,
}

impl WindowResource {
    pub(crate) fn new(id: ResourceId, stop: StopHandle) -> Arc<Self> {
        Arc::new(Self {
            id,
            stop,
            destroyed: AtomicBool::new(false),
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// Takes every queued event, oldest first.
    pub(crate) fn drain(&self) -> Vec<EngineEvent> {
        self.queue.lock().drain(..).collect()
    }
}

impl Resource for WindowResource {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Window
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            self.stop.request();
            self.queue.lock().clear();
            log::debug!("window {}: destroyed through tracker", self.id);
        }
    }

    fn handle_event(&self, event: &EngineEvent) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.queue.lock().push_back(event.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EventKind;
    use std::time::Duration;

    #[test]
    fn queues_until_drained() {
        let r = WindowResource::new(ResourceId(1), StopHandle::new());
        let e = EngineEvent::new(Duration::ZERO, ResourceId(1), EventKind::Focused(false));
        assert!(r.handle_event(&e));
        assert!(r.handle_event(&e));
        assert_eq!(r.drain().len(), 2);
        assert!(r.drain().is_empty());
    }

    #[test]
    fn destroy_requests_stop_and_refuses_events() {
        let stop = StopHandle::new();
        let r = WindowResource::new(ResourceId(1), stop.clone());
        r.destroy();
        r.destroy();
        assert!(stop.is_requested());
        let e = EngineEvent::new(Duration::ZERO, ResourceId(1), EventKind::CloseRequested);
        assert!(!r.handle_event(&e));
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{EngineError, Result};
use crate::input::EngineEvent;

/// Numeric identifier of a tracked resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceType {
    Window,
    Other(&'static str),
}

/// Capability every tracked object exposes.
///
/// `destroy` takes `&self`: resources are shared through `Arc` and keep their
/// mutable state behind atomics or locks. It must be idempotent.
pub trait Resource: Send + Sync {
    fn resource_id(&self) -> ResourceId;

    fn resource_type(&self) -> ResourceType;

    fn is_destroyed(&self) -> bool;

    fn destroy(&self);

    /// Accepts an event addressed to this resource. Returns `false` if it
    /// was not taken.
    fn handle_event(&self, event: &EngineEvent) -> bool {
        let _ = event;
        false
    }
}

/// Ids handed out by [`ResourceTracker::allocate_id`] start here, above the
/// range hosts use for native window ids.
const SYNTHETIC_ID_BASE: u64 = 1 << 62;

/// Registry mapping resource ids back to their owning objects.
///
/// Constructed explicitly and shared as `Arc<ResourceTracker>` by every
/// window that needs it. All access is serialized by one mutex; resource
/// callbacks (`destroy`, `handle_event`) run with the lock released.
///
/// Invariant: no id maps to more than one live object.
pub struct ResourceTracker {
    entries: Mutex<HashMap<ResourceId, Arc<dyn Resource>>>,
    next_id: AtomicU64,
    torn_down: AtomicBool,
}

impl ResourceTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(SYNTHETIC_ID_BASE),
            torn_down: AtomicBool::new(false),
        })
    }

    /// Fresh id for resources that have no native identifier.
    pub fn allocate_id(&self) -> ResourceId {
        ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `resource` under its id.
    ///
    /// An entry left behind by a destroyed object is replaced; a live one is
    /// an error.
    pub fn register(&self, resource: Arc<dyn Resource>) -> Result<()> {
        if self.torn_down.load(Ordering::Acquire) {
            return Err(EngineError::InvalidState("resource tracker was torn down"));
        }

        let id = resource.resource_id();
        let mut entries = self.entries.lock();
        if entries.get(&id).is_some_and(|existing| !existing.is_destroyed()) {
            return Err(EngineError::DuplicateResource(id));
        }
        entries.insert(id, resource);
        log::debug!("tracker: registered {id}");
        Ok(())
    }

    /// Forgets `resource` if it is the object registered under its id.
    pub fn unregister(&self, resource: &Arc<dyn Resource>) -> bool {
        let id = resource.resource_id();
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some(existing) if same_object(existing, resource) => {
                entries.remove(&id);
                log::debug!("tracker: unregistered {id}");
                true
            }
            _ => false,
        }
    }

    /// Live object registered under `id`.
    pub fn lookup_by_id(&self, id: ResourceId) -> Option<Arc<dyn Resource>> {
        self.entries
            .lock()
            .get(&id)
            .filter(|r| !r.is_destroyed())
            .cloned()
    }

    /// Destroys and forgets the object under `id`. Returns `false` when
    /// nothing was registered; repeated calls are harmless.
    pub fn destroy(&self, id: ResourceId) -> bool {
        let Some(resource) = self.entries.lock().remove(&id) else {
            return false;
        };
        if !resource.is_destroyed() {
            resource.destroy();
        }
        true
    }

    /// Destroys and forgets every registered object.
    pub fn destroy_all(&self) {
        let drained: Vec<_> = self.entries.lock().drain().map(|(_, r)| r).collect();
        if !drained.is_empty() {
            log::debug!("tracker: destroying {} resources", drained.len());
        }
        for resource in drained {
            if !resource.is_destroyed() {
                resource.destroy();
            }
        }
    }

    /// Routes `event` to the resource it targets. Returns whether it was
    /// accepted.
    pub fn dispatch(&self, event: &EngineEvent) -> bool {
        match self.lookup_by_id(event.target) {
            Some(resource) => resource.handle_event(event),
            None => {
                log::warn!("tracker: dropped {:?} for unknown {}", event.kind, event.target);
                false
            }
        }
    }

    /// Destroys everything and refuses further registrations.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
        self.destroy_all();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("len", &self.len())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

fn same_object(a: &Arc<dyn Resource>, b: &Arc<dyn Resource>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

//! Resource registry.
//!
//! Correlates numeric resource ids (a window's native id, or a synthetic one
//! for headless windows) back to the owning object, routes events to it and
//! centralizes destroy-on-shutdown.

mod tracker;

pub use tracker::{Resource, ResourceId, ResourceTracker, ResourceType};

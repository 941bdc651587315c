//! Scene composition.
//!
//! Responsibilities:
//! - own the background, layers and sprite collection of one window
//! - provide deterministic sprite ordering (z-index + collection index)
//! - run the per-frame upload/composite/present pass against a backend

mod compose;
mod order;

pub use compose::Scene;
pub use order::{SortKey, ZIndex};

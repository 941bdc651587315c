//! Strata engine crate.
//!
//! A 2D compositing engine: per-window CPU pixel canvases (background,
//! blended layers, transformed sprites) uploaded to backend surfaces and
//! composed every frame, driven by independent draw and update cadences.

pub mod canvas;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod input;
pub mod logging;
pub mod resources;
pub mod scene;
pub mod surface;
pub mod time;
pub mod window;

pub use error::{EngineError, Result};

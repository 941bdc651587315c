//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the run loop and
//! application code: the [`App`] hooks and the [`FrameCtx`] they receive.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, Sprites};

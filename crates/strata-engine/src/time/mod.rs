//! Time subsystem.
//!
//! Provides the pieces of the dual-rate scheduler, testable without a real
//! clock:
//! - [`Timer`]: time source + blocking sleep (`SystemTimer`, `ManualTimer`)
//! - [`FramePacer`]: drift-corrected sleeping on a coarse primitive
//! - [`Cadence`]: one fixed-rate schedule (draw or update) with its own pacer
//!   and [`FrameClock`]

mod cadence;
mod frame_clock;
mod pacer;
mod timer;

pub use cadence::{Cadence, PacingConfig};
pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::FramePacer;
pub use timer::{ManualTimer, SystemTimer, Timer};

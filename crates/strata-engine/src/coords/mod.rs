//! Coordinate and geometry types.
//!
//! Canonical space is the window's logical render resolution:
//! - origin top-left
//! - +X right, +Y down
//! - rotations are in degrees, clockwise on screen
//!
//! Vectors come in two concrete flavours, `Vec2` (f32) for sprite placement
//! and `Point` (i32) for window positions.

mod point;
mod rect;
mod vec2;
mod viewport;

pub use point::Point;
pub use rect::{PixelRegion, Rect};
pub use vec2::Vec2;
pub use viewport::Viewport;

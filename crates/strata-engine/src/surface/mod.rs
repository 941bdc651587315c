//! Presentation backends.
//!
//! A backend owns surfaces (opaque buffers a canvas uploads into) and
//! composes them into the window's frame. Canvases only ever hold a
//! [`SurfaceId`]; the backend owns the memory behind it.
//!
//! Implementations:
//! - [`SoftwareBackend`]: CPU composition, used headless and in tests
//! - `device::GpuBackend`: wgpu textures presented to a window surface

mod backend;
mod blend;
mod draw;
mod software;

pub use backend::{Backend, SurfaceAccess, SurfaceBackend, SurfaceId};
pub use blend::BlendMode;
pub use draw::{CompositeDraw, SpriteDraw};
pub use software::SoftwareBackend;

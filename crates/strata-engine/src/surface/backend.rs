use std::fmt;

use crate::canvas::Pixel;
use crate::coords::Viewport;
use crate::error::Result;

use super::{CompositeDraw, SpriteDraw};

/// Opaque handle to a backend-owned surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// How often a surface is expected to be rewritten from its CPU buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SurfaceAccess {
    /// Fully rewritten every frame (background, layers).
    Streaming,
    /// Uploaded once per content change (sprites).
    Static,
}

/// Surface allocation and upload.
///
/// Canvases and the sprite collection only need this half of a backend.
pub trait SurfaceBackend {
    /// Allocates a `width` x `height` surface.
    fn create_surface(&mut self, width: u32, height: u32, access: SurfaceAccess)
    -> Result<SurfaceId>;

    /// Destroys a surface. Returns `false` if `id` was not live.
    fn destroy_surface(&mut self, id: SurfaceId) -> bool;

    /// Replaces the full contents of a surface. `pixels.len()` must equal
    /// the surface's width times height.
    fn upload(&mut self, id: SurfaceId, pixels: &[Pixel]) -> Result<()>;

    fn surface_size(&self, id: SurfaceId) -> Option<(u32, u32)>;

    /// Number of live surfaces.
    fn live_surfaces(&self) -> usize;

    /// CPU copy of a surface. Backends without readback return `None`.
    fn read_surface(&self, id: SurfaceId) -> Option<Vec<Pixel>>;
}

/// Full presentation backend: surfaces plus one composition pass per frame.
///
/// Call order per frame: `begin_frame`, any number of `composite` /
/// `draw_sprite` in back-to-front order, then `present`.
pub trait Backend: SurfaceBackend {
    /// Logical render resolution that composition targets.
    fn viewport(&self) -> Viewport;

    fn begin_frame(&mut self) -> Result<()>;

    /// Draws a surface over the whole target using its blend mode.
    fn composite(&mut self, draw: &CompositeDraw) -> Result<()>;

    /// Draws a transformed, alpha-blended sprite.
    fn draw_sprite(&mut self, draw: &SpriteDraw) -> Result<()>;

    fn present(&mut self) -> Result<()>;

    /// Physical window size changed. The logical resolution is unaffected.
    fn resize_target(&mut self, width: u32, height: u32);

    /// CPU copy of the last presented frame, at the logical resolution.
    fn read_frame(&self) -> Option<Vec<Pixel>>;

    /// Releases every remaining surface and the presentation context.
    /// Idempotent.
    fn shutdown(&mut self);
}

use crate::error::Result;
use crate::surface::{SurfaceAccess, SurfaceBackend};

use super::Canvas;

/// Full-window base layer.
///
/// Streaming access: the whole buffer is uploaded every frame.
#[derive(Debug)]
pub struct Background {
    canvas: Canvas,
}

impl Background {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height, SurfaceAccess::Streaming)?,
        })
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[inline]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Full upload, whether or not the buffer changed.
    pub fn sync_to_surface<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        self.canvas.sync_to_surface(backend)
    }
}

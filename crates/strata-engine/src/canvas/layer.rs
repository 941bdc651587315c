use crate::error::Result;
use crate::surface::{BlendMode, CompositeDraw, SurfaceAccess, SurfaceBackend};

use super::Canvas;

/// Full-window overlay composited over the background with `blend`.
#[derive(Debug)]
pub struct Layer {
    canvas: Canvas,
    pub blend: BlendMode,
}

impl Layer {
    pub fn new(width: i32, height: i32, blend: BlendMode) -> Result<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height, SurfaceAccess::Streaming)?,
            blend,
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

    /// Uploads the buffer when it changed since the last upload and returns
    /// the draw for this frame. `None` when the clip selects nothing.
    pub(crate) fn prepare<B>(&mut self, backend: &mut B) -> Result<Option<CompositeDraw>>
    where
        B: SurfaceBackend + ?Sized,
    {
        if self.canvas.is_dirty() || self.canvas.surface().is_none() {
            self.canvas.sync_to_surface(backend)?;
        }
        let surface = self.canvas.get_surface(backend)?;
        Ok(self.canvas.source_region().map(|source| CompositeDraw {
            surface,
            source,
            blend: self.blend,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Pixel;
    use crate::surface::SoftwareBackend;

    #[test]
    fn prepare_uploads_only_when_dirty() {
        let mut backend = SoftwareBackend::new(2, 2).unwrap();
        let mut layer = Layer::new(2, 2, BlendMode::Additive).unwrap();
        layer.canvas_mut().fill(Pixel::rgb(1, 2, 3));

        let draw = layer.prepare(&mut backend).unwrap().unwrap();
        assert_eq!(draw.blend, BlendMode::Additive);
        assert!(!layer.canvas().is_dirty());

        // Overwrite the surface behind the layer's back; a clean layer must not re-upload.
        backend.upload(draw.surface, &[Pixel::BLACK; 4]).unwrap();
        layer.prepare(&mut backend).unwrap();
        assert_eq!(backend.read_surface(draw.surface).unwrap()[0], Pixel::BLACK);

        layer.canvas_mut().pixels_mut()[0] = Pixel::WHITE;
        layer.prepare(&mut backend).unwrap();
        assert_eq!(backend.read_surface(draw.surface).unwrap()[0], Pixel::WHITE);
    }
}

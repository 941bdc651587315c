use crate::canvas::{Background, Layer, SpriteCollection};
use crate::error::{EngineError, Result};
use crate::surface::{Backend, BlendMode, CompositeDraw, SurfaceBackend};

/// Everything a window composes: one background, ordered layers, sprites.
///
/// Back-to-front order per frame:
/// 1) background (replaces the target)
/// 2) layers in index order, each with its own blend mode
/// 3) shown sprites by ascending z, ties by collection index
#[derive(Debug)]
pub struct Scene {
    background: Background,
    layers: Vec<Layer>,
    sprites: SpriteCollection,
}

impl Scene {
    /// Creates a scene whose background covers a `width` x `height`
    /// logical resolution.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            background: Background::new(width, height)?,
            layers: Vec::new(),
            sprites: SpriteCollection::new(),
        })
    }

    #[inline]
    pub fn background(&self) -> &Background {
        &self.background
    }

    #[inline]
    pub fn background_mut(&mut self) -> &mut Background {
        &mut self.background
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    #[inline]
    pub fn sprites(&self) -> &SpriteCollection {
        &self.sprites
    }

    #[inline]
    pub fn sprites_mut(&mut self) -> &mut SpriteCollection {
        &mut self.sprites
    }

    /// Allocates a layer with its surface and appends it. Returns its index,
    /// which stays valid for the life of the scene.
    pub fn add_layer<B>(
        &mut self,
        width: i32,
        height: i32,
        blend: BlendMode,
        backend: &mut B,
    ) -> Result<usize>
    where
        B: SurfaceBackend + ?Sized,
    {
        let mut layer = Layer::new(width, height, blend)?;
        layer.canvas_mut().get_surface(backend)?;
        self.layers.push(layer);
        log::debug!("scene: added layer {} ({width}x{height}, {blend:?})", self.layers.len() - 1);
        Ok(self.layers.len() - 1)
    }

    /// Makes sure the background surface exists before the draw hook writes
    /// into the buffer.
    pub(crate) fn begin_draw<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        self.background.canvas_mut().get_surface(backend).map(|_| ())
    }

    /// Uploads and composes one frame, then presents it.
    pub(crate) fn compose(&mut self, backend: &mut dyn Backend) -> Result<()> {
        self.background.sync_to_surface(backend)?;
        self.sprites.ensure_surfaces(backend)?;

        let mut draws = Vec::with_capacity(1 + self.layers.len());
        let background = self.background.canvas();
        if let (Some(surface), Some(source)) = (background.surface(), background.source_region()) {
            draws.push(CompositeDraw {
                surface,
                source,
                blend: BlendMode::None,
            });
        }
        for layer in &mut self.layers {
            if let Some(draw) = layer.prepare(backend)? {
                draws.push(draw);
            }
        }

        backend.begin_frame()?;
        for draw in &draws {
            backend.composite(draw)?;
        }
        for index in self.sprites.draw_order() {
            let Some(sprite) = self.sprites.get(index) else {
                continue;
            };
            let surface = sprite
                .canvas()
                .surface()
                .ok_or(EngineError::InvalidState("sprite without a surface"))?;
            if let Some(draw) = sprite.draw(surface) {
                backend.draw_sprite(&draw)?;
            }
        }
        backend.present()
    }

    /// Destroys every surface the scene owns. Sprites leave the collection.
    pub(crate) fn release<B>(&mut self, backend: &mut B)
    where
        B: SurfaceBackend + ?Sized,
    {
        self.background.canvas_mut().release_surface(backend);
        for layer in &mut self.layers {
            layer.canvas_mut().release_surface(backend);
        }
        self.sprites.clear(backend);
    }
}

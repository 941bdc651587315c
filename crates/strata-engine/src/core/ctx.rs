use crate::canvas::{Background, Canvas, Layer, Sprite, SpriteCollection, SpriteId};
use crate::coords::Viewport;
use crate::error::Result;
use crate::resources::ResourceId;
use crate::scene::Scene;
use crate::surface::{Backend, BlendMode};
use crate::time::FrameTime;
use crate::window::StopHandle;

/// Per-hook context passed to [`App`](super::App) callbacks.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    /// Timing of the current cadence (draw or update).
    pub time: FrameTime,
    window_id: ResourceId,
    scene: &'a mut Scene,
    backend: &'a mut dyn Backend,
    stop: &'a StopHandle,
}

impl<'a> FrameCtx<'a> {
    pub(crate) fn new(
        time: FrameTime,
        window_id: ResourceId,
        scene: &'a mut Scene,
        backend: &'a mut dyn Backend,
        stop: &'a StopHandle,
    ) -> Self {
        Self {
            time,
            window_id,
            scene,
            backend,
            stop,
        }
    }

    #[inline]
    pub fn window_id(&self) -> ResourceId {
        self.window_id
    }

    /// Logical render resolution.
    pub fn viewport(&self) -> Viewport {
        self.backend.viewport()
    }

    /// Read access to the presentation backend, e.g. for surface readback.
    pub fn backend(&self) -> &dyn Backend {
        &*self.backend
    }

    pub fn background(&self) -> &Background {
        self.scene.background()
    }

    /// The background buffer. It is uploaded in full after every draw hook.
    pub fn background_mut(&mut self) -> &mut Canvas {
        self.scene.background_mut().canvas_mut()
    }

    pub fn layers(&self) -> &[Layer] {
        self.scene.layers()
    }

    /// Layer by index. Edits are uploaded at the next composition.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.scene.layer_mut(index)
    }

    /// Allocates and appends a layer. Returns its index.
    pub fn add_layer(&mut self, width: i32, height: i32, blend: BlendMode) -> Result<usize> {
        self.scene.add_layer(width, height, blend, &mut *self.backend)
    }

    pub fn sprites(&self) -> &SpriteCollection {
        self.scene.sprites()
    }

    /// Sprite collection bound to the window's backend.
    pub fn sprites_mut(&mut self) -> Sprites<'_> {
        Sprites::new(self.scene.sprites_mut(), &mut *self.backend)
    }

    /// Stops the window once the current hook returns.
    pub fn stop(&self) {
        self.stop.request();
    }
}

/// [`SpriteCollection`] paired with the backend that owns its surfaces.
pub struct Sprites<'a> {
    collection: &'a mut SpriteCollection,
    backend: &'a mut dyn Backend,
}

impl<'a> Sprites<'a> {
    pub(crate) fn new(collection: &'a mut SpriteCollection, backend: &'a mut dyn Backend) -> Self {
        Self {
            collection,
            backend,
        }
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sprite> {
        self.collection.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sprite> {
        self.collection.get_mut(index)
    }

    pub fn index_of(&self, id: SpriteId) -> Option<usize> {
        self.collection.index_of(id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.collection.iter_mut()
    }

    pub fn add(&mut self, sprite: Sprite) -> Result<usize> {
        self.collection.add(sprite, &mut *self.backend)
    }

    pub fn insert(&mut self, index: usize, sprite: Sprite) -> Result<()> {
        self.collection.insert(index, sprite, &mut *self.backend)
    }

    pub fn set(&mut self, index: usize, sprite: Sprite) -> Result<Sprite> {
        self.collection.set(index, sprite, &mut *self.backend)
    }

    pub fn remove(&mut self, id: SpriteId) -> bool {
        self.collection.remove(id, &mut *self.backend)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Sprite> {
        self.collection.remove_at(index, &mut *self.backend)
    }

    pub fn clear(&mut self) {
        self.collection.clear(&mut *self.backend);
    }

    /// Uploads a sprite's pixels after they were edited.
    pub fn sync(&mut self, index: usize) -> Result<()> {
        self.collection.sync(index, &mut *self.backend)
    }

    pub fn resize_sprite(&mut self, index: usize, width: i32, height: i32) -> Result<()> {
        self.collection
            .resize_sprite(index, width, height, &mut *self.backend)
    }
}

use crate::error::{EngineError, Result};
use crate::scene::SortKey;
use crate::surface::SurfaceBackend;

use super::{Sprite, SpriteId};

/// Ordered sprite container that owns its members' surface lifetimes.
///
/// Invariant: every member has a live surface sized to its canvas, and a
/// sprite's surface is destroyed before the collection lets go of it.
/// Mutations therefore take the backend that owns the surfaces.
///
/// Enumeration follows index order. Z-order is applied at composition time
/// through [`draw_order`](Self::draw_order).
#[derive(Debug, Default)]
pub struct SpriteCollection {
    items: Vec<Sprite>,
}

impl SpriteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Sprite> {
        self.items.get(index)
    }

    /// Mutable access for transform and pixel edits.
    ///
    /// Pixel edits need [`sync`](Self::sync) to become visible. A resize made
    /// through this reference is picked up by `sync` or at the next frame;
    /// [`resize_sprite`](Self::resize_sprite) applies it immediately.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sprite> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.items.iter_mut()
    }

    pub fn index_of(&self, id: SpriteId) -> Option<usize> {
        self.items.iter().position(|s| s.id() == id)
    }

    /// Appends `sprite` after allocating and filling its surface.
    /// Returns its index.
    pub fn add<B>(&mut self, mut sprite: Sprite, backend: &mut B) -> Result<usize>
    where
        B: SurfaceBackend + ?Sized,
    {
        attach(&mut sprite, backend)?;
        self.items.push(sprite);
        Ok(self.items.len() - 1)
    }

    /// Inserts `sprite` at `index` (`index <= len`), shifting later members.
    pub fn insert<B>(&mut self, index: usize, mut sprite: Sprite, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        if index > self.items.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        attach(&mut sprite, backend)?;
        self.items.insert(index, sprite);
        Ok(())
    }

    /// Replaces the sprite at `index` and returns the previous occupant with
    /// its surface released.
    ///
    /// The new surface is allocated first, so a failed allocation leaves the
    /// collection exactly as it was.
    pub fn set<B>(&mut self, index: usize, mut sprite: Sprite, backend: &mut B) -> Result<Sprite>
    where
        B: SurfaceBackend + ?Sized,
    {
        if index >= self.items.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        attach(&mut sprite, backend)?;
        let mut old = std::mem::replace(&mut self.items[index], sprite);
        old.canvas_mut().release_surface(backend);
        Ok(old)
    }

    /// Removes the sprite with `id`. Returns whether it was a member.
    pub fn remove<B>(&mut self, id: SpriteId, backend: &mut B) -> bool
    where
        B: SurfaceBackend + ?Sized,
    {
        match self.index_of(id) {
            Some(index) => {
                self.items[index].canvas_mut().release_surface(backend);
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the sprite at `index`, surface released.
    pub fn remove_at<B>(&mut self, index: usize, backend: &mut B) -> Result<Sprite>
    where
        B: SurfaceBackend + ?Sized,
    {
        if index >= self.items.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items[index].canvas_mut().release_surface(backend);
        Ok(self.items.remove(index))
    }

    /// Releases every surface, then empties the collection.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SurfaceBackend + ?Sized,
    {
        for sprite in &mut self.items {
            sprite.canvas_mut().release_surface(backend);
        }
        self.items.clear();
    }

    /// Uploads the sprite's current pixels to its surface.
    pub fn sync<B>(&mut self, index: usize, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        let len = self.items.len();
        let sprite = self
            .items
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        sprite.canvas_mut().sync_to_surface(backend)
    }

    /// Resizes a member and recreates its surface immediately.
    ///
    /// Invalid dimensions are rejected before anything changes.
    pub fn resize_sprite<B>(
        &mut self,
        index: usize,
        width: i32,
        height: i32,
        backend: &mut B,
    ) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        let len = self.items.len();
        let sprite = self
            .items
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        sprite.canvas_mut().resize(width, height)?;
        sprite.canvas_mut().sync_to_surface(backend)
    }

    /// Re-establishes the surface invariant for members resized through
    /// [`get_mut`](Self::get_mut).
    pub fn ensure_surfaces<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        for sprite in &mut self.items {
            if sprite.canvas().surface().is_none() {
                sprite.canvas_mut().sync_to_surface(backend)?;
            }
        }
        Ok(())
    }

    /// Indices of shown sprites, back to front: ascending z, ties by index.
    pub fn draw_order(&self) -> Vec<usize> {
        let mut keyed: Vec<(SortKey, usize)> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, s)| s.shown)
            .map(|(i, s)| (SortKey::new(s.z_order, i as u32), i))
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, i)| i).collect()
    }
}

/// Allocates the sprite's surface and uploads its pixels. On failure any
/// surface created along the way is destroyed again.
fn attach<B>(sprite: &mut Sprite, backend: &mut B) -> Result<()>
where
    B: SurfaceBackend + ?Sized,
{
    if let Err(e) = sprite.canvas_mut().sync_to_surface(backend) {
        sprite.canvas_mut().release_surface(backend);
        return Err(e);
    }
    Ok(())
}

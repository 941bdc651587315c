use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Vec2;
use crate::error::Result;
use crate::scene::ZIndex;
use crate::surface::{SpriteDraw, SurfaceAccess, SurfaceId};

use super::{Canvas, Pixel};

/// Identity of a sprite, stable across moves within a collection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SpriteId(u64);

static NEXT_SPRITE_ID: AtomicU64 = AtomicU64::new(1);

impl SpriteId {
    fn next() -> Self {
        SpriteId(NEXT_SPRITE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Mirroring applied when a sprite is drawn.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Movable raster object.
///
/// Static access: the surface is uploaded when the sprite joins a
/// [`SpriteCollection`](super::SpriteCollection) and afterwards only when
/// [`SpriteCollection::sync`](super::SpriteCollection::sync) is called.
#[derive(Debug)]
pub struct Sprite {
    id: SpriteId,
    canvas: Canvas,

    pub position: Vec2,
    pub scale: Vec2,
    /// Degrees, clockwise, about the sprite's centre.
    pub rotation: f32,
    pub flip: Flip,
    /// Per-channel multiplier; opaque white leaves colors unchanged.
    pub color_mod: Pixel,
    pub z_order: ZIndex,
    pub shown: bool,
}

impl Sprite {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(Self {
            id: SpriteId::next(),
            canvas: Canvas::new(width, height, SurfaceAccess::Static)?,
            position: Vec2::zero(),
            scale: Vec2::one(),
            rotation: 0.0,
            flip: Flip::None,
            color_mod: Pixel::WHITE,
            z_order: ZIndex::default(),
            shown: true,
        })
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_z_order(mut self, z: i32) -> Self {
        self.z_order = ZIndex::new(z);
        self
    }

    #[inline]
    pub fn id(&self) -> SpriteId {
        self.id
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Pixel edits made through this reference reach the screen after the
    /// owning collection's `sync`.
    #[inline]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Destination size: source region times `|scale|`.
    pub fn draw_size(&self) -> Vec2 {
        let (w, h) = self
            .canvas
            .source_region()
            .map_or((0, 0), |r| (r.width, r.height));
        Vec2::new(w as f32 * self.scale.x.abs(), h as f32 * self.scale.y.abs())
    }

    /// Draw for this frame on `surface`. Negative scale mirrors on that axis.
    pub(crate) fn draw(&self, surface: SurfaceId) -> Option<SpriteDraw> {
        let source = self.canvas.source_region()?;
        let draw = SpriteDraw {
            surface,
            source,
            position: self.position,
            size: self.draw_size(),
            rotation: self.rotation,
            flip_horizontal: (self.flip == Flip::Horizontal) ^ (self.scale.x < 0.0),
            flip_vertical: (self.flip == Flip::Vertical) ^ (self.scale.y < 0.0),
            tint: self.color_mod,
        };
        (!draw.is_degenerate()).then_some(draw)
    }
}

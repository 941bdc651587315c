use crate::canvas::Pixel;
use crate::coords::{PixelRegion, Vec2};

use super::{BlendMode, SurfaceId};

/// Full-frame draw of a background or layer surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CompositeDraw {
    pub surface: SurfaceId,
    /// Region of the surface stretched over the frame.
    pub source: PixelRegion,
    pub blend: BlendMode,
}

/// Transformed draw of a sprite surface.
///
/// The destination is a `size` rectangle whose top-left corner sits at
/// `position` before rotation; rotation turns it about its own centre.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteDraw {
    pub surface: SurfaceId,
    pub source: PixelRegion,
    pub position: Vec2,
    /// Destination size in logical pixels (source size times `|scale|`).
    pub size: Vec2,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub tint: Pixel,
}

impl SpriteDraw {
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0) || !self.size.is_finite()
    }

    /// Destination corners, clockwise from top-left, after rotation.
    pub fn corners(&self) -> [Vec2; 4] {
        let c = self.center();
        let h = self.size * 0.5;
        [
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ]
        .map(|local| c + local.rotated(self.rotation))
    }

    /// Normalized texture coordinates matching [`corners`](Self::corners),
    /// for a surface of `surface_w` x `surface_h`, with flips applied.
    pub fn uv_corners(&self, surface_w: u32, surface_h: u32) -> [[f32; 2]; 4] {
        let sw = surface_w.max(1) as f32;
        let sh = surface_h.max(1) as f32;
        let mut u0 = self.source.x as f32 / sw;
        let mut v0 = self.source.y as f32 / sh;
        let mut u1 = (self.source.x + self.source.width) as f32 / sw;
        let mut v1 = (self.source.y + self.source.height) as f32 / sh;

        if self.flip_horizontal {
            core::mem::swap(&mut u0, &mut u1);
        }
        if self.flip_vertical {
            core::mem::swap(&mut v0, &mut v1);
        }

        [[u0, v0], [u1, v0], [u1, v1], [u0, v1]]
    }

    /// Maps a frame-space point back into the source region.
    ///
    /// Returns the source pixel (surface coordinates) covering `p`, or `None`
    /// when `p` falls outside the sprite.
    pub fn source_texel(&self, p: Vec2) -> Option<(u32, u32)> {
        let local = (p - self.center()).rotated(-self.rotation);
        let mut u = local.x / self.size.x + 0.5;
        let mut v = local.y / self.size.y + 0.5;
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }

        if self.flip_horizontal {
            u = 1.0 - u;
        }
        if self.flip_vertical {
            v = 1.0 - v;
        }

        let sx = ((u * self.source.width as f32) as u32).min(self.source.width - 1);
        let sy = ((v * self.source.height as f32) as u32).min(self.source.height - 1);
        Some((self.source.x + sx, self.source.y + sy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(rotation: f32, flip_horizontal: bool) -> SpriteDraw {
        SpriteDraw {
            surface: SurfaceId(1),
            source: PixelRegion { x: 0, y: 0, width: 4, height: 2 },
            position: Vec2::new(10.0, 10.0),
            size: Vec2::new(4.0, 2.0),
            rotation,
            flip_horizontal,
            flip_vertical: false,
            tint: Pixel::WHITE,
        }
    }

    #[test]
    fn unrotated_maps_pixel_centres() {
        let d = draw(0.0, false);
        assert_eq!(d.source_texel(Vec2::new(10.5, 10.5)), Some((0, 0)));
        assert_eq!(d.source_texel(Vec2::new(13.5, 11.5)), Some((3, 1)));
        assert_eq!(d.source_texel(Vec2::new(14.5, 10.5)), None);
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let d = draw(0.0, true);
        assert_eq!(d.source_texel(Vec2::new(10.5, 10.5)), Some((3, 0)));
    }

    #[test]
    fn half_turn_maps_top_left_to_bottom_right() {
        let d = draw(180.0, false);
        assert_eq!(d.source_texel(Vec2::new(10.5, 10.5)), Some((3, 1)));
    }

    #[test]
    fn corners_rotate_about_centre() {
        let d = draw(90.0, false);
        let [tl, ..] = d.corners();
        // Centre (12, 11); top-left local (-2, -1) turns to (1, -2).
        assert!((tl.x - 13.0).abs() < 1e-4);
        assert!((tl.y - 9.0).abs() < 1e-4);
    }
}

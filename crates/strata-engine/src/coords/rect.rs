use super::Vec2;

/// Axis-aligned rectangle (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

/// Integer pixel region inside a canvas, always non-empty.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    /// A zero-sized clip means "present the whole canvas".
    #[inline]
    pub fn is_zero_size(self) -> bool {
        self.size.x == 0.0 && self.size.y == 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = a.max().x.min(b.max().x);
        let y1 = a.max().y.min(b.max().y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Resolves this clip against a `width` x `height` canvas.
    ///
    /// Zero size selects the whole canvas. Otherwise the rect is snapped
    /// outward to whole pixels and intersected with the canvas; `None` when
    /// nothing of the canvas remains.
    pub fn pixel_region(self, width: u32, height: u32) -> Option<PixelRegion> {
        if width == 0 || height == 0 {
            return None;
        }
        if self.is_zero_size() {
            return Some(PixelRegion { x: 0, y: 0, width, height });
        }

        let bounds = Rect::new(0.0, 0.0, width as f32, height as f32);
        let r = self.intersect(bounds)?;
        let x0 = r.origin.x.floor() as u32;
        let y0 = r.origin.y.floor() as u32;
        let x1 = (r.max().x.ceil() as u32).min(width);
        let y1 = (r.max().y.ceil() as u32).min(height);

        Some(PixelRegion {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_flips_negative_extent() {
        let n = Rect::new(10.0, 10.0, -4.0, -3.0).normalized();
        assert_eq!(n, Rect::new(6.0, 7.0, 4.0, 3.0));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersect(b).is_none());
    }

    #[test]
    fn zero_clip_selects_whole_canvas() {
        let region = Rect::zero().pixel_region(8, 6).unwrap();
        assert_eq!(region, PixelRegion { x: 0, y: 0, width: 8, height: 6 });
    }

    #[test]
    fn clip_is_clamped_to_canvas() {
        let region = Rect::new(2.0, 1.0, 100.0, 2.5).pixel_region(8, 6).unwrap();
        assert_eq!(region, PixelRegion { x: 2, y: 1, width: 6, height: 3 });
    }

    #[test]
    fn clip_outside_canvas_is_none() {
        assert!(Rect::new(20.0, 20.0, 4.0, 4.0).pixel_region(8, 6).is_none());
    }
}

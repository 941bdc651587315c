use crate::coords::{PixelRegion, Rect};
use crate::error::{EngineError, Result};
use crate::surface::{SurfaceAccess, SurfaceBackend, SurfaceId};

use super::Pixel;

/// CPU pixel buffer paired with a lazily allocated backend surface.
///
/// Invariants:
/// - `width > 0`, `height > 0`
/// - `pixels.len() == width * height`, row-major
/// - at most one surface; allocated on first use, recreated after a resize
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
    clip: Rect,
    access: SurfaceAccess,

    surface: Option<SurfaceId>,
    /// The surface no longer matches `width`/`height`.
    surface_stale: bool,
    /// CPU contents changed since the last upload.
    dirty: bool,
}

impl Canvas {
    /// Creates a cleared (transparent) canvas.
    pub fn new(width: i32, height: i32, access: SurfaceAccess) -> Result<Self> {
        let (w, h) = validate_dimensions(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            pixels: vec![Pixel::TRANSPARENT; w as usize * h as usize],
            clip: Rect::zero(),
            access,
            surface: None,
            surface_stale: false,
            dirty: true,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn access(&self) -> SurfaceAccess {
        self.access
    }

    /// Flat index of `(x, y)`. Bounds are the caller's responsibility.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Mutable pixel access. Marks the canvas dirty.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        self.dirty = true;
        &mut self.pixels
    }

    /// Bounds-checked read.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Bounds-checked write. Returns `false` when `(x, y)` is outside.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = self.index(x, y);
        self.pixels_mut()[i] = pixel;
        true
    }

    pub fn fill(&mut self, pixel: Pixel) {
        self.pixels_mut().fill(pixel);
    }

    pub fn clear(&mut self) {
        self.fill(Pixel::TRANSPARENT);
    }

    /// Reallocates the buffer at `width` x `height`.
    ///
    /// Contents are cleared and the surface is recreated before its next use.
    /// Non-positive dimensions are rejected and leave the canvas untouched.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        let (w, h) = validate_dimensions(width, height)?;
        self.width = w;
        self.height = h;
        self.pixels = vec![Pixel::TRANSPARENT; w as usize * h as usize];
        self.surface_stale = self.surface.is_some();
        self.dirty = true;
        Ok(())
    }

    /// Sub-region to present. Zero size presents the whole canvas.
    #[inline]
    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip;
    }

    /// Clip resolved to whole pixels; `None` when it selects nothing.
    #[inline]
    pub fn source_region(&self) -> Option<PixelRegion> {
        self.clip.pixel_region(self.width, self.height)
    }

    /// Current surface handle, if allocated and sized to the buffer.
    #[inline]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface.filter(|_| !self.surface_stale)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the surface, allocating it on first use and recreating it if
    /// the canvas was resized since it was created.
    pub fn get_surface<B>(&mut self, backend: &mut B) -> Result<SurfaceId>
    where
        B: SurfaceBackend + ?Sized,
    {
        if self.surface_stale {
            self.release_surface(backend);
        }
        if let Some(id) = self.surface {
            return Ok(id);
        }

        let id = backend.create_surface(self.width, self.height, self.access)?;
        log::debug!("canvas: allocated {id} ({}x{})", self.width, self.height);
        self.surface = Some(id);
        self.dirty = true;
        Ok(id)
    }

    /// Copies the CPU buffer into the surface.
    pub fn sync_to_surface<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: SurfaceBackend + ?Sized,
    {
        let id = self.get_surface(backend)?;
        backend.upload(id, &self.pixels)?;
        self.dirty = false;
        Ok(())
    }

    /// Destroys the surface, if any. Safe to call repeatedly.
    pub fn release_surface<B>(&mut self, backend: &mut B)
    where
        B: SurfaceBackend + ?Sized,
    {
        if let Some(id) = self.surface.take() {
            backend.destroy_surface(id);
            log::debug!("canvas: released {id}");
        }
        self.surface_stale = false;
        self.dirty = true;
    }
}

fn validate_dimensions(width: i32, height: i32) -> Result<(u32, u32)> {
    if width <= 0 || height <= 0 {
        return Err(EngineError::dimensions(width as i64, height as i64));
    }
    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SoftwareBackend;

    #[test]
    fn resize_reallocates_and_indexes_last_pixel() {
        let mut c = Canvas::new(1, 1, SurfaceAccess::Streaming).unwrap();
        for (w, h) in [(1, 1), (3, 7), (64, 2), (5, 5)] {
            c.resize(w, h).unwrap();
            assert_eq!(c.pixels().len(), (w * h) as usize);
            assert_eq!(c.index(w as u32 - 1, h as u32 - 1), (w * h - 1) as usize);
        }
    }

    #[test]
    fn invalid_resize_keeps_previous_state() {
        let mut c = Canvas::new(4, 3, SurfaceAccess::Streaming).unwrap();
        c.fill(Pixel::WHITE);
        for (w, h) in [(0, 3), (4, 0), (-1, 5), (2, -8)] {
            let err = c.resize(w, h).unwrap_err();
            assert!(matches!(err, EngineError::InvalidDimensions { .. }));
            assert_eq!((c.width(), c.height()), (4, 3));
            assert_eq!(c.pixels().len(), 12);
            assert!(c.pixels().iter().all(|p| *p == Pixel::WHITE));
        }
    }

    #[test]
    fn new_rejects_non_positive() {
        assert!(Canvas::new(0, 1, SurfaceAccess::Static).is_err());
        assert!(Canvas::new(1, -1, SurfaceAccess::Static).is_err());
    }

    #[test]
    fn surface_is_lazy_and_reused() {
        let mut backend = SoftwareBackend::new(4, 4).unwrap();
        let mut c = Canvas::new(2, 2, SurfaceAccess::Streaming).unwrap();
        assert_eq!(c.surface(), None);
        assert_eq!(backend.live_surfaces(), 0);

        let a = c.get_surface(&mut backend).unwrap();
        let b = c.get_surface(&mut backend).unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.live_surfaces(), 1);
    }

    #[test]
    fn resize_recreates_surface_on_next_use() {
        let mut backend = SoftwareBackend::new(4, 4).unwrap();
        let mut c = Canvas::new(2, 2, SurfaceAccess::Streaming).unwrap();
        let old = c.get_surface(&mut backend).unwrap();

        c.resize(3, 5).unwrap();
        assert_eq!(c.surface(), None);

        let new = c.get_surface(&mut backend).unwrap();
        assert_ne!(old, new);
        assert_eq!(backend.surface_size(old), None);
        assert_eq!(backend.surface_size(new), Some((3, 5)));
        assert_eq!(backend.live_surfaces(), 1);
    }

    #[test]
    fn sync_uploads_and_clears_dirty() {
        let mut backend = SoftwareBackend::new(4, 4).unwrap();
        let mut c = Canvas::new(2, 1, SurfaceAccess::Static).unwrap();
        assert!(c.set_pixel(1, 0, Pixel::rgb(9, 8, 7)));
        assert!(!c.set_pixel(2, 0, Pixel::WHITE));
        c.sync_to_surface(&mut backend).unwrap();
        assert!(!c.is_dirty());

        let id = c.surface().unwrap();
        let uploaded = backend.read_surface(id).unwrap();
        assert_eq!(uploaded[1], Pixel::rgb(9, 8, 7));
    }

    #[test]
    fn release_is_idempotent() {
        let mut backend = SoftwareBackend::new(4, 4).unwrap();
        let mut c = Canvas::new(2, 2, SurfaceAccess::Static).unwrap();
        c.get_surface(&mut backend).unwrap();
        c.release_surface(&mut backend);
        c.release_surface(&mut backend);
        assert_eq!(c.surface(), None);
        assert_eq!(backend.live_surfaces(), 0);
    }
}

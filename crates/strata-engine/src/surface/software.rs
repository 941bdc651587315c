use std::collections::HashMap;

use crate::canvas::Pixel;
use crate::coords::{Vec2, Viewport};
use crate::error::{EngineError, Result};

use super::{Backend, BlendMode, CompositeDraw, SpriteDraw, SurfaceAccess, SurfaceBackend, SurfaceId};

struct SoftSurface {
    width: u32,
    height: u32,
    access: SurfaceAccess,
    pixels: Vec<Pixel>,
}

/// CPU implementation of [`Backend`].
///
/// Composes into a frame buffer at the logical resolution with exact 8-bit
/// blend arithmetic and nearest-neighbour sampling. Presented frames and
/// surface contents can be read back, which makes this the backend for
/// headless windows and tests.
pub struct SoftwareBackend {
    width: u32,
    height: u32,
    clear: Pixel,

    surfaces: HashMap<SurfaceId, SoftSurface>,
    next_id: u64,

    target: Vec<Pixel>,
    frame: Vec<Pixel>,
    frame_open: bool,
    frames_presented: u64,
}

impl SoftwareBackend {
    /// Creates a backend composing at `width` x `height`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::dimensions(width as i64, height as i64));
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            clear: Pixel::BLACK,
            surfaces: HashMap::new(),
            next_id: 1,
            target: vec![Pixel::BLACK; len],
            frame: vec![Pixel::BLACK; len],
            frame_open: false,
            frames_presented: 0,
        })
    }

    /// Color the target is cleared to at the start of every frame.
    pub fn set_clear_color(&mut self, clear: Pixel) {
        self.clear = clear;
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Last presented frame, row-major at the logical resolution.
    pub fn frame(&self) -> &[Pixel] {
        &self.frame
    }

    pub fn surface_access(&self, id: SurfaceId) -> Option<SurfaceAccess> {
        self.surfaces.get(&id).map(|s| s.access)
    }

    fn ensure_frame_open(&self) -> Result<()> {
        if self.frame_open {
            Ok(())
        } else {
            Err(EngineError::InvalidState("draw issued outside begin_frame/present"))
        }
    }
}

impl SurfaceBackend for SoftwareBackend {
    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
        access: SurfaceAccess,
    ) -> Result<SurfaceId> {
        if width == 0 || height == 0 {
            return Err(EngineError::dimensions(width as i64, height as i64));
        }

        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(
            id,
            SoftSurface {
                width,
                height,
                access,
                pixels: vec![Pixel::TRANSPARENT; width as usize * height as usize],
            },
        );
        log::trace!("software: created {id} ({width}x{height}, {access:?})");
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) -> bool {
        let existed = self.surfaces.remove(&id).is_some();
        if existed {
            log::trace!("software: destroyed {id}");
        }
        existed
    }

    fn upload(&mut self, id: SurfaceId, pixels: &[Pixel]) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(EngineError::UnknownSurface(id))?;
        if pixels.len() != surface.pixels.len() {
            return Err(EngineError::InvalidArgument(format!(
                "upload of {} pixels into {id} of {}x{}",
                pixels.len(),
                surface.width,
                surface.height
            )));
        }
        surface.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn surface_size(&self, id: SurfaceId) -> Option<(u32, u32)> {
        self.surfaces.get(&id).map(|s| (s.width, s.height))
    }

    fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    fn read_surface(&self, id: SurfaceId) -> Option<Vec<Pixel>> {
        self.surfaces.get(&id).map(|s| s.pixels.clone())
    }
}

impl Backend for SoftwareBackend {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.target.fill(self.clear);
        self.frame_open = true;
        Ok(())
    }

    fn composite(&mut self, draw: &CompositeDraw) -> Result<()> {
        self.ensure_frame_open()?;
        let surface = self
            .surfaces
            .get(&draw.surface)
            .ok_or(EngineError::UnknownSurface(draw.surface))?;

        let src = draw.source;
        let (tw, th) = (self.width as u64, self.height as u64);
        for ty in 0..th {
            let sy = src.y as u64 + ty * src.height as u64 / th;
            let src_row = sy as usize * surface.width as usize;
            let dst_row = ty as usize * self.width as usize;
            for tx in 0..tw {
                let sx = src.x as u64 + tx * src.width as u64 / tw;
                let s = surface.pixels[src_row + sx as usize];
                let d = &mut self.target[dst_row + tx as usize];
                *d = draw.blend.apply(s, *d);
            }
        }
        Ok(())
    }

    fn draw_sprite(&mut self, draw: &SpriteDraw) -> Result<()> {
        self.ensure_frame_open()?;
        let surface = self
            .surfaces
            .get(&draw.surface)
            .ok_or(EngineError::UnknownSurface(draw.surface))?;
        if draw.is_degenerate() {
            return Ok(());
        }

        // Bounding box of the rotated quad, clamped to the frame.
        let corners = draw.corners();
        let (mut min, mut max) = (corners[0], corners[0]);
        for c in &corners[1..] {
            min = Vec2::new(min.x.min(c.x), min.y.min(c.y));
            max = Vec2::new(max.x.max(c.x), max.y.max(c.y));
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);

        for ty in y0..y1 {
            for tx in x0..x1 {
                let centre = Vec2::new(tx as f32 + 0.5, ty as f32 + 0.5);
                let Some((sx, sy)) = draw.source_texel(centre) else { continue };
                let s = surface.pixels[sy as usize * surface.width as usize + sx as usize]
                    .modulate(draw.tint);
                let d = &mut self.target[ty as usize * self.width as usize + tx as usize];
                *d = BlendMode::Alpha.apply(s, *d);
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.ensure_frame_open()?;
        self.frame.copy_from_slice(&self.target);
        self.frame_open = false;
        self.frames_presented += 1;
        Ok(())
    }

    fn resize_target(&mut self, _width: u32, _height: u32) {
        // Composition stays at the logical resolution; nothing to rebuild.
    }

    fn read_frame(&self) -> Option<Vec<Pixel>> {
        Some(self.frame.clone())
    }

    fn shutdown(&mut self) {
        if !self.surfaces.is_empty() {
            log::debug!("software: releasing {} surfaces at shutdown", self.surfaces.len());
        }
        self.surfaces.clear();
        self.frame_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PixelRegion;

    fn whole(w: u32, h: u32) -> PixelRegion {
        PixelRegion { x: 0, y: 0, width: w, height: h }
    }

    #[test]
    fn surface_lifecycle_counts() {
        let mut b = SoftwareBackend::new(4, 4).unwrap();
        let id = b.create_surface(2, 3, SurfaceAccess::Static).unwrap();
        assert_eq!(b.surface_size(id), Some((2, 3)));
        assert_eq!(b.live_surfaces(), 1);
        assert!(b.destroy_surface(id));
        assert!(!b.destroy_surface(id));
        assert_eq!(b.live_surfaces(), 0);
    }

    #[test]
    fn upload_rejects_wrong_length() {
        let mut b = SoftwareBackend::new(4, 4).unwrap();
        let id = b.create_surface(2, 2, SurfaceAccess::Streaming).unwrap();
        assert!(b.upload(id, &[Pixel::WHITE; 3]).is_err());
        assert!(b.upload(id, &[Pixel::WHITE; 4]).is_ok());
    }

    #[test]
    fn composite_stretches_source_over_frame() {
        let mut b = SoftwareBackend::new(4, 4).unwrap();
        let id = b.create_surface(2, 2, SurfaceAccess::Streaming).unwrap();
        let red = Pixel::rgb(255, 0, 0);
        b.upload(id, &[red, Pixel::BLACK, Pixel::BLACK, Pixel::BLACK]).unwrap();

        b.begin_frame().unwrap();
        b.composite(&CompositeDraw { surface: id, source: whole(2, 2), blend: BlendMode::None })
            .unwrap();
        b.present().unwrap();

        let frame = b.frame();
        assert_eq!(frame[0], red);
        assert_eq!(frame[1], red);
        assert_eq!(frame[4], red);
        assert_eq!(frame[2], Pixel::BLACK);
        assert_eq!(b.frames_presented(), 1);
    }

    #[test]
    fn draws_outside_a_frame_are_rejected() {
        let mut b = SoftwareBackend::new(2, 2).unwrap();
        let id = b.create_surface(2, 2, SurfaceAccess::Streaming).unwrap();
        let draw = CompositeDraw { surface: id, source: whole(2, 2), blend: BlendMode::None };
        assert!(matches!(b.composite(&draw), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn sprite_lands_at_position_with_tint() {
        let mut b = SoftwareBackend::new(8, 8).unwrap();
        let id = b.create_surface(2, 2, SurfaceAccess::Static).unwrap();
        b.upload(id, &[Pixel::WHITE; 4]).unwrap();

        b.begin_frame().unwrap();
        b.draw_sprite(&SpriteDraw {
            surface: id,
            source: whole(2, 2),
            position: Vec2::new(3.0, 4.0),
            size: Vec2::new(2.0, 2.0),
            rotation: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            tint: Pixel::rgb(0, 255, 0),
        })
        .unwrap();
        b.present().unwrap();

        let frame = b.frame();
        assert_eq!(frame[4 * 8 + 3], Pixel::rgb(0, 255, 0));
        assert_eq!(frame[5 * 8 + 4], Pixel::rgb(0, 255, 0));
        assert_eq!(frame[4 * 8 + 2], Pixel::BLACK);
        assert_eq!(frame[6 * 8 + 3], Pixel::BLACK);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut b = SoftwareBackend::new(2, 2).unwrap();
        b.create_surface(1, 1, SurfaceAccess::Static).unwrap();
        b.create_surface(1, 1, SurfaceAccess::Streaming).unwrap();
        b.shutdown();
        b.shutdown();
        assert_eq!(b.live_surfaces(), 0);
    }
}

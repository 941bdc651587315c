use bytemuck::{Pod, Zeroable};

/// One 32-bit pixel, stored blue, green, red, alpha.
///
/// The layout matches `wgpu::TextureFormat::Bgra8Unorm`, so a `&[Pixel]`
/// uploads to a surface without conversion.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct Pixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Pixel {
    pub const TRANSPARENT: Pixel = Pixel::rgba(0, 0, 0, 0);
    pub const BLACK: Pixel = Pixel::rgb(0, 0, 0);
    pub const WHITE: Pixel = Pixel::rgb(255, 255, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Multiplies every channel by `tint`, treating 255 as 1.0.
    #[inline]
    pub fn modulate(self, tint: Pixel) -> Pixel {
        Pixel {
            b: mul_u8(self.b, tint.b),
            g: mul_u8(self.g, tint.g),
            r: mul_u8(self.r, tint.r),
            a: mul_u8(self.a, tint.a),
        }
    }

    /// Channels as normalized `[r, g, b, a]`.
    #[inline]
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// `a * b / 255`, rounded.
#[inline]
pub(crate) fn mul_u8(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

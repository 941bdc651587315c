use crate::canvas::Pixel;
use crate::canvas::pixel::mul_u8;

/// Per-pixel rule used when compositing a surface onto the frame.
///
/// Backends map this onto their own encoding (integer arithmetic in
/// [`SoftwareBackend`](super::SoftwareBackend), `wgpu::BlendState` on the GPU)
/// through an explicit table; the discriminants carry no meaning.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Source replaces destination.
    #[default]
    None,
    /// Straight-alpha source-over.
    Alpha,
    /// `dst + src * src_alpha`, saturating per channel. Destination alpha is kept.
    Additive,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::None, BlendMode::Alpha, BlendMode::Additive];

    /// Blends `src` over `dst` with 8-bit integer arithmetic.
    #[inline]
    pub fn apply(self, src: Pixel, dst: Pixel) -> Pixel {
        match self {
            BlendMode::None => src,
            BlendMode::Alpha => {
                let a = src.a as u32;
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
                Pixel {
                    b: mix(src.b, dst.b),
                    g: mix(src.g, dst.g),
                    r: mix(src.r, dst.r),
                    a: (a + (dst.a as u32 * inv + 127) / 255).min(255) as u8,
                }
            }
            BlendMode::Additive => {
                let add = |s: u8, d: u8| d.saturating_add(mul_u8(s, src.a));
                Pixel {
                    b: add(src.b, dst.b),
                    g: add(src.g, dst.g),
                    r: add(src.r, dst.r),
                    a: dst.a,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_replaces() {
        let src = Pixel::rgba(1, 2, 3, 0);
        assert_eq!(BlendMode::None.apply(src, Pixel::WHITE), src);
    }

    #[test]
    fn additive_sums_and_saturates() {
        let dst = Pixel::rgb(50, 200, 0);
        let out = BlendMode::Additive.apply(Pixel::rgb(100, 100, 0), dst);
        assert_eq!(out, Pixel::rgb(150, 255, 0));
    }

    #[test]
    fn additive_scales_by_source_alpha() {
        let out = BlendMode::Additive.apply(Pixel::rgba(200, 0, 0, 0), Pixel::rgb(10, 0, 0));
        assert_eq!(out.r, 10);
    }

    #[test]
    fn alpha_extremes() {
        let dst = Pixel::rgb(0, 0, 255);
        assert_eq!(BlendMode::Alpha.apply(Pixel::rgb(255, 0, 0), dst), Pixel::rgb(255, 0, 0));
        assert_eq!(BlendMode::Alpha.apply(Pixel::TRANSPARENT, dst), dst);
    }

    #[test]
    fn alpha_half_mixes() {
        let out = BlendMode::Alpha.apply(Pixel::rgba(255, 0, 0, 128), Pixel::rgb(0, 0, 0));
        assert_eq!(out.r, 128);
        assert_eq!(out.a, 255);
    }
}

//! Procedural fallback images
//!
//! When an expected image is missing we paint a themed replacement: a
//! diagonal two-color gradient, a faint speck overlay, and a scattering of
//! translucent hearts. Output is a PNG usable anywhere the real asset is.
//! Generation is pure computation and always yields a non-empty payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use rand::Rng;

use crate::error::FallbackError;
use crate::tuning::AssetTuning;

pub type Rgb = [u8; 3];

/// Soft mint
pub const GREEN: Rgb = [0xb8, 0xf1, 0xd6];
/// Sky teal
pub const TEAL: Rgb = [0x7b, 0xdf, 0xf6];
/// Light end of the mint ramp
pub const WHITE: Rgb = [0xff, 0xff, 0xff];
/// Light end of the teal ramp
pub const FOAM: Rgb = [0xe6, 0xff, 0xf9];
/// Heart fill
pub const HEART: Rgb = [0xff, 0x50, 0x78];

/// 1×1 PNG used if encoding ever fails
const EMERGENCY_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// A synthesized, encoded raster image
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedImage {
    pub width: u32,
    pub height: u32,
    /// PNG bytes
    pub png: Vec<u8>,
}

impl SynthesizedImage {
    /// `data:` URL usable as an `<img>` source or CSS background
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

/// Linear interpolation between two colors
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Gradient endpoints for background variant `t` in [0, 1]
pub fn variant_palette(t: f32) -> (Rgb, Rgb) {
    (lerp_rgb(GREEN, WHITE, t), lerp_rgb(TEAL, FOAM, t))
}

/// Heart curve test in unit space (y up); the shape spans roughly [-1.2, 1.2] × [-1.0, 1.3]
#[inline]
fn inside_heart(u: f32, v: f32) -> bool {
    let a = u * u + v * v - 1.0;
    a * a * a - u * u * v * v * v <= 0.0
}

fn blend(img: &mut RgbaImage, x: u32, y: u32, color: Rgb, alpha: f32) {
    let px = img.get_pixel_mut(x, y);
    let Rgba([r, g, b, a]) = *px;
    let mix = |d: u8, s: u8| (d as f32 * (1.0 - alpha) + s as f32 * alpha).round() as u8;
    let out_a = (a as f32 + (255.0 - a as f32) * alpha).round() as u8;
    *px = Rgba([mix(r, color[0]), mix(g, color[1]), mix(b, color[2]), out_a]);
}

/// Paint a heart of `size` px centered at (`cx`, `cy`)
fn paint_heart(img: &mut RgbaImage, cx: f32, cy: f32, size: f32, color: Rgb, alpha: f32) {
    // Unit heart is ~2.4 wide
    let scale = size / 2.4;
    let (w, h) = (img.width() as i64, img.height() as i64);
    let x0 = ((cx - size * 0.5).floor() as i64).clamp(0, w);
    let x1 = ((cx + size * 0.5).ceil() as i64).clamp(0, w);
    let y0 = ((cy - size * 0.55).floor() as i64).clamp(0, h);
    let y1 = ((cy + size * 0.5).ceil() as i64).clamp(0, h);
    for y in y0..y1 {
        for x in x0..x1 {
            let u = (x as f32 + 0.5 - cx) / scale;
            let v = -(y as f32 + 0.5 - cy) / scale;
            if inside_heart(u, v) {
                blend(img, x as u32, y as u32, color, alpha);
            }
        }
    }
}

fn paint_dot(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let x0 = ((cx - radius).floor() as i64).clamp(0, w);
    let x1 = ((cx + radius).ceil() as i64).clamp(0, w);
    let y0 = ((cy - radius).floor() as i64).clamp(0, h);
    let y1 = ((cy + radius).ceil() as i64).clamp(0, h);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                blend(img, x as u32, y as u32, color, alpha);
            }
        }
    }
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, FallbackError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

fn finish(img: RgbaImage) -> SynthesizedImage {
    match encode_png(&img) {
        Ok(png) => SynthesizedImage {
            width: img.width(),
            height: img.height(),
            png,
        },
        Err(e) => {
            log::error!("{}; using emergency placeholder", e);
            SynthesizedImage {
                width: 1,
                height: 1,
                png: STANDARD
                    .decode(EMERGENCY_PNG)
                    .unwrap_or_else(|_| b"\x89PNG\r\n\x1a\n".to_vec()),
            }
        }
    }
}

/// Builds themed replacement images
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    pub width: u32,
    pub height: u32,
    pub hearts: u32,
    pub specks: u32,
    pub sprite_size: u32,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::from_tuning(&AssetTuning::default())
    }
}

impl FallbackGenerator {
    pub fn from_tuning(tuning: &AssetTuning) -> Self {
        Self {
            width: tuning.fallback_width.max(1),
            height: tuning.fallback_height.max(1),
            hearts: tuning.fallback_hearts,
            specks: tuning.fallback_specks,
            sprite_size: tuning.sprite_size.max(1),
        }
    }

    /// Raw background pixels for palette variant `variant` (0 = mint/teal, 1 = near white)
    pub fn paint_background<R: Rng>(&self, variant: f32, rng: &mut R) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        let (c1, c2) = variant_palette(variant);

        // Project onto the top-left → bottom-right diagonal
        let (wf, hf) = (w as f32, h as f32);
        let denom = (wf * wf + hf * hf).max(1.0);
        let mut img = RgbaImage::from_fn(w, h, |x, y| {
            let t = (x as f32 * wf + y as f32 * hf) / denom;
            let [r, g, b] = lerp_rgb(c1, c2, t);
            Rgba([r, g, b, 255])
        });

        for _ in 0..self.specks {
            let cx = rng.random_range(0.0..wf);
            let cy = rng.random_range(0.0..hf);
            let radius = rng.random_range(0.5..2.5);
            paint_dot(&mut img, cx, cy, radius, WHITE, 0.06);
        }

        let short_side = wf.min(hf);
        for _ in 0..self.hearts {
            let cx = rng.random_range(0.0..wf);
            let cy = rng.random_range(0.0..hf);
            let size = rng.random_range(short_side * 0.02..=short_side * 0.08);
            let alpha = rng.random_range(0.15..0.45);
            paint_heart(&mut img, cx, cy, size, HEART, alpha);
        }

        img
    }

    /// Encoded background for palette variant `variant`
    pub fn background<R: Rng>(&self, variant: f32, rng: &mut R) -> SynthesizedImage {
        finish(self.paint_background(variant, rng))
    }

    /// `count` backgrounds spread evenly across the palette ramp
    pub fn backgrounds<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<SynthesizedImage> {
        log::info!("Synthesizing {} fallback backgrounds", count);
        (0..count)
            .map(|i| self.background(variant_at(i, count), rng))
            .collect()
    }

    /// Heart sprite on a transparent square
    pub fn heart_sprite(&self) -> SynthesizedImage {
        let s = self.sprite_size;
        let mut img = RgbaImage::new(s, s);
        let half = s as f32 * 0.5;
        paint_heart(&mut img, half, half, s as f32 * 0.95, HEART, 0.95);
        finish(img)
    }
}

/// Palette position of item `i` out of `count`
pub fn variant_at(i: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        i as f32 / (count - 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn small() -> FallbackGenerator {
        FallbackGenerator {
            width: 120,
            height: 80,
            hearts: 12,
            specks: 20,
            sprite_size: 32,
        }
    }

    #[test]
    fn test_background_is_valid_png() {
        let mut rng = Pcg32::seed_from_u64(7);
        let img = small().background(0.0, &mut rng);
        assert!(!img.is_empty());
        assert_eq!(&img.png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&img.png).unwrap();
        assert_eq!(decoded.width(), 120);
        assert_eq!(decoded.height(), 80);
    }

    #[test]
    fn test_gradient_endpoints_follow_palette() {
        let generator = FallbackGenerator {
            hearts: 0,
            specks: 0,
            ..small()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let img = generator.paint_background(0.0, &mut rng);
        let Rgba([r, g, b, a]) = *img.get_pixel(0, 0);
        assert_eq!([r, g, b], GREEN);
        assert_eq!(a, 255);

        let Rgba([r, _, _, _]) = *img.get_pixel(119, 79);
        // Bottom-right is (almost) pure teal
        assert!((r as i32 - TEAL[0] as i32).abs() <= 2);
    }

    #[test]
    fn test_hearts_tint_the_canvas() {
        let mut rng = Pcg32::seed_from_u64(3);
        let plain = FallbackGenerator {
            hearts: 0,
            specks: 0,
            ..small()
        }
        .paint_background(0.0, &mut rng);
        let mut rng = Pcg32::seed_from_u64(3);
        let hearty = FallbackGenerator {
            hearts: 40,
            specks: 0,
            ..small()
        }
        .paint_background(0.0, &mut rng);
        assert_ne!(plain, hearty);
    }

    #[test]
    fn test_variants_differ() {
        let mut rng = Pcg32::seed_from_u64(11);
        let imgs = small().backgrounds(3, &mut rng);
        assert_eq!(imgs.len(), 3);
        assert!(imgs.iter().all(|i| !i.is_empty()));
        assert_ne!(variant_palette(variant_at(0, 3)), variant_palette(variant_at(2, 3)));
    }

    #[test]
    fn test_heart_sprite_center_opaque_corner_clear() {
        let sprite = small().heart_sprite();
        let decoded = image::load_from_memory(&sprite.png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert!(decoded.get_pixel(16, 16)[3] > 200);
    }

    #[test]
    fn test_data_url_prefix() {
        let sprite = small().heart_sprite();
        assert!(sprite.data_url().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_emergency_png_decodes() {
        let bytes = STANDARD.decode(EMERGENCY_PNG).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_variant_at_single() {
        assert_eq!(variant_at(0, 1), 0.0);
        assert_eq!(variant_at(3, 4), 1.0);
    }
}

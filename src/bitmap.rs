//! Bitmap helpers for crosshair styles
//!
//! Styles are RGBA images whose alpha channel is the crosshair silhouette.
//! Recoloring keeps that alpha mask and swaps in the selected color's RGB.

use crate::color::{Argb, ColorValue};
use image::{Rgba, RgbaImage};
use std::rc::Rc;

/// A bitmap shared between the style catalog and the renderer.
/// Identity (`Rc::ptr_eq`) is what the recompute-on-change rule compares.
pub type SharedBitmap = Rc<RgbaImage>;

/// Side length of color swatches
pub const SWATCH_SIZE: u32 = 16;

/// Side length of the built-in styles
const BUILTIN_SIZE: u32 = 32;

/// Overwrite every pixel of `bitmap` with `color`
pub fn fill_solid(bitmap: &mut RgbaImage, color: Argb) {
    let pixel = Rgba(color.to_rgba());
    for p in bitmap.pixels_mut() {
        *p = pixel;
    }
}

/// Create a small square filled with one color
pub fn swatch(color: ColorValue) -> RgbaImage {
    let mut image = RgbaImage::new(SWATCH_SIZE, SWATCH_SIZE);
    fill_solid(&mut image, color.argb().unwrap_or(Argb::TRANSPARENT));
    image
}

/// Apply `color` to the alpha mask of `source`.
///
/// `ColorValue::Original` returns the very same bitmap, no copy is made.
pub fn recolor(source: &SharedBitmap, color: ColorValue) -> SharedBitmap {
    match color {
        ColorValue::Original => Rc::clone(source),
        ColorValue::Argb(argb) => Rc::new(recolor_image(source, argb)),
    }
}

/// Pixels with alpha 0 become fully transparent, all others keep their
/// alpha and take the red, green and blue channels of `color`.
pub fn recolor_image(source: &RgbaImage, color: Argb) -> RgbaImage {
    let mut output = RgbaImage::new(source.width(), source.height());

    for (src, dst) in source.pixels().zip(output.pixels_mut()) {
        let alpha = src[3];
        if alpha > 0 {
            *dst = Rgba([color.r, color.g, color.b, alpha]);
        }
    }

    output
}

/// Convert to premultiplied BGRA rows, the layout GDI alpha blending expects
pub fn to_premultiplied_bgra(image: &RgbaImage) -> Vec<u8> {
    let mut bgra = Vec::with_capacity((image.width() * image.height() * 4) as usize);
    for pixel in image.pixels() {
        let a = pixel[3] as u32;
        bgra.push(((pixel[2] as u32 * a + 127) / 255) as u8); // B
        bgra.push(((pixel[1] as u32 * a + 127) / 255) as u8); // G
        bgra.push(((pixel[0] as u32 * a + 127) / 255) as u8); // R
        bgra.push(pixel[3]); // A
    }
    bgra
}

/// The two styles shipped with the program, in menu order
pub fn builtin_styles() -> Vec<(&'static str, RgbaImage)> {
    vec![
        ("FreeCrosshair1", draw_cross(BUILTIN_SIZE)),
        ("FreeCrosshair2", draw_ring(BUILTIN_SIZE)),
    ]
}

/// Coverage of a stroke of `half_width` at `distance` from its center line,
/// with a one pixel soft edge
fn coverage(distance: f32, half_width: f32) -> f32 {
    (half_width + 0.5 - distance).clamp(0.0, 1.0)
}

fn alpha(coverage: f32) -> u8 {
    (coverage * 255.0).round() as u8
}

/// Four arms with a gap in the middle and a center dot
fn draw_cross(size: u32) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    let center = size as f32 / 2.0;
    let gap = 4.0;
    let half_width = 1.0;
    let green = Argb::opaque(0x00, 0xFF, 0x00);

    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - center).abs();
            let dy = (y as f32 + 0.5 - center).abs();

            let horizontal = if dx >= gap { coverage(dy, half_width) } else { 0.0 };
            let vertical = if dy >= gap { coverage(dx, half_width) } else { 0.0 };
            let dot = coverage((dx * dx + dy * dy).sqrt(), 1.0);

            let a = alpha(horizontal.max(vertical).max(dot));
            if a > 0 {
                img.put_pixel(x, y, Rgba([green.r, green.g, green.b, a]));
            }
        }
    }

    img
}

/// A circle with a center dot
fn draw_ring(size: u32) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    let center = size as f32 / 2.0;
    let radius = size as f32 / 2.0 - 4.0;
    let red = Argb::opaque(0xFF, 0x00, 0x00);

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let ring = coverage((distance - radius).abs(), 0.75);
            let dot = coverage(distance, 1.0);

            let a = alpha(ring.max(dot));
            if a > 0 {
                img.put_pixel(x, y, Rgba([red.r, red.g, red.b, a]));
            }
        }
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 0]));
        img.put_pixel(2, 0, Rgba([200, 100, 50, 128]));
        img.put_pixel(0, 1, Rgba([1, 2, 3, 1]));
        img
    }

    #[test]
    fn test_fill_solid_overwrites_every_pixel() {
        let mut img = sample();
        fill_solid(&mut img, Argb::new(0x80, 1, 2, 3));
        assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 0x80]));
    }

    #[test]
    fn test_swatch_for_original_is_transparent() {
        let img = swatch(ColorValue::Original);
        assert_eq!(img.dimensions(), (SWATCH_SIZE, SWATCH_SIZE));
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_recolor_preserves_mask() {
        let source = sample();
        let color = Argb::opaque(0x11, 0x22, 0x33);
        let output = recolor_image(&source, color);

        assert_eq!(output.dimensions(), source.dimensions());
        for (src, out) in source.pixels().zip(output.pixels()) {
            assert_eq!(out[3], src[3]);
            if src[3] == 0 {
                assert_eq!(out.0, [0, 0, 0, 0]);
            } else {
                assert_eq!(&out.0[..3], &[0x11, 0x22, 0x33]);
            }
        }
    }

    #[test]
    fn test_recolor_ignores_target_alpha() {
        let output = recolor_image(&sample(), Argb::new(0x00, 9, 9, 9));
        assert_eq!(output.get_pixel(0, 0).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_recolor_original_is_identity() {
        let source: SharedBitmap = Rc::new(sample());
        let output = recolor(&source, ColorValue::Original);
        assert!(Rc::ptr_eq(&source, &output));
    }

    #[test]
    fn test_recolor_allocates_new_bitmap_for_color() {
        let source: SharedBitmap = Rc::new(sample());
        let output = recolor(&source, ColorValue::Argb(Argb::GREEN));
        assert!(!Rc::ptr_eq(&source, &output));
        assert_eq!(source.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_recolor_handles_empty_bitmap() {
        let output = recolor_image(&RgbaImage::new(0, 0), Argb::GREEN);
        assert_eq!(output.dimensions(), (0, 0));
    }

    #[test]
    fn test_premultiplied_bgra() {
        let bgra = to_premultiplied_bgra(&sample());
        assert_eq!(&bgra[0..4], &[30, 20, 10, 255]);
        assert_eq!(&bgra[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bgra[8..12], &[25, 50, 100, 128]);
    }

    #[test]
    fn test_builtin_styles_have_mask_and_transparent_corners() {
        let styles = builtin_styles();
        assert_eq!(styles[0].0, "FreeCrosshair1");
        assert_eq!(styles[1].0, "FreeCrosshair2");

        for (_, img) in &styles {
            assert_eq!(img.dimensions(), (BUILTIN_SIZE, BUILTIN_SIZE));
            assert_eq!(img.get_pixel(0, 0)[3], 0);
            assert!(img.pixels().any(|p| p[3] == 255));
        }
    }
}

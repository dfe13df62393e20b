//! Drawing surfaces.
//!
//! [`Canvas`] is the only thing the petal loop draws through. The hosts use
//! [`PixelCanvas`], a small CPU rasterizer backed by an [`image::RgbaImage`];
//! the window host uploads its pixels to the GPU once per frame and the
//! snapshot host writes them to disk.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::sprite::Sprite;

/// Pixel dimensions of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` if either side is zero (e.g. a minimized window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width and height as floats, for simulation bounds.
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// How a sprite is placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Centre of the sprite in surface pixels.
    pub center: Vec2,
    /// Edge length of the (square) drawn sprite in pixels.
    pub size: f32,
    /// Clockwise rotation in radians (y points down).
    pub rotation: f32,
}

/// A 2D surface the petal loop renders onto.
pub trait Canvas {
    /// Current pixel dimensions.
    fn size(&self) -> SurfaceSize;

    /// Resize the backing buffer. Contents after a resize are unspecified.
    fn resize(&mut self, size: SurfaceSize);

    /// Clear every pixel to transparent.
    fn clear(&mut self);

    /// Draw `sprite` scaled to a `size × size` square centred on
    /// `placement.center` and rotated by `placement.rotation`.
    fn draw_sprite(&mut self, sprite: &Sprite, placement: Placement);
}

/// CPU canvas with straight (non-premultiplied) alpha.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    pixels: RgbaImage,
}

impl PixelCanvas {
    /// Transparent canvas of the given size.
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            pixels: RgbaImage::new(size.width, size.height),
        }
    }

    /// Raw RGBA bytes, row-major, 4 bytes per pixel.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Flatten the canvas over an opaque background colour (sRGB, 0..1).
    pub fn composite_over(&self, background: [f32; 3]) -> RgbaImage {
        let bg = background.map(|c| c.clamp(0.0, 1.0) * 255.0);
        let mut out = RgbaImage::new(self.pixels.width(), self.pixels.height());
        for (dst, src) in out.pixels_mut().zip(self.pixels.pixels()) {
            let a = src[3] as f32 / 255.0;
            let mix = |i: usize| (src[i] as f32 * a + bg[i] * (1.0 - a)).round() as u8;
            *dst = Rgba([mix(0), mix(1), mix(2), 255]);
        }
        out
    }
}

impl Canvas for PixelCanvas {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.pixels.width(), self.pixels.height())
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size != self.size() {
            self.pixels = RgbaImage::new(size.width, size.height);
        }
    }

    fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_sprite(&mut self, sprite: &Sprite, placement: Placement) {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 || !(placement.size > 0.0) {
            return;
        }

        // Conservative bounds: the rotated square never leaves its circumcircle.
        let reach = placement.size * std::f32::consts::FRAC_1_SQRT_2;
        let x0 = (placement.center.x - reach).floor().clamp(0.0, width as f32) as u32;
        let x1 = (placement.center.x + reach).ceil().clamp(0.0, width as f32) as u32;
        let y0 = (placement.center.y - reach).floor().clamp(0.0, height as f32) as u32;
        let y1 = (placement.center.y + reach).ceil().clamp(0.0, height as f32) as u32;

        // Map surface pixels back into sprite UV space.
        let unrotate = Vec2::from_angle(-placement.rotation);
        let inv_size = 1.0 / placement.size;

        for py in y0..y1 {
            for px in x0..x1 {
                let offset = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - placement.center;
                let uv = unrotate.rotate(offset) * inv_size + Vec2::splat(0.5);
                if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
                    continue;
                }
                let src = sprite.sample(uv);
                if src[3] <= 0.0 {
                    continue;
                }
                let dst = self.pixels.get_pixel_mut(px, py);
                *dst = blend_over(src, *dst);
            }
        }
    }
}

/// Source-over blend of a straight-alpha float colour onto a stored pixel.
fn blend_over(src: [f32; 4], dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3];
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let d = dst[i] as f32 / 255.0;
        let c = (src[i] * sa + d * da * (1.0 - sa)) / out_a;
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::FilterMode;

    fn placement(x: f32, y: f32, size: f32, rotation: f32) -> Placement {
        Placement {
            center: Vec2::new(x, y),
            size,
            rotation,
        }
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = PixelCanvas::new(SurfaceSize::new(4, 3));
        assert_eq!(canvas.size(), SurfaceSize::new(4, 3));
        assert_eq!(canvas.as_raw().len(), 4 * 3 * 4);
        assert!(canvas.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_reallocates() {
        let mut canvas = PixelCanvas::new(SurfaceSize::new(800, 600));
        canvas.resize(SurfaceSize::new(400, 300));
        assert_eq!(canvas.size(), SurfaceSize::new(400, 300));
        assert_eq!(canvas.as_raw().len(), 400 * 300 * 4);
    }

    #[test]
    fn test_draw_opaque_sprite_covers_center_only() {
        let sprite = Sprite::solid(255, 0, 0, 255);
        let mut canvas = PixelCanvas::new(SurfaceSize::new(32, 32));

        canvas.draw_sprite(&sprite, placement(16.0, 16.0, 8.0, 0.0));

        assert_eq!(*canvas.pixels().get_pixel(16, 16), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.pixels().get_pixel(12, 12), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.pixels().get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*canvas.pixels().get_pixel(21, 16), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        // Left column red, right column blue.
        let sprite = Sprite::from_rgba(vec![255, 0, 0, 255, 0, 0, 255, 255], 2, 1)
            .unwrap()
            .with_filter(FilterMode::Nearest);
        let mut canvas = PixelCanvas::new(SurfaceSize::new(20, 20));

        // A clockwise quarter turn (y down) moves the left half to the top.
        canvas.draw_sprite(
            &sprite,
            placement(10.0, 10.0, 10.0, std::f32::consts::FRAC_PI_2),
        );

        assert_eq!(*canvas.pixels().get_pixel(10, 6), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.pixels().get_pixel(10, 13), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_offscreen_sprite_is_clipped() {
        let sprite = Sprite::solid(0, 255, 0, 255);
        let mut canvas = PixelCanvas::new(SurfaceSize::new(10, 10));
        canvas.draw_sprite(&sprite, placement(-30.0, -30.0, 20.0, 0.3));
        canvas.draw_sprite(&sprite, placement(5.0, 1e9, 20.0, 0.0));
        assert!(canvas.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clear() {
        let sprite = Sprite::solid(10, 20, 30, 255);
        let mut canvas = PixelCanvas::new(SurfaceSize::new(8, 8));
        canvas.draw_sprite(&sprite, placement(4.0, 4.0, 8.0, 0.0));
        canvas.clear();
        assert!(canvas.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_half_alpha_blend() {
        let sprite = Sprite::solid(255, 255, 255, 128);
        let mut canvas = PixelCanvas::new(SurfaceSize::new(4, 4));
        canvas.draw_sprite(&sprite, placement(2.0, 2.0, 4.0, 0.0));
        let px = canvas.pixels().get_pixel(2, 2);
        assert_eq!(px[0], 255);
        assert!((px[3] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_composite_over_background() {
        let mut canvas = PixelCanvas::new(SurfaceSize::new(2, 1));
        canvas.draw_sprite(&Sprite::solid(255, 255, 255, 255), placement(0.5, 0.5, 1.0, 0.0));
        let flat = canvas.composite_over([0.0, 0.0, 1.0]);
        assert_eq!(*flat.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*flat.get_pixel(1, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_empty_canvas_ignores_draws() {
        let mut canvas = PixelCanvas::new(SurfaceSize::new(0, 0));
        canvas.draw_sprite(&Sprite::solid(1, 2, 3, 255), placement(0.0, 0.0, 5.0, 0.0));
        assert!(canvas.size().is_empty());
    }
}

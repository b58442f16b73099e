use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, Blend};

use crate::error::{Result, TileError};

/// Semi-transparent red used for grid lines
pub const DEFAULT_GRID_COLOR: Rgba<u8> = Rgba([255, 0, 0, 128]);

/// Draw 1px grid lines every `tile_size` pixels on a copy of the image.
///
/// Lines are alpha-blended over the source pixels; the canvas keeps the
/// source dimensions.
pub fn draw_grid_overlay(img: &RgbaImage, tile_size: u32, color: Rgba<u8>) -> Result<RgbaImage> {
    if tile_size == 0 {
        return Err(TileError::ZeroTileSize);
    }

    let (width, height) = img.dimensions();
    let mut canvas = Blend(img.clone());

    if width == 0 || height == 0 {
        return Ok(canvas.0);
    }

    let right = (width - 1) as f32;
    let bottom = (height - 1) as f32;

    for x in (0..width).step_by(tile_size as usize) {
        draw_line_segment_mut(&mut canvas, (x as f32, 0.0), (x as f32, bottom), color);
    }

    for y in (0..height).step_by(tile_size as usize) {
        draw_line_segment_mut(&mut canvas, (0.0, y as f32), (right, y as f32), color);
    }

    Ok(canvas.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Pixel;

    #[test]
    fn test_overlay_keeps_dimensions() {
        let img = RgbaImage::from_pixel(100, 70, Rgba([255, 255, 255, 255]));
        let out = draw_grid_overlay(&img, 32, DEFAULT_GRID_COLOR).unwrap();
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn test_lines_blend_on_multiples() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        let out = draw_grid_overlay(&img, 16, DEFAULT_GRID_COLOR).unwrap();

        let mut expected = Rgba([255, 255, 255, 255]);
        expected.blend(&DEFAULT_GRID_COLOR);

        for x in [0, 16, 32, 48] {
            let line = out.get_pixel(x, 5);
            assert_eq!(*line, expected);
            assert!(line[0] >= 254);
            assert!(line[1] > 0 && line[1] < 255, "green should be blended: {:?}", line);
            assert_eq!(line[3], 255);
        }

        let horizontal = out.get_pixel(5, 48);
        assert!(horizontal[1] < 255);

        assert_eq!(*out.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(63, 63), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_opaque_color_replaces_pixels() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let out = draw_grid_overlay(&img, 5, Rgba([0, 255, 0, 255])).unwrap();
        assert_eq!(*out.get_pixel(5, 9), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(9, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(4, 4), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let img = RgbaImage::new(4, 4);
        assert_eq!(
            draw_grid_overlay(&img, 0, DEFAULT_GRID_COLOR),
            Err(TileError::ZeroTileSize)
        );
    }
}

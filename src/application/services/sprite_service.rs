//! Sprite post-processing - turns a generated portrait into a pixel-art sprite
//!
//! The pipeline is deterministic for fixed constants:
//!
//! 1. Background removal: a flood fill from each of the four corners clears
//!    every 4-connected pixel within [`BACKGROUND_THRESHOLD`] of that corner's
//!    color (sum of absolute RGBA channel differences).
//! 2. Squaring: the image is centered on a transparent `max(w, h)` canvas.
//! 3. Pixelation: nearest-neighbor down to [`PIXEL_GRID_SIZE`], then
//!    nearest-neighbor up to [`SPRITE_SIZE`], so every grid cell becomes a
//!    hard-edged block.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

/// Maximum color distance from a corner seed that still counts as background
pub const BACKGROUND_THRESHOLD: u32 = 10;
/// Resolution of the pixel grid
pub const PIXEL_GRID_SIZE: u32 = 64;
/// Edge length of the final sprite
pub const SPRITE_SIZE: u32 = 256;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no pixels")]
    Empty,
    #[error("Background removal left no visible pixels")]
    NoSubject,
    #[error("Could not encode sprite: {0}")]
    Encode(image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteProcessor {
    pub threshold: u32,
    pub grid_size: u32,
    pub output_size: u32,
}

impl Default for SpriteProcessor {
    fn default() -> Self {
        Self {
            threshold: BACKGROUND_THRESHOLD,
            grid_size: PIXEL_GRID_SIZE,
            output_size: SPRITE_SIZE,
        }
    }
}

impl SpriteProcessor {
    /// Decode raw image bytes and run the full pipeline
    pub fn process(&self, raw: &[u8]) -> Result<RgbaImage, SpriteError> {
        let decoded = image::load_from_memory(raw)?;
        self.process_image(decoded.to_rgba8())
    }

    /// Run the full pipeline on an already decoded bitmap
    pub fn process_image(&self, mut image: RgbaImage) -> Result<RgbaImage, SpriteError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SpriteError::Empty);
        }

        remove_background(&mut image, self.threshold);
        if image.pixels().all(|p| p[3] == 0) {
            return Err(SpriteError::NoSubject);
        }

        let squared = square_canvas(&image);
        let grid = imageops::resize(&squared, self.grid_size, self.grid_size, FilterType::Nearest);
        Ok(imageops::resize(
            &grid,
            self.output_size,
            self.output_size,
            FilterType::Nearest,
        ))
    }

    /// Run the pipeline and encode the sprite as PNG
    pub fn process_to_png(&self, raw: &[u8]) -> Result<Vec<u8>, SpriteError> {
        let sprite = self.process(raw)?;
        let mut png = Vec::new();
        sprite
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(SpriteError::Encode)?;
        Ok(png)
    }
}

/// Clear the background reachable from each of the four corners
pub fn remove_background(image: &mut RgbaImage, threshold: u32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let corners = [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ];
    for (x, y) in corners {
        flood_clear(image, x, y, threshold);
    }
}

fn color_distance(a: &Rgba<u8>, b: &Rgba<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| u32::from(x.abs_diff(*y)))
        .sum()
}

/// Make every pixel connected to `(x, y)` and close to its color transparent
fn flood_clear(image: &mut RgbaImage, x: u32, y: u32, threshold: u32) {
    let seed = *image.get_pixel(x, y);
    // Already cleared by an earlier corner
    if color_distance(&seed, &TRANSPARENT) <= threshold {
        return;
    }

    let (width, height) = image.dimensions();
    let index = |x: u32, y: u32| (y as usize) * (width as usize) + (x as usize);
    let mut visited = vec![false; (width as usize) * (height as usize)];
    let mut stack = vec![(x, y)];
    visited[index(x, y)] = true;

    while let Some((cx, cy)) = stack.pop() {
        image.put_pixel(cx, cy, TRANSPARENT);

        let neighbors = [
            (cx.checked_sub(1), Some(cy)),
            ((cx + 1 < width).then_some(cx + 1), Some(cy)),
            (Some(cx), cy.checked_sub(1)),
            (Some(cx), (cy + 1 < height).then_some(cy + 1)),
        ];
        for (nx, ny) in neighbors {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let i = index(nx, ny);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if color_distance(image.get_pixel(nx, ny), &seed) <= threshold {
                stack.push((nx, ny));
            }
        }
    }
}

/// Center the image on a transparent square canvas.
///
/// Only pixels with non-zero alpha are copied, so cleared background stays
/// exactly transparent.
fn square_canvas(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let side = width.max(height);
    let offset_x = (side - width) / 2;
    let offset_y = (side - height) / 2;

    let mut canvas = RgbaImage::from_pixel(side, side, TRANSPARENT);
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] != 0 {
            canvas.put_pixel(x + offset_x, y + offset_y, *pixel);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([200, 30, 30, 255]);

    /// White canvas with a centered red rectangle covering `fraction` of each side
    fn portrait(width: u32, height: u32, fraction: f32) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(width, height, WHITE);
        let sub_w = (width as f32 * fraction) as u32;
        let sub_h = (height as f32 * fraction) as u32;
        let x0 = (width - sub_w) / 2;
        let y0 = (height - sub_h) / 2;
        for y in y0..y0 + sub_h {
            for x in x0..x0 + sub_w {
                image.put_pixel(x, y, RED);
            }
        }
        image
    }

    fn assert_blocky(sprite: &RgbaImage) {
        let block = SPRITE_SIZE / PIXEL_GRID_SIZE;
        for y in 0..SPRITE_SIZE {
            for x in 0..SPRITE_SIZE {
                let anchor = sprite.get_pixel(x - x % block, y - y % block);
                assert_eq!(sprite.get_pixel(x, y), anchor, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_output_is_fixed_size_for_any_input() {
        let processor = SpriteProcessor::default();

        for (w, h) in [(512, 768), (300, 300), (768, 512), (37, 91)] {
            let sprite = processor.process_image(portrait(w, h, 0.4)).unwrap();
            assert_eq!(sprite.dimensions(), (SPRITE_SIZE, SPRITE_SIZE), "input {}x{}", w, h);
        }
    }

    #[test]
    fn test_background_is_transparent_and_subject_centered() {
        let sprite = SpriteProcessor::default()
            .process_image(portrait(512, 768, 0.4))
            .unwrap();

        for (x, y) in [(0, 0), (255, 0), (0, 255), (255, 255), (10, 128), (128, 10)] {
            assert_eq!(sprite.get_pixel(x, y)[3], 0, "pixel ({}, {})", x, y);
        }
        assert_eq!(*sprite.get_pixel(128, 128), RED);
    }

    #[test]
    fn test_square_canvas_centers_with_floor_offsets() {
        let image = RgbaImage::from_pixel(3, 6, RED);
        let canvas = square_canvas(&image);

        assert_eq!(canvas.dimensions(), (6, 6));
        for y in 0..6 {
            assert_eq!(canvas.get_pixel(0, y)[3], 0);
            assert_eq!(*canvas.get_pixel(1, y), RED);
            assert_eq!(*canvas.get_pixel(3, y), RED);
            assert_eq!(canvas.get_pixel(4, y)[3], 0);
            assert_eq!(canvas.get_pixel(5, y)[3], 0);
        }
    }

    #[test]
    fn test_square_canvas_keeps_cleared_pixels_transparent() {
        let mut image = RgbaImage::from_pixel(4, 2, RED);
        image.put_pixel(0, 0, TRANSPARENT);
        let canvas = square_canvas(&image);

        assert_eq!(*canvas.get_pixel(0, 1), TRANSPARENT);
        assert_eq!(*canvas.get_pixel(1, 1), RED);
        assert_eq!(*canvas.get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_output_is_made_of_hard_blocks() {
        let mut image = portrait(300, 300, 0.5);
        // Diagonal detail so blocks differ from each other
        for i in 50..250 {
            image.put_pixel(i, i, Rgba([10, 200, 10, 255]));
        }
        let sprite = SpriteProcessor::default().process_image(image).unwrap();

        assert_blocky(&sprite);
    }

    #[test]
    fn test_asymmetric_background_is_removed_from_every_corner() {
        let mut image = portrait(200, 200, 0.3);
        // Right half is a different shade that a single top-left seed would miss
        for y in 0..200 {
            for x in 100..200 {
                if *image.get_pixel(x, y) == WHITE {
                    image.put_pixel(x, y, Rgba([180, 180, 220, 255]));
                }
            }
        }

        remove_background(&mut image, BACKGROUND_THRESHOLD);

        assert_eq!(image.get_pixel(5, 100)[3], 0);
        assert_eq!(image.get_pixel(195, 100)[3], 0);
        assert_eq!(*image.get_pixel(100, 100), RED);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut image = RgbaImage::from_pixel(5, 5, WHITE);
        // distance 9 from white: cleared
        image.put_pixel(1, 0, Rgba([252, 252, 252, 255]));
        // distance 12 from white: kept
        image.put_pixel(2, 0, Rgba([251, 251, 251, 255]));

        remove_background(&mut image, BACKGROUND_THRESHOLD);

        assert_eq!(image.get_pixel(1, 0)[3], 0);
        assert_eq!(image.get_pixel(2, 0)[3], 255);
        assert_eq!(image.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_enclosed_background_color_is_kept() {
        let mut image = RgbaImage::from_pixel(9, 9, WHITE);
        for i in 2..=6 {
            for (x, y) in [(i, 2), (i, 6), (2, i), (6, i)] {
                image.put_pixel(x, y, RED);
            }
        }

        remove_background(&mut image, BACKGROUND_THRESHOLD);

        assert_eq!(image.get_pixel(0, 0)[3], 0);
        assert_eq!(*image.get_pixel(4, 4), WHITE);
        assert_eq!(*image.get_pixel(2, 2), RED);
    }

    #[test]
    fn test_all_background_is_no_subject() {
        let image = RgbaImage::from_pixel(64, 64, WHITE);
        let result = SpriteProcessor::default().process_image(image);

        assert!(matches!(result, Err(SpriteError::NoSubject)));
    }

    #[test]
    fn test_empty_and_undecodable_inputs() {
        let processor = SpriteProcessor::default();

        assert!(matches!(
            processor.process_image(RgbaImage::new(0, 0)),
            Err(SpriteError::Empty)
        ));
        assert!(matches!(
            processor.process(b"definitely not an image"),
            Err(SpriteError::Decode(_))
        ));
    }

    #[test]
    fn test_png_round_trip_through_bytes() {
        let mut raw = Vec::new();
        portrait(320, 240, 0.5)
            .write_to(&mut Cursor::new(&mut raw), ImageFormat::Png)
            .unwrap();

        let png = SpriteProcessor::default().process_to_png(&raw).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

        assert_eq!(decoded.dimensions(), (SPRITE_SIZE, SPRITE_SIZE));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert_eq!(decoded.get_pixel(128, 128)[3], 255);
    }
}

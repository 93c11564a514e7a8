//! Procedural textures painted at startup.

use image::{Rgba, RgbaImage};
use rand::Rng;

pub const TEXTURE_SIZE: u32 = 512;

const BRICK_MORTAR: Rgba<u8> = Rgba([0xC8, 0x4C, 0x09, 0xFF]);
const BRICK_FACE: Rgba<u8> = Rgba([0xA0, 0x30, 0x00, 0xFF]);
const BRICK_PITCH: i64 = 64;
const BRICK_WIDTH: i64 = 60;
const BRICK_HEIGHT: i64 = 58;

const GRASS_BASE: Rgba<u8> = Rgba([0x6B, 0xBF, 0x59, 0xFF]);
const GRASS_DARK: Rgba<u8> = Rgba([0x5A, 0xAD, 0x48, 0xFF]);
const GRASS_LIGHT: Rgba<u8> = Rgba([0x7C, 0xCF, 0x6A, 0xFF]);
const GRASS_SPECKLES: usize = 5000;
const GRASS_SPECKLE_SIZE: i64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Brick,
    Grass,
}

impl TextureKind {
    pub const ALL: [TextureKind; 2] = [TextureKind::Brick, TextureKind::Grass];

    pub fn label(self) -> &'static str {
        match self {
            TextureKind::Brick => "Brick Texture",
            TextureKind::Grass => "Grass Texture",
        }
    }

    pub fn generate(self, rng: &mut impl Rng) -> RgbaImage {
        match self {
            TextureKind::Brick => brick_texture(),
            TextureKind::Grass => grass_texture(rng),
        }
    }
}

/// Paints a rectangle, clipping anything outside the image.
fn fill_rect(image: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(image.width() as i64);
    let y1 = (y + h).min(image.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            image.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Running-bond brick wall: 8 courses, odd courses shifted half a brick.
pub fn brick_texture() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, BRICK_MORTAR);
    let courses = TEXTURE_SIZE as i64 / BRICK_PITCH;
    for course in 0..courses {
        let shift = if course % 2 == 0 { 0 } else { BRICK_PITCH / 2 };
        for brick in 0..courses {
            fill_rect(
                &mut image,
                brick * BRICK_PITCH - shift,
                course * BRICK_PITCH,
                BRICK_WIDTH,
                BRICK_HEIGHT,
                BRICK_FACE,
            );
        }
    }
    image
}

/// Flat grass with light and dark speckles scattered at random.
pub fn grass_texture(rng: &mut impl Rng) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, GRASS_BASE);
    for _ in 0..GRASS_SPECKLES {
        let color = if rng.random_bool(0.5) {
            GRASS_DARK
        } else {
            GRASS_LIGHT
        };
        let x = rng.random_range(0..TEXTURE_SIZE) as i64;
        let y = rng.random_range(0..TEXTURE_SIZE) as i64;
        fill_rect(&mut image, x, y, GRASS_SPECKLE_SIZE, GRASS_SPECKLE_SIZE, color);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn brick_courses_are_staggered() {
        let image = brick_texture();
        assert_eq!(image.dimensions(), (TEXTURE_SIZE, TEXTURE_SIZE));
        // Even course: brick starts at x = 0, mortar gap at 60..64.
        assert_eq!(*image.get_pixel(0, 0), BRICK_FACE);
        assert_eq!(*image.get_pixel(61, 10), BRICK_MORTAR);
        // Horizontal mortar between courses.
        assert_eq!(*image.get_pixel(10, 60), BRICK_MORTAR);
        // Odd course is shifted left by half a brick.
        assert_eq!(*image.get_pixel(0, 70), BRICK_FACE);
        assert_eq!(*image.get_pixel(29, 70), BRICK_MORTAR);
        assert_eq!(*image.get_pixel(33, 70), BRICK_FACE);
    }

    #[test]
    fn grass_only_uses_palette_colors() {
        let image = grass_texture(&mut SmallRng::seed_from_u64(1));
        let mut speckled = 0;
        for pixel in image.pixels() {
            assert!([GRASS_BASE, GRASS_DARK, GRASS_LIGHT].contains(pixel));
            if *pixel != GRASS_BASE {
                speckled += 1;
            }
        }
        assert!(speckled > 10_000);
    }

    #[test]
    fn fill_rect_clips_to_image() {
        let mut image = RgbaImage::from_pixel(8, 8, GRASS_BASE);
        fill_rect(&mut image, -2, 6, 4, 4, BRICK_FACE);
        assert_eq!(*image.get_pixel(0, 7), BRICK_FACE);
        assert_eq!(*image.get_pixel(1, 6), BRICK_FACE);
        assert_eq!(*image.get_pixel(2, 6), GRASS_BASE);
        assert_eq!(*image.get_pixel(0, 5), GRASS_BASE);
    }
}

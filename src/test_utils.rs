// SPDX-License-Identifier: MPL-2.0
//! Shared test fixtures: float assertions and small synthetic photos.

pub use approx::assert_abs_diff_eq;

use crate::geometry::Point;
use image_rs::{Rgba, RgbaImage};

/// Tolerance for view-space coordinates that pass through a few affine maps.
pub const VIEW_EPSILON: f32 = 1e-3;

/// Opaque image whose red and green channels encode the pixel position, so
/// any geometric transform can be checked pixel by pixel.
pub fn position_pattern(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255])
    })
}

/// Single-colour opaque image.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Asserts two view-space points agree within [`VIEW_EPSILON`].
#[track_caller]
pub fn assert_point_near(actual: Point, expected: Point) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = VIEW_EPSILON);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = VIEW_EPSILON);
}

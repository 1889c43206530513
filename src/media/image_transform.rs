// SPDX-License-Identifier: MPL-2.0
//! Exact rotate/flip, crop extraction and the rotate-mode session.
//!
//! Quarter-turn rotations and mirrors are pixel permutations, so any sequence
//! that returns to the starting orientation reproduces the source exactly.

use crate::error::{Error, Result};
use crate::geometry::PixelRect;
use crate::media::alloc_rgba;
use image_rs::{imageops, GenericImage, RgbaImage};
use std::sync::Arc;

// ==========================================================================
// Rotation / Flip
// ==========================================================================

/// Clockwise quarter-turn amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Left90,
    Right90,
    Half,
}

impl Rotation {
    /// Maps signed degrees (`-90`, `90`, `180`, `-180`, `270`) onto a rotation.
    #[must_use]
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            90 => Some(Rotation::Right90),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::Left90),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

pub fn rotate(image: &RgbaImage, rotation: Rotation) -> Result<RgbaImage> {
    let (w, h) = image.dimensions();
    let mut out = match rotation {
        Rotation::Right90 | Rotation::Left90 => alloc_rgba(h, w)?,
        Rotation::Half => alloc_rgba(w, h)?,
    };
    match rotation {
        Rotation::Right90 => imageops::rotate90_in(image, &mut out)?,
        Rotation::Left90 => imageops::rotate270_in(image, &mut out)?,
        Rotation::Half => imageops::rotate180_in(image, &mut out)?,
    }
    Ok(out)
}

pub fn flip(image: &RgbaImage, axis: FlipAxis) -> Result<RgbaImage> {
    let mut out = alloc_rgba(image.width(), image.height())?;
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal_in(image, &mut out)?,
        FlipAxis::Vertical => imageops::flip_vertical_in(image, &mut out)?,
    }
    Ok(out)
}

// ==========================================================================
// Crop extraction
// ==========================================================================

/// Copies the pixels of `region` out of `image`.
///
/// The region must already be clipped to the image (see
/// [`crate::canvas::ZoomCanvas::source_region`]); anything outside fails with
/// [`Error::EmptyIntersection`] rather than producing a partial result.
pub fn extract_region(image: &RgbaImage, region: PixelRect) -> Result<RgbaImage> {
    if region.width == 0 || region.height == 0 || !region.fits_within(image.width(), image.height())
    {
        return Err(Error::EmptyIntersection);
    }
    let mut out = alloc_rgba(region.width, region.height)?;
    let view = imageops::crop_imm(image, region.x, region.y, region.width, region.height);
    out.copy_from(&*view, 0, 0)?;
    Ok(out)
}

// ==========================================================================
// Rotate session
// ==========================================================================

/// Rotate-mode state: the backup taken on entry and the working image.
///
/// Every operation replaces the working image with a fresh buffer derived from
/// the previous working image. Consumed exactly once by
/// [`RotateSession::commit`] or [`RotateSession::cancel`].
#[derive(Debug)]
pub struct RotateSession {
    backup: Arc<RgbaImage>,
    current: Arc<RgbaImage>,
}

impl RotateSession {
    #[must_use]
    pub fn begin(current: Arc<RgbaImage>) -> Self {
        Self {
            backup: Arc::clone(&current),
            current,
        }
    }

    #[must_use]
    pub fn current(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.current)
    }

    /// Replaces the working image with a result computed elsewhere.
    pub fn replace(&mut self, next: RgbaImage) {
        self.current = Arc::new(next);
    }

    /// On error the previous working image stays.
    pub fn rotate(&mut self, rotation: Rotation) -> Result<()> {
        let next = rotate(&self.current, rotation)?;
        self.replace(next);
        Ok(())
    }

    pub fn flip(&mut self, axis: FlipAxis) -> Result<()> {
        let next = flip(&self.current, axis)?;
        self.replace(next);
        Ok(())
    }

    /// Whether the working image differs from the backup buffer.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !Arc::ptr_eq(&self.backup, &self.current)
    }

    #[must_use]
    pub fn commit(self) -> Arc<RgbaImage> {
        self.current
    }

    #[must_use]
    pub fn cancel(self) -> Arc<RgbaImage> {
        self.backup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::position_pattern as pattern;

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Left90));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Right90));
        assert_eq!(Rotation::from_degrees(180), Some(Rotation::Half));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let img = pattern(4, 3);
        let rotated = rotate(&img, Rotation::Right90).expect("rotate");
        assert_eq!(rotated.dimensions(), (3, 4));
        // Top-left of the source ends up top-right.
        assert_eq!(rotated.get_pixel(2, 0), img.get_pixel(0, 0));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let img = pattern(7, 5);
        let mut session = RotateSession::begin(Arc::new(img.clone()));
        for _ in 0..4 {
            session.rotate(Rotation::Right90).expect("rotate");
        }
        assert_eq!(*session.commit(), img);
    }

    #[test]
    fn two_half_turns_are_identity() {
        let img = pattern(6, 9);
        let once = rotate(&img, Rotation::Half).expect("rotate");
        assert_ne!(once, img);
        assert_eq!(rotate(&once, Rotation::Half).expect("rotate"), img);
    }

    #[test]
    fn flip_horizontal_mirrors_pixels_left_to_right() {
        let img = pattern(4, 2);
        let flipped = flip(&img, FlipAxis::Horizontal).expect("flip");
        assert_eq!(flipped.get_pixel(0, 0), img.get_pixel(3, 0));
        assert_eq!(flip(&flipped, FlipAxis::Horizontal).expect("flip"), img);
    }

    #[test]
    fn flip_vertical_mirrors_pixels_top_to_bottom() {
        let img = pattern(2, 4);
        let flipped = flip(&img, FlipAxis::Vertical).expect("flip");
        assert_eq!(flipped.get_pixel(1, 0), img.get_pixel(1, 3));
    }

    #[test]
    fn cancel_returns_the_backup() {
        let img = Arc::new(pattern(3, 3));
        let mut session = RotateSession::begin(Arc::clone(&img));
        assert!(!session.has_changes());
        session.flip(FlipAxis::Vertical).expect("flip");
        assert!(session.has_changes());
        assert!(Arc::ptr_eq(&session.cancel(), &img));
    }

    #[test]
    fn extract_copies_region() {
        let img = pattern(10, 8);
        let out = extract_region(&img, PixelRect::new(2, 3, 4, 2)).expect("crop");
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(2, 3));
        assert_eq!(out.get_pixel(3, 1), img.get_pixel(5, 4));
    }

    #[test]
    fn preallocated_outputs_match_imageops() {
        let img = pattern(7, 3);
        assert_eq!(rotate(&img, Rotation::Right90).expect("rotate"), imageops::rotate90(&img));
        assert_eq!(rotate(&img, Rotation::Left90).expect("rotate"), imageops::rotate270(&img));
        assert_eq!(rotate(&img, Rotation::Half).expect("rotate"), imageops::rotate180(&img));
        assert_eq!(
            flip(&img, FlipAxis::Horizontal).expect("flip"),
            imageops::flip_horizontal(&img)
        );
        assert_eq!(flip(&img, FlipAxis::Vertical).expect("flip"), imageops::flip_vertical(&img));
        assert_eq!(
            extract_region(&img, PixelRect::new(1, 1, 5, 2)).expect("crop"),
            imageops::crop_imm(&img, 1, 1, 5, 2).to_image()
        );
    }

    #[test]
    fn extract_outside_image_fails() {
        let img = pattern(10, 8);
        assert!(matches!(
            extract_region(&img, PixelRect::new(8, 0, 4, 4)),
            Err(Error::EmptyIntersection)
        ));
        assert!(matches!(
            extract_region(&img, PixelRect::new(0, 0, 0, 4)),
            Err(Error::EmptyIntersection)
        ));
    }
}

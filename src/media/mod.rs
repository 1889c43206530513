// SPDX-License-Identifier: MPL-2.0
//! Pixel-level processing for the editor.
//!
//! Everything here scales with image resolution and is meant to run through
//! [`worker::PixelWorker`] rather than on the interactive thread.

pub mod adjustment;
pub mod compose;
pub mod export;
pub mod filter;
pub mod image_transform;
pub mod thumbnail;
pub mod worker;

use crate::error::{Error, Result};
use image_rs::RgbaImage;
use std::path::Path;

pub use adjustment::{adjust_brightness_contrast, AdjustSession};
pub use compose::{compose, OverlayItem, Scene, Watermark};
pub use export::{suggested_file_name, DirectorySink, ExportImage, ImageSink, EXPORT_MIME_TYPE};
pub use filter::{apply_filter, to_grayscale, ColorMatrix, FilterKind};
pub use image_transform::{extract_region, flip, rotate, FlipAxis, Rotation, RotateSession};
pub use thumbnail::{ThumbnailCache, ThumbnailStats};
pub use worker::{PendingResult, PixelWorker};

/// Allocates a zeroed RGBA buffer, reporting allocation failure instead of
/// aborting.
pub fn alloc_rgba(width: u32, height: u32) -> Result<RgbaImage> {
    let len = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(Error::ResourceExhaustion { width, height })?;
    let mut pixels: Vec<u8> = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| Error::ResourceExhaustion { width, height })?;
    pixels.resize(len, 0);
    RgbaImage::from_raw(width, height, pixels).ok_or(Error::ResourceExhaustion { width, height })
}

/// Decodes an encoded image (PNG, JPEG) into RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image_rs::load_from_memory(bytes)?;
    Ok(image.to_rgba8())
}

/// Loads and decodes an image file into RGBA.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}

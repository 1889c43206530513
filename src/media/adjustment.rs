// SPDX-License-Identifier: MPL-2.0
//! Brightness/contrast remapping and the adjust-mode session.
//!
//! Every preview is computed from the untouched backup, never from the previous
//! preview, so slider changes are not cumulative.

use crate::domain::editing::{Brightness, Contrast};
use crate::error::Result;
use crate::media::alloc_rgba;
use image_rs::RgbaImage;
use std::sync::Arc;

/// Per-channel lookup table for one brightness/contrast pair.
///
/// `out = clamp(((in - 128) * factor) + 128 + offset, 0, 255)`, truncated
/// toward zero before clamping.
#[must_use]
pub fn build_lut(brightness: Brightness, contrast: Contrast) -> [u8; 256] {
    let offset = brightness.offset();
    let factor = contrast.factor();
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let mapped = ((value as f32 - 128.0) * factor) + 128.0 + offset;
        *slot = (mapped as i32).clamp(0, 255) as u8;
    }
    lut
}

/// Applies brightness and contrast to RGB; alpha is copied unchanged.
pub fn adjust_brightness_contrast(
    source: &RgbaImage,
    brightness: Brightness,
    contrast: Contrast,
) -> Result<RgbaImage> {
    let mut out = alloc_rgba(source.width(), source.height())?;
    let lut = build_lut(brightness, contrast);
    for (dst, src) in out.pixels_mut().zip(source.pixels()) {
        let [r, g, b, a] = src.0;
        dst.0 = [lut[r as usize], lut[g as usize], lut[b as usize], a];
    }
    Ok(out)
}

/// Adjust-mode state: the backup taken on entry, the current slider values and
/// the latest preview.
///
/// Consumed exactly once by [`AdjustSession::commit`] or
/// [`AdjustSession::cancel`]; the backup is released on either path.
#[derive(Debug)]
pub struct AdjustSession {
    backup: Arc<RgbaImage>,
    preview: Arc<RgbaImage>,
    brightness: Brightness,
    contrast: Contrast,
    comparing: bool,
}

impl AdjustSession {
    /// Starts a session on the current image. Sliders start neutral.
    #[must_use]
    pub fn begin(current: Arc<RgbaImage>) -> Self {
        Self {
            preview: Arc::clone(&current),
            backup: current,
            brightness: Brightness::default(),
            contrast: Contrast::default(),
            comparing: false,
        }
    }

    #[must_use]
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    #[must_use]
    pub fn contrast(&self) -> Contrast {
        self.contrast
    }

    /// Source for background preview jobs.
    #[must_use]
    pub fn backup(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.backup)
    }

    /// Records new slider values. Returns whether they changed.
    pub fn set_values(&mut self, brightness: Brightness, contrast: Contrast) -> bool {
        let changed = brightness != self.brightness || contrast != self.contrast;
        self.brightness = brightness;
        self.contrast = contrast;
        changed
    }

    /// Installs a preview computed for `(brightness, contrast)`.
    ///
    /// Results computed for stale values are dropped. Returns whether the
    /// preview was installed.
    pub fn install_preview(
        &mut self,
        brightness: Brightness,
        contrast: Contrast,
        preview: RgbaImage,
    ) -> bool {
        if brightness != self.brightness || contrast != self.contrast {
            log::debug!("dropping stale adjustment preview");
            return false;
        }
        self.preview = Arc::new(preview);
        true
    }

    /// Recomputes the preview on the calling thread.
    pub fn refresh_preview(&mut self) -> Result<()> {
        if self.brightness.is_neutral() && self.contrast.is_neutral() {
            self.preview = Arc::clone(&self.backup);
            return Ok(());
        }
        let preview = adjust_brightness_contrast(&self.backup, self.brightness, self.contrast)?;
        self.preview = Arc::new(preview);
        Ok(())
    }

    /// Press-and-hold compare: while set, [`AdjustSession::displayed`]
    /// returns the backup.
    pub fn set_comparing(&mut self, comparing: bool) {
        self.comparing = comparing;
    }

    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    /// Adjusted image, whether or not the backup is being compared.
    #[must_use]
    pub fn preview(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.preview)
    }

    /// Image to show right now.
    #[must_use]
    pub fn displayed(&self) -> Arc<RgbaImage> {
        if self.comparing {
            Arc::clone(&self.backup)
        } else {
            Arc::clone(&self.preview)
        }
    }

    /// Keeps the preview; the backup is dropped.
    #[must_use]
    pub fn commit(self) -> Arc<RgbaImage> {
        self.preview
    }

    /// Restores the backup; the preview is dropped.
    #[must_use]
    pub fn cancel(self) -> Arc<RgbaImage> {
        self.backup
    }
}

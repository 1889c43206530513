// SPDX-License-Identifier: MPL-2.0
//! Editing newtypes.
//!
//! This module provides type-safe wrappers for editing values,
//! ensuring they are always within valid ranges.

// =============================================================================
// Brightness Bounds
// =============================================================================

/// Brightness bounds (-100 to +100).
pub mod brightness_bounds {
    /// Minimum brightness value.
    pub const MIN: i32 = -100;
    /// Maximum brightness value.
    pub const MAX: i32 = 100;
    /// Default (neutral) brightness value.
    pub const DEFAULT: i32 = 0;
}

// =============================================================================
// Brightness
// =============================================================================

/// Brightness slider value, guaranteed to be within valid range (-100 to +100).
///
/// A value of 0 means no adjustment. The value maps to a per-channel offset of
/// `value / 100 × 255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Brightness(i32);

impl Brightness {
    /// Creates a new brightness value, clamping to the valid range.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value.clamp(brightness_bounds::MIN, brightness_bounds::MAX))
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }

    /// Returns the per-channel offset added after the contrast stretch.
    #[must_use]
    pub fn offset(self) -> f32 {
        self.0 as f32 / 100.0 * 255.0
    }

    /// Returns whether this represents no adjustment (value is 0).
    #[must_use]
    pub fn is_neutral(self) -> bool {
        self.0 == brightness_bounds::DEFAULT
    }
}

// =============================================================================
// Contrast Bounds
// =============================================================================

/// Contrast bounds (-50 to +150).
pub mod contrast_bounds {
    /// Minimum contrast value.
    pub const MIN: i32 = -50;
    /// Maximum contrast value.
    pub const MAX: i32 = 150;
    /// Default (neutral) contrast value.
    pub const DEFAULT: i32 = 0;
}

// =============================================================================
// Contrast
// =============================================================================

/// Contrast slider value, guaranteed to be within valid range (-50 to +150).
///
/// The asymmetric range keeps the contrast factor `(100 + value) / 100` within
/// `[0.5, 2.5]`, so contrast never fully collapses the image to flat gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contrast(i32);

impl Contrast {
    /// Creates a new contrast value, clamping to the valid range.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value.clamp(contrast_bounds::MIN, contrast_bounds::MAX))
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }

    /// Returns the multiplier applied around mid-gray (128).
    #[must_use]
    pub fn factor(self) -> f32 {
        (100 + self.0) as f32 / 100.0
    }

    /// Returns whether this represents no adjustment (value is 0).
    #[must_use]
    pub fn is_neutral(self) -> bool {
        self.0 == contrast_bounds::DEFAULT
    }
}

// =============================================================================
// Text Size
// =============================================================================

/// Text size bounds in sp (12 to 36).
pub mod text_size_bounds {
    pub const MIN: f32 = 12.0;
    pub const MAX: f32 = 36.0;
    pub const DEFAULT: f32 = 18.0;
}

/// Text size in scale-independent pixels, clamped to 12–36 sp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize(f32);

impl TextSize {
    #[must_use]
    pub fn new(sp: f32) -> Self {
        Self(sp.clamp(text_size_bounds::MIN, text_size_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for TextSize {
    fn default() -> Self {
        Self(text_size_bounds::DEFAULT)
    }
}

// =============================================================================
// Text Alpha
// =============================================================================

/// Text opacity bounds as exposed to the user (50% to 100%).
pub mod text_alpha_bounds {
    pub const MIN_PERCENT: u8 = 50;
    pub const MAX_PERCENT: u8 = 100;
    /// Lowest raw alpha a text element can carry.
    pub const MIN_RAW: u8 = 128;
    pub const MAX_RAW: u8 = 255;
}

/// User-facing text opacity percentage (50–100%).
///
/// The percentage maps onto a raw 8-bit alpha in `[128, 255]`.
///
/// # Example
///
/// ```ignore
/// assert_eq!(TextAlphaPercent::new(50).to_raw(), 128);
/// assert_eq!(TextAlphaPercent::new(100).to_raw(), 255);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAlphaPercent(u8);

impl TextAlphaPercent {
    /// Creates a new percentage, clamping to the valid range.
    #[must_use]
    pub fn new(percent: u8) -> Self {
        Self(percent.clamp(text_alpha_bounds::MIN_PERCENT, text_alpha_bounds::MAX_PERCENT))
    }

    /// Recovers the slider position from a raw alpha value.
    #[must_use]
    pub fn from_raw(alpha: u8) -> Self {
        let percent = (f32::from(alpha) / 255.0 * 100.0).round();
        // Range 0..=100 fits in u8.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self::new(percent as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns the raw 8-bit alpha, clamped to `[128, 255]`.
    #[must_use]
    pub fn to_raw(self) -> u8 {
        let raw = (f32::from(self.0) / 100.0 * 255.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raw = raw as u8;
        raw.clamp(text_alpha_bounds::MIN_RAW, text_alpha_bounds::MAX_RAW)
    }
}

impl Default for TextAlphaPercent {
    fn default() -> Self {
        Self(text_alpha_bounds::MAX_PERCENT)
    }
}

// =============================================================================
// Typeface
// =============================================================================

/// Closed set of typefaces a text element can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Typeface {
    #[default]
    Default,
    Serif,
    Monospace,
}

impl Typeface {
    /// All typefaces in index order.
    pub const ALL: [Typeface; 3] = [Typeface::Default, Typeface::Serif, Typeface::Monospace];

    /// Maps a picker index onto a typeface; out-of-range indices select the default.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Typeface::Default => 0,
            Typeface::Serif => 1,
            Typeface::Monospace => 2,
        }
    }
}

// =============================================================================
// ScaleBounds
// =============================================================================

/// Inclusive scale range for one kind of overlay element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    min: f32,
    max: f32,
}

impl ScaleBounds {
    /// Creates bounds, swapping the ends if given in reverse and rejecting
    /// non-positive minimums so a transform built from them stays invertible.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let lo = lo.max(f32::EPSILON);
        Self {
            min: lo,
            max: hi.max(lo),
        }
    }

    #[must_use]
    pub fn min(self) -> f32 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f32 {
        self.max
    }

    #[must_use]
    pub fn clamp(self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Brightness / Contrast tests
    // -------------------------------------------------------------------------

    #[test]
    fn brightness_clamps() {
        assert_eq!(Brightness::new(150).value(), brightness_bounds::MAX);
        assert_eq!(Brightness::new(-150).value(), brightness_bounds::MIN);
        assert_eq!(Brightness::new(40).value(), 40);
    }

    #[test]
    fn brightness_offset_spans_full_channel() {
        assert!((Brightness::new(100).offset() - 255.0).abs() < f32::EPSILON);
        assert!((Brightness::new(-100).offset() + 255.0).abs() < f32::EPSILON);
        assert!(Brightness::default().is_neutral());
    }

    #[test]
    fn contrast_clamps_to_asymmetric_range() {
        assert_eq!(Contrast::new(-80).value(), contrast_bounds::MIN);
        assert_eq!(Contrast::new(200).value(), contrast_bounds::MAX);
    }

    #[test]
    fn contrast_factor() {
        assert!((Contrast::new(0).factor() - 1.0).abs() < f32::EPSILON);
        assert!((Contrast::new(-50).factor() - 0.5).abs() < f32::EPSILON);
        assert!((Contrast::new(150).factor() - 2.5).abs() < f32::EPSILON);
    }

    // -------------------------------------------------------------------------
    // Text tests
    // -------------------------------------------------------------------------

    #[test]
    fn text_size_clamps() {
        assert!((TextSize::new(4.0).value() - 12.0).abs() < f32::EPSILON);
        assert!((TextSize::new(72.0).value() - 36.0).abs() < f32::EPSILON);
        assert!((TextSize::default().value() - 18.0).abs() < f32::EPSILON);
    }

    #[test]
    fn text_alpha_maps_percent_to_raw_range() {
        assert_eq!(TextAlphaPercent::new(50).to_raw(), 128);
        assert_eq!(TextAlphaPercent::new(100).to_raw(), 255);
        assert_eq!(TextAlphaPercent::new(10).to_raw(), 128);
        assert_eq!(TextAlphaPercent::new(75).to_raw(), 191);
    }

    #[test]
    fn text_alpha_from_raw_recovers_slider() {
        assert_eq!(TextAlphaPercent::from_raw(255).value(), 100);
        assert_eq!(TextAlphaPercent::from_raw(128).value(), 50);
        assert_eq!(TextAlphaPercent::from_raw(0).value(), 50);
    }

    #[test]
    fn typeface_index_round_trip_and_fallback() {
        for face in Typeface::ALL {
            assert_eq!(Typeface::from_index(face.index()), face);
        }
        assert_eq!(Typeface::from_index(9), Typeface::Default);
    }

    // -------------------------------------------------------------------------
    // ScaleBounds tests
    // -------------------------------------------------------------------------

    #[test]
    fn scale_bounds_clamp() {
        let bounds = ScaleBounds::new(0.3, 4.0);
        assert!((bounds.clamp(0.1) - 0.3).abs() < f32::EPSILON);
        assert!((bounds.clamp(9.0) - 4.0).abs() < f32::EPSILON);
        assert!((bounds.clamp(1.5) - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn scale_bounds_normalize_inputs() {
        let swapped = ScaleBounds::new(3.0, 0.5);
        assert!((swapped.min() - 0.5).abs() < f32::EPSILON);
        assert!((swapped.max() - 3.0).abs() < f32::EPSILON);
        assert!(ScaleBounds::new(0.0, 1.0).min() > 0.0);
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the editor. Constants are organized by category.
//!
//! # Categories
//!
//! - **Display**: Density used to convert dp/sp units to pixels
//! - **Canvas**: Zoom bounds, overscroll margin and settle timing
//! - **Crop**: Handle tolerance, minimum size and initial layout
//! - **Text / Sticker**: Overlay element ranges and hot-zone sizes
//! - **Watermark / Export**: Final composition and persistence
//! - **Thumbnail**: External cache capacity

// ==========================================================================
// Display Defaults
// ==========================================================================

/// Pixels per density-independent pixel.
pub const DEFAULT_DENSITY: f32 = 1.0;

/// Pixels per scale-independent pixel (font scaling).
pub const DEFAULT_SCALED_DENSITY: f32 = 1.0;

// ==========================================================================
// Canvas Defaults
// ==========================================================================

/// Minimum user zoom relative to the fit-center scale.
pub const MIN_USER_SCALE: f32 = 0.5;

/// Maximum user zoom relative to the fit-center scale.
pub const MAX_USER_SCALE: f32 = 2.0;

/// Elastic overscroll allowed while dragging, in dp.
pub const OVERSCROLL_MARGIN_DP: f32 = 80.0;

/// Duration of the hard-bounds settle animation.
pub const SETTLE_DURATION_MS: u64 = 200;

// ==========================================================================
// Crop Defaults
// ==========================================================================

/// Touch tolerance around crop handles, in dp.
pub const CROP_HANDLE_RADIUS_DP: f32 = 24.0;

/// Minimum crop rectangle edge, in dp.
pub const MIN_CROP_SIZE_DP: f32 = 60.0;

/// Horizontal inset of the initial crop rectangle, in dp.
pub const CROP_PADDING_DP: f32 = 24.0;

/// Top of the usable crop band as a fraction of the viewport height.
pub const CROP_TOP_BAND: f32 = 0.15;

/// Bottom of the usable crop band as a fraction of the viewport height.
pub const CROP_BOTTOM_BAND: f32 = 0.85;

/// Aspect ratio of the initial crop rectangle.
pub const CROP_INITIAL_ASPECT: f32 = 4.0 / 3.0;

// ==========================================================================
// Text Defaults
// ==========================================================================

/// Content of a freshly created text element.
pub const DEFAULT_TEXT: &str = "Double-tap to edit";

/// Default text size in sp.
pub const DEFAULT_TEXT_SIZE_SP: f32 = 18.0;

/// Smallest text size in sp.
pub const MIN_TEXT_SIZE_SP: f32 = 12.0;

/// Largest text size in sp.
pub const MAX_TEXT_SIZE_SP: f32 = 36.0;

/// Lower bound of the user-facing alpha slider, in percent.
pub const MIN_TEXT_ALPHA_PERCENT: u8 = 50;

/// Upper bound of the user-facing alpha slider, in percent.
pub const MAX_TEXT_ALPHA_PERCENT: u8 = 100;

/// Handle-drag scale bounds for text.
pub const TEXT_MIN_SCALE: f32 = 0.5;
pub const TEXT_MAX_SCALE: f32 = 3.0;

/// Padding between text block and its frame, in local units.
pub const TEXT_PADDING_X: f32 = 24.0;
pub const TEXT_PADDING_Y: f32 = 16.0;

/// Edge of a text hot-zone square, in local units.
pub const TEXT_HOT_ZONE_SIZE: f32 = 36.0;

/// Vertical step between successive new text boxes, in dp.
pub const TEXT_STACK_STEP_DP: f32 = 40.0;

// ==========================================================================
// Sticker Defaults
// ==========================================================================

pub const STICKER_MIN_SCALE: f32 = 0.3;
pub const STICKER_MAX_SCALE: f32 = 4.0;

/// Clamp applied to the initial scale of a new sticker.
pub const STICKER_MIN_INITIAL_SCALE: f32 = 0.2;
pub const STICKER_MAX_INITIAL_SCALE: f32 = 2.5;

/// Target longest edge of a new sticker as a fraction of the shorter viewport side.
pub const STICKER_TARGET_FRACTION: f32 = 0.25;

/// Radius of a sticker hot-zone marker, in dp. The hit square is 2.2x this.
pub const STICKER_HANDLE_RADIUS_DP: f32 = 12.0;

/// Offset of a duplicated sticker, in dp.
pub const STICKER_DUPLICATE_OFFSET_DP: f32 = 24.0;

// ==========================================================================
// Watermark / Export Defaults
// ==========================================================================

pub const WATERMARK_TEXT: &str = "LightEdit";
pub const WATERMARK_SIZE_SP: f32 = 16.0;
pub const WATERMARK_PADDING_DP: f32 = 16.0;

/// JPEG quality used when persisting exports.
pub const EXPORT_JPEG_QUALITY: u8 = 95;

/// Prefix of suggested export filenames.
pub const EXPORT_FILE_PREFIX: &str = "LightEdit";

// ==========================================================================
// Thumbnail Defaults
// ==========================================================================

/// Thumbnail cache capacity, counted in items.
pub const THUMBNAIL_CACHE_CAPACITY: usize = 50;

/// Edge length of a square thumbnail in pixels.
pub const THUMBNAIL_EDGE_PX: u32 = 256;

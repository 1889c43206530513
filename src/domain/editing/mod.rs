// SPDX-License-Identifier: MPL-2.0
//! Editing domain types.
//!
//! This module provides pure domain types for image editing operations:
//! - [`Brightness`] / [`Contrast`]: Adjustment slider values
//! - [`TextSize`] / [`TextAlphaPercent`] / [`Typeface`]: Text overlay styling
//! - [`ScaleBounds`]: Per-element-kind scale limits
//! - [`EditorMode`]: Mutually exclusive editing surfaces

pub mod newtypes;

pub use newtypes::{
    Brightness, Contrast, ScaleBounds, TextAlphaPercent, TextSize, Typeface,
};

/// The editing surface currently in control of input and on-screen controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum EditorMode {
    #[default]
    Normal,
    Crop,
    Rotate,
    Adjust,
    Text,
    Sticker,
}

impl EditorMode {
    /// Whether the zoomable canvas receives pointer events in this mode.
    #[must_use]
    pub fn canvas_interactive(self) -> bool {
        !matches!(self, EditorMode::Crop)
    }

    /// Whether this mode owns a backup image until commit or cancel.
    #[must_use]
    pub fn holds_backup(self) -> bool {
        matches!(self, EditorMode::Rotate | EditorMode::Adjust)
    }
}

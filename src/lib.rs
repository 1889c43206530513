// SPDX-License-Identifier: MPL-2.0
//! `lightedit` is the interactive transform and composition engine of a photo
//! editor.
//!
//! It owns everything between a decoded photo and an exported JPEG: the
//! zoomable canvas, the crop rectangle, text and sticker overlays, pixel
//! adjustments and filters, and the final composition. Rendering and widgets
//! belong to the host; the [`editor::EditorSession`] exposes state and pointer
//! routing for it to draw.

#![doc(html_root_url = "https://docs.rs/lightedit/0.3.0")]

pub mod canvas;
pub mod config;
pub mod crop;
pub mod domain;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod media;
pub mod overlay;

#[cfg(test)]
mod test_utils;

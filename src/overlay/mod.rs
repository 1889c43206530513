// SPDX-License-Identifier: MPL-2.0
//! Text and sticker overlays.
//!
//! - [`element`]: One positioned element and its derived geometry
//! - [`layer`]: Ordered, selectable element list with gesture handling
//! - [`text`]: Text measurement and glyph rasterization

pub mod element;
pub mod layer;
pub mod text;

pub use element::{
    ElementGeometry, ElementKind, GeometryContext, OverlayElement, StickerPayload, TextPayload,
};
pub use layer::{OverlayLayer, OverlaySnapshot};
pub use text::{shaper_from_config, ApproximateShaper, FontShaper, GlyphMask, TextMetrics, TextShaper};

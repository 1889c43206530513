// SPDX-License-Identifier: MPL-2.0
//! A single positioned, scaled and rotated overlay element.
//!
//! The element itself holds only value fields. Everything visual (oriented
//! corners, bounds, hot-zones) is derived on demand by [`OverlayElement::geometry`]
//! and never treated as a source of truth.

use crate::config::defaults::{TEXT_HOT_ZONE_SIZE, TEXT_PADDING_X, TEXT_PADDING_Y};
use crate::domain::editing::{TextAlphaPercent, TextSize, Typeface};
use crate::geometry::{AffineTransform, Point, Rect};
use crate::overlay::text::{TextMetrics, TextShaper};
use image_rs::{Rgb, RgbaImage};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct TextPayload {
    pub text: String,
    pub size: TextSize,
    pub color: Rgb<u8>,
    /// Raw alpha in `[128, 255]`.
    pub alpha: u8,
    pub typeface: Typeface,
}

impl TextPayload {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: TextSize::default(),
            color: Rgb([255, 255, 255]),
            alpha: TextAlphaPercent::default().to_raw(),
            typeface: Typeface::Default,
        }
    }

    #[must_use]
    pub fn alpha_percent(&self) -> TextAlphaPercent {
        TextAlphaPercent::from_raw(self.alpha)
    }
}

/// Sticker content. The bitmap is shared between copies and snapshots.
#[derive(Debug, Clone)]
pub struct StickerPayload {
    pub image: Arc<RgbaImage>,
}

impl PartialEq for StickerPayload {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(TextPayload),
    Sticker(StickerPayload),
}

/// Inputs needed to turn an element's value fields into view-space geometry.
#[derive(Debug, Clone, Copy)]
pub struct GeometryContext<'a> {
    pub shaper: &'a dyn TextShaper,
    /// Pixels per sp, for text sizes.
    pub scaled_density: f32,
    /// Radius of a sticker corner handle, in pixels.
    pub sticker_handle_radius: f32,
}

/// Derived per-frame geometry of one element, in view coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementGeometry {
    /// Maps the element's local content space to the view.
    pub transform: AffineTransform,
    /// Unrotated local box the corners are computed from.
    pub local: Rect,
    /// Oriented corners: top-left, top-right, bottom-right, bottom-left.
    pub corners: [Point; 4],
    /// Axis-aligned box around `corners`; the body hit area.
    pub bounds: Rect,
    pub delete: Rect,
    pub duplicate: Rect,
    pub handle: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    pub center: Point,
    pub scale: f32,
    /// Degrees in `[0, 360)`.
    pub rotation: f32,
    pub kind: ElementKind,
}

impl OverlayElement {
    #[must_use]
    pub fn text(payload: TextPayload, center: Point) -> Self {
        Self {
            center,
            scale: 1.0,
            rotation: 0.0,
            kind: ElementKind::Text(payload),
        }
    }

    #[must_use]
    pub fn sticker(image: Arc<RgbaImage>, center: Point, scale: f32) -> Self {
        Self {
            center,
            scale,
            rotation: 0.0,
            kind: ElementKind::Sticker(StickerPayload { image }),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextPayload> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            ElementKind::Sticker(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextPayload> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(t),
            ElementKind::Sticker(_) => None,
        }
    }

    #[must_use]
    pub fn is_sticker(&self) -> bool {
        matches!(self.kind, ElementKind::Sticker(_))
    }

    /// Text size in pixels for a text element.
    #[must_use]
    pub fn text_size_px(&self, scaled_density: f32) -> Option<f32> {
        self.as_text().map(|t| t.size.value() * scaled_density)
    }

    /// Measures the text block of a text element.
    #[must_use]
    pub fn text_metrics(&self, ctx: &GeometryContext<'_>) -> Option<TextMetrics> {
        let payload = self.as_text()?;
        let size = payload.size.value() * ctx.scaled_density;
        Some(ctx.shaper.measure(&payload.text, size, payload.typeface))
    }

    /// Computes corners, bounds and hot-zones.
    ///
    /// Text: the local box is the text block plus padding, centred on the
    /// origin, with fixed-size hot-zones inset at its corners and mapped
    /// through the element transform. Stickers: the local box is the bitmap,
    /// and hot-zones are squares centred on the transformed corners.
    #[must_use]
    pub fn geometry(&self, ctx: &GeometryContext<'_>) -> ElementGeometry {
        let placement = AffineTransform::placement(self.center, self.scale, self.rotation);
        match &self.kind {
            ElementKind::Text(_) => {
                let (half_w, half_h) = match self.text_metrics(ctx) {
                    Some(m) => (
                        m.max_line_width / 2.0 + TEXT_PADDING_X,
                        m.total_height() / 2.0 + TEXT_PADDING_Y,
                    ),
                    None => (TEXT_PADDING_X, TEXT_PADDING_Y),
                };
                let local = Rect::new(-half_w, -half_h, half_w, half_h);
                let corners = placement.map_points(local.corners());
                let zone = TEXT_HOT_ZONE_SIZE;
                let delete = Rect::new(local.right - zone, local.top, local.right, local.top + zone);
                let duplicate =
                    Rect::new(local.left, local.bottom - zone, local.left + zone, local.bottom);
                let handle =
                    Rect::new(local.right - zone, local.bottom - zone, local.right, local.bottom);
                ElementGeometry {
                    transform: placement,
                    local,
                    corners,
                    bounds: Rect::bounding(&corners),
                    delete: placement.map_rect(&delete),
                    duplicate: placement.map_rect(&duplicate),
                    handle: placement.map_rect(&handle),
                }
            }
            ElementKind::Sticker(sticker) => {
                let w = sticker.image.width() as f32;
                let h = sticker.image.height() as f32;
                let transform = AffineTransform::translation(-w / 2.0, -h / 2.0).then(&placement);
                let local = Rect::from_size(w, h);
                let corners = transform.map_points(local.corners());
                let half = ctx.sticker_handle_radius * 2.2;
                let [_, top_right, bottom_right, bottom_left] = corners;
                ElementGeometry {
                    transform,
                    local,
                    corners,
                    bounds: Rect::bounding(&corners),
                    delete: Rect::from_center(top_right, half * 2.0, half * 2.0),
                    duplicate: Rect::from_center(bottom_left, half * 2.0, half * 2.0),
                    handle: Rect::from_center(bottom_right, half * 2.0, half * 2.0),
                }
            }
        }
    }

    /// Copy of this element with a shared payload, shifted by `offset` on both axes.
    #[must_use]
    pub fn duplicated(&self, offset: f32) -> Self {
        Self {
            center: Point::new(self.center.x + offset, self.center.y + offset),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::text::ApproximateShaper;
    use crate::test_utils::assert_abs_diff_eq;

    fn ctx() -> GeometryContext<'static> {
        GeometryContext {
            shaper: &ApproximateShaper,
            scaled_density: 1.0,
            sticker_handle_radius: 12.0,
        }
    }

    fn sticker_image(w: u32, h: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(w, h))
    }

    #[test]
    fn text_box_is_block_plus_padding() {
        // 10 chars at 20px: width 110, line height 23.4.
        let mut payload = TextPayload::new("abcdefghij");
        payload.size = TextSize::new(20.0);
        let e = OverlayElement::text(payload, Point::new(500.0, 500.0));
        let g = e.geometry(&ctx());
        assert_abs_diff_eq!(g.local.width(), 110.0 + 48.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.local.height(), 23.4 + 32.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.bounds.center().x, 500.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.bounds.center().y, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn text_hot_zones_sit_in_their_corners() {
        let e = OverlayElement::text(TextPayload::new("hello"), Point::new(200.0, 200.0));
        let g = e.geometry(&ctx());
        assert_abs_diff_eq!(g.delete.right, g.bounds.right, epsilon = 1e-3);
        assert_abs_diff_eq!(g.delete.top, g.bounds.top, epsilon = 1e-3);
        assert_abs_diff_eq!(g.duplicate.left, g.bounds.left, epsilon = 1e-3);
        assert_abs_diff_eq!(g.duplicate.bottom, g.bounds.bottom, epsilon = 1e-3);
        assert_abs_diff_eq!(g.handle.right, g.bounds.right, epsilon = 1e-3);
        assert_abs_diff_eq!(g.handle.width(), 36.0, epsilon = 1e-3);
    }

    #[test]
    fn rotated_text_bounds_enclose_corners() {
        let mut e = OverlayElement::text(TextPayload::new("rotate me"), Point::new(300.0, 300.0));
        e.rotation = 45.0;
        e.scale = 2.0;
        let g = e.geometry(&ctx());
        for c in g.corners {
            assert!(g.bounds.outset(1e-3).contains(c));
        }
        let diag = g.local.width().hypot(g.local.height()) * 2.0;
        assert!(g.bounds.width() <= diag + 1e-3);
    }

    #[test]
    fn sticker_corners_follow_bitmap() {
        let e = OverlayElement::sticker(sticker_image(100, 50), Point::new(400.0, 300.0), 2.0);
        let g = e.geometry(&ctx());
        assert_abs_diff_eq!(g.corners[0].x, 300.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.corners[0].y, 250.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.corners[2].x, 500.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.corners[2].y, 350.0, epsilon = 1e-3);
    }

    #[test]
    fn sticker_hot_zones_centre_on_corners() {
        let mut e = OverlayElement::sticker(sticker_image(100, 100), Point::new(200.0, 200.0), 1.0);
        e.rotation = 90.0;
        let g = e.geometry(&ctx());
        // After a quarter turn clockwise, the local top-right lands bottom-right.
        assert_abs_diff_eq!(g.delete.center().x, 250.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.delete.center().y, 250.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.delete.width(), 12.0 * 2.2 * 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.handle.center().x, 150.0, epsilon = 1e-3);
    }

    #[test]
    fn duplicate_shares_sticker_bitmap() {
        let e = OverlayElement::sticker(sticker_image(10, 10), Point::new(0.0, 0.0), 1.0);
        let copy = e.duplicated(24.0);
        assert_eq!(copy.center, Point::new(24.0, 24.0));
        assert_eq!(copy.kind, e.kind);
    }

    #[test]
    fn default_text_payload_is_opaque_white() {
        let p = TextPayload::new("x");
        assert_eq!(p.alpha, 255);
        assert_eq!(p.color, Rgb([255, 255, 255]));
        assert_eq!(p.alpha_percent().value(), 100);
        assert_eq!(p.size.value(), 18.0);
    }
}

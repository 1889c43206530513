// SPDX-License-Identifier: MPL-2.0
//! Ordered, selectable list of overlay elements driven by pointer gestures.
//!
//! Index order is z-order: the last element is drawn on top and wins body
//! hit-tests. At most one element is selected; only the selected element's
//! hot-zones are interactive.
//!
//! A tap on empty space clears the selection. A double tap on a text box
//! selects it and leaves an edit request for the host to pick up.

use crate::config::{DisplayConfig, EditorConfig, StickerConfig, TextConfig};
use crate::domain::editing::{ScaleBounds, TextAlphaPercent, TextSize, Typeface};
use crate::error::{Error, Result};
use crate::geometry::{Point, Size};
use crate::gesture::{
    normalize_degrees, GesturePhase, GestureTarget, GestureTracker, HitTarget, PointerEvent,
    TransformSample,
};
use crate::overlay::element::{
    ElementGeometry, ElementKind, GeometryContext, OverlayElement, TextPayload,
};
use crate::overlay::text::TextShaper;
use image_rs::{Rgb, RgbaImage};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Value copy of a layer's elements and selection.
///
/// Sticker bitmaps are shared with the live layer, not copied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlaySnapshot {
    elements: Vec<OverlayElement>,
    selected: Option<usize>,
}

impl OverlaySnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

pub struct OverlayLayer {
    elements: Vec<OverlayElement>,
    geometry: Vec<ElementGeometry>,
    selected: Option<usize>,
    viewport: Size,
    shaper: Arc<dyn TextShaper>,
    display: DisplayConfig,
    text: TextConfig,
    sticker: StickerConfig,
    tracker: GestureTracker,
    /// Scale and rotation of the selected element when the transform began.
    baseline: Option<(f32, f32)>,
    pending_edit: Option<usize>,
}

impl fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("elements", &self.elements.len())
            .field("selected", &self.selected)
            .field("viewport", &self.viewport)
            .field("phase", &self.tracker.phase())
            .finish_non_exhaustive()
    }
}

impl OverlayLayer {
    #[must_use]
    pub fn new(config: &EditorConfig, shaper: Arc<dyn TextShaper>) -> Self {
        Self {
            elements: Vec::new(),
            geometry: Vec::new(),
            selected: None,
            viewport: Size::default(),
            shaper,
            display: config.display,
            text: config.text.clone(),
            sticker: config.sticker,
            tracker: GestureTracker::new(),
            baseline: None,
            pending_edit: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> Option<&OverlayElement> {
        self.selected.and_then(|i| self.elements.get(i))
    }

    /// Style of the selected element when it is a text element.
    #[must_use]
    pub fn selected_text(&self) -> Option<&TextPayload> {
        self.selected().and_then(OverlayElement::as_text)
    }

    /// Cached view-space geometry of the element at `index`.
    #[must_use]
    pub fn geometry(&self, index: usize) -> Option<&ElementGeometry> {
        self.geometry.get(index)
    }

    #[must_use]
    pub fn shaper(&self) -> &dyn TextShaper {
        self.shaper.as_ref()
    }

    #[must_use]
    pub fn scaled_density(&self) -> f32 {
        self.display.scaled_density
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        self.tracker.phase()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn context(&self) -> GeometryContext<'_> {
        GeometryContext {
            shaper: self.shaper.as_ref(),
            scaled_density: self.display.scaled_density,
            sticker_handle_radius: self.display.dp(self.sticker.handle_radius_dp),
        }
    }

    fn scale_bounds(&self, element: &OverlayElement) -> ScaleBounds {
        match element.kind {
            ElementKind::Text(_) => ScaleBounds::new(self.text.min_scale, self.text.max_scale),
            ElementKind::Sticker(_) => {
                ScaleBounds::new(self.sticker.min_scale, self.sticker.max_scale)
            }
        }
    }

    fn refresh(&mut self) {
        let ctx = self.context();
        let geometry = self.elements.iter().map(|e| e.geometry(&ctx)).collect();
        self.geometry = geometry;
    }

    fn refresh_at(&mut self, index: usize) {
        let Some(element) = self.elements.get(index) else {
            return;
        };
        let g = element.geometry(&self.context());
        if let Some(slot) = self.geometry.get_mut(index) {
            *slot = g;
        }
    }

    fn push_selected(&mut self, element: OverlayElement) -> usize {
        self.elements.push(element);
        let index = self.elements.len() - 1;
        self.selected = Some(index);
        let g = self.elements[index].geometry(&self.context());
        self.geometry.push(g);
        index
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.elements.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Selects the topmost element when nothing is selected.
    pub fn ensure_one_selected(&mut self) -> Option<&OverlayElement> {
        if self.selected.is_none() && !self.elements.is_empty() {
            self.selected = Some(self.elements.len() - 1);
        }
        self.selected()
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Appends a text element below the previous ones and selects it.
    ///
    /// Successive boxes step down by a fixed amount, capped at a third of the
    /// viewport height.
    pub fn add_text(&mut self, text: &str) -> usize {
        let step = self.display.dp(self.text.stack_step_dp) * self.elements.len() as f32;
        let y_offset = step.min(self.viewport.height / 3.0);
        let center = Point::new(
            self.viewport.width / 2.0,
            self.viewport.height / 2.0 + y_offset,
        );
        let mut payload = TextPayload::new(text);
        payload.size = TextSize::new(self.text.default_size_sp);
        log::debug!("text element added at ({}, {})", center.x, center.y);
        self.push_selected(OverlayElement::text(payload, center))
    }

    /// Creates the first text box, or replaces the selected box's content.
    pub fn add_text_at_center(&mut self, text: &str) {
        if self.elements.is_empty() {
            self.add_text(text);
        } else {
            self.ensure_one_selected();
            self.set_selected_text(text);
        }
    }

    /// Appends a sticker centred in the viewport and selects it.
    ///
    /// The initial scale aims for a longest edge of a quarter of the shorter
    /// viewport side.
    pub fn add_sticker(&mut self, image: Arc<RgbaImage>) -> Result<usize> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(Error::InvalidGeometry("sticker bitmap is empty".into()));
        }
        if !self.viewport.is_valid() {
            return Err(Error::InvalidGeometry("overlay viewport is not laid out".into()));
        }
        let target = self.viewport.width.min(self.viewport.height)
            * crate::config::defaults::STICKER_TARGET_FRACTION;
        let scale = (target / w.max(h) as f32).clamp(
            crate::config::defaults::STICKER_MIN_INITIAL_SCALE,
            crate::config::defaults::STICKER_MAX_INITIAL_SCALE,
        );
        Ok(self.push_selected(OverlayElement::sticker(
            image,
            self.viewport.center(),
            scale,
        )))
    }

    /// Appends a shifted copy of the selected element and selects it.
    pub fn duplicate_selected(&mut self) -> Option<usize> {
        let offset = self.display.dp(self.sticker.duplicate_offset_dp);
        let copy = self.selected()?.duplicated(offset);
        Some(self.push_selected(copy))
    }

    // -------------------------------------------------------------------------
    // Text styling
    // -------------------------------------------------------------------------

    fn edit_selected_text(&mut self, edit: impl FnOnce(&mut TextPayload)) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        let Some(payload) = self.elements.get_mut(index).and_then(OverlayElement::as_text_mut)
        else {
            return false;
        };
        edit(payload);
        self.refresh_at(index);
        true
    }

    pub fn set_selected_text(&mut self, text: &str) -> bool {
        self.edit_selected_text(|p| p.text = text.to_string())
    }

    pub fn set_selected_typeface(&mut self, typeface: Typeface) -> bool {
        self.edit_selected_text(|p| p.typeface = typeface)
    }

    pub fn set_selected_text_size(&mut self, size: TextSize) -> bool {
        self.edit_selected_text(|p| p.size = size)
    }

    pub fn set_selected_color(&mut self, color: Rgb<u8>) -> bool {
        self.edit_selected_text(|p| p.color = color)
    }

    pub fn set_selected_alpha(&mut self, alpha: TextAlphaPercent) -> bool {
        self.edit_selected_text(|p| p.alpha = alpha.to_raw())
    }

    // -------------------------------------------------------------------------
    // Deletion and ordering
    // -------------------------------------------------------------------------

    /// Removes the selected element; selection becomes none.
    pub fn delete_selected(&mut self) -> bool {
        let Some(index) = self.selected.filter(|&i| i < self.elements.len()) else {
            return false;
        };
        self.elements.remove(index);
        self.geometry.remove(index);
        self.selected = None;
        true
    }

    pub fn clear_all(&mut self) {
        self.elements.clear();
        self.geometry.clear();
        self.selected = None;
        self.tracker.reset();
        self.baseline = None;
        self.pending_edit = None;
    }

    fn move_selected(&mut self, to: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let Some(from) = self.selected.filter(|&i| i < self.elements.len()) else {
            return false;
        };
        let Some(to) = to(from, self.elements.len() - 1) else {
            return false;
        };
        if to == from {
            return false;
        }
        let element = self.elements.remove(from);
        self.elements.insert(to, element);
        let g = self.geometry.remove(from);
        self.geometry.insert(to, g);
        self.selected = Some(to);
        true
    }

    pub fn move_selected_up(&mut self) -> bool {
        self.move_selected(|i, last| (i < last).then_some(i + 1))
    }

    pub fn move_selected_down(&mut self) -> bool {
        self.move_selected(|i, _| i.checked_sub(1))
    }

    pub fn bring_selected_to_front(&mut self) -> bool {
        self.move_selected(|_, last| Some(last))
    }

    pub fn send_selected_to_back(&mut self) -> bool {
        self.move_selected(|_, _| Some(0))
    }

    // -------------------------------------------------------------------------
    // Snapshot / restore
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            elements: self.elements.clone(),
            selected: self.selected,
        }
    }

    /// Replaces the live list and selection with the snapshot's.
    pub fn restore(&mut self, snapshot: OverlaySnapshot) {
        self.elements = snapshot.elements;
        self.selected = snapshot.selected.filter(|&i| i < self.elements.len());
        self.tracker.reset();
        self.baseline = None;
        self.pending_edit = None;
        self.refresh();
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Routes one pointer event through this layer's gesture tracker.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.handle_pointer_at(event, Instant::now())
    }

    /// Same as [`Self::handle_pointer`] for an event that happened at `now`.
    pub fn handle_pointer_at(&mut self, event: &PointerEvent, now: Instant) -> bool {
        let mut tracker = std::mem::take(&mut self.tracker);
        let consumed = tracker.handle_event_at(event, self, now);
        self.tracker = tracker;
        consumed
    }

    /// Index of the text box a double tap asked to edit, once.
    pub fn take_edit_request(&mut self) -> Option<usize> {
        self.pending_edit
            .take()
            .filter(|&i| self.elements.get(i).is_some_and(|e| e.as_text().is_some()))
    }
}

impl GestureTarget for OverlayLayer {
    fn hit_test(&self, position: Point) -> HitTarget {
        if let Some(g) = self.selected.and_then(|i| self.geometry.get(i)) {
            if g.handle.contains(position) {
                return HitTarget::Handle;
            }
            if g.delete.contains(position) {
                return HitTarget::Delete;
            }
            if g.duplicate.contains(position) {
                return HitTarget::Duplicate;
            }
            if g.bounds.contains(position) {
                return HitTarget::Body;
            }
        }
        self.geometry
            .iter()
            .enumerate()
            .rev()
            .find(|(i, g)| Some(*i) != self.selected && g.bounds.contains(position))
            .map_or(HitTarget::Miss, |(i, _)| HitTarget::Select(i))
    }

    fn perform(&mut self, hit: HitTarget) {
        match hit {
            HitTarget::Delete => {
                self.delete_selected();
            }
            HitTarget::Duplicate => {
                let is_text = self.selected().is_some_and(|e| !e.is_sticker());
                if is_text {
                    let text = self.text.default_text.clone();
                    self.add_text(&text);
                } else {
                    self.duplicate_selected();
                }
            }
            HitTarget::Select(index) => {
                self.select(index);
            }
            HitTarget::Handle | HitTarget::Body | HitTarget::Miss => {}
        }
    }

    fn transform_pivot(&self) -> Option<Point> {
        self.selected().map(|e| e.center)
    }

    fn supports_dual_pointer(&self) -> bool {
        self.selected.is_some()
    }

    fn begin_transform(&mut self) {
        self.baseline = self.selected().map(|e| (e.scale, e.rotation));
    }

    fn apply_transform(&mut self, sample: TransformSample) {
        let (Some(index), Some((start_scale, start_rotation))) = (self.selected, self.baseline)
        else {
            return;
        };
        let Some(bounds) = self.elements.get(index).map(|e| self.scale_bounds(e)) else {
            return;
        };
        let element = &mut self.elements[index];
        element.scale = bounds.clamp(start_scale * sample.scale_ratio);
        element.rotation = normalize_degrees(start_rotation + sample.rotation_delta);
        self.refresh_at(index);
    }

    fn pan_by(&mut self, delta: Point) {
        let Some(index) = self.selected.filter(|&i| i < self.elements.len()) else {
            return;
        };
        let element = &mut self.elements[index];
        element.center = element.center + delta;
        self.refresh_at(index);
    }

    fn end_gesture(&mut self, _phase: GesturePhase) {
        self.baseline = None;
    }

    fn on_tap(&mut self, position: Point) -> bool {
        if self.selected.is_none() || self.hit_test(position) != HitTarget::Miss {
            return false;
        }
        self.clear_selection();
        true
    }

    fn on_double_tap(&mut self, position: Point) -> bool {
        let index = match self.hit_test(position) {
            HitTarget::Body => self.selected,
            HitTarget::Select(i) => Some(i),
            _ => None,
        };
        let Some(index) = index else {
            return false;
        };
        if !self.select(index) {
            return false;
        }
        if self.elements.get(index).is_some_and(|e| e.as_text().is_some()) {
            log::debug!("edit requested for text box {index}");
            self.pending_edit = Some(index);
        }
        true
    }
}

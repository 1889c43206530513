// SPDX-License-Identifier: MPL-2.0
//! Zoomable, pannable image canvas.
//!
//! The canvas keeps a single display transform mapping source-image pixels to
//! viewport pixels. Loading an image (or resizing the viewport) fits it:
//! uniform scale `min(vw/iw, vh/ih)`, then centre. On top of that fit the user
//! can zoom between `min_user_scale` and `max_user_scale` with two pointers and
//! pan with one.
//!
//! While a pan is in progress soft bounds allow an elastic overscroll; on
//! release the content eases back to hard bounds with a [`SettleAnimation`]
//! driven by [`ZoomCanvas::tick`].

use crate::config::{CanvasConfig, DisplayConfig};
use crate::error::{Error, Result};
use crate::geometry::{
    corrective_offset, AffineTransform, BoundsMode, PixelRect, Point, Rect, SettleAnimation, Size,
};
use crate::gesture::{
    GesturePhase, GestureTarget, GestureTracker, HitTarget, PointerEvent, TransformSample,
};
use std::time::Duration;

/// Relative zoom steps smaller than this are ignored.
const SCALE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct ZoomCanvas {
    transform: AffineTransform,
    viewport: Size,
    content: (u32, u32),
    base_scale: f32,
    user_scale: f32,
    gesture_start_scale: f32,
    min_user_scale: f32,
    max_user_scale: f32,
    overscroll: f32,
    settle_duration: Duration,
    settle: Option<SettleAnimation>,
    fitted: bool,
    interactive: bool,
    tracker: GestureTracker,
}

impl ZoomCanvas {
    #[must_use]
    pub fn new(config: &CanvasConfig, display: &DisplayConfig) -> Self {
        let min = config.min_user_scale.min(config.max_user_scale).max(f32::EPSILON);
        let max = config.max_user_scale.max(min);
        Self {
            transform: AffineTransform::identity(),
            viewport: Size::default(),
            content: (0, 0),
            base_scale: 1.0,
            user_scale: 1.0,
            gesture_start_scale: 1.0,
            min_user_scale: min,
            max_user_scale: max,
            overscroll: display.dp(config.overscroll_margin_dp),
            settle_duration: Duration::from_millis(config.settle_duration_ms),
            settle: None,
            fitted: false,
            interactive: true,
            tracker: GestureTracker::new(),
        }
    }

    /// Display transform from source pixels to viewport pixels.
    #[must_use]
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn content_size(&self) -> (u32, u32) {
        self.content
    }

    #[must_use]
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    /// Zoom relative to the fit scale.
    #[must_use]
    pub fn user_scale(&self) -> f32 {
        self.user_scale
    }

    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Where the image currently lands in the viewport.
    #[must_use]
    pub fn content_rect(&self) -> Rect {
        self.transform.map_rect(&self.source_rect())
    }

    fn source_rect(&self) -> Rect {
        Rect::from_size(self.content.0 as f32, self.content.1 as f32)
    }

    fn has_content(&self) -> bool {
        self.content.0 > 0 && self.content.1 > 0
    }

    /// Updates the viewport size and refits the image.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.fitted = false;
            self.fit_if_possible();
        }
    }

    /// Replaces the displayed image extent and refits.
    pub fn set_content(&mut self, width: u32, height: u32) {
        self.content = (width, height);
        self.fitted = false;
        self.fit_if_possible();
    }

    /// Removes the image.
    pub fn clear_content(&mut self) {
        self.content = (0, 0);
        self.cancel_settle();
        self.transform.reset();
        self.fitted = false;
    }

    /// Enables or disables pointer handling; crop mode turns it off so events
    /// reach the crop overlay.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
        if !interactive {
            self.tracker.reset();
        }
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn fit_if_possible(&mut self) {
        if self.fitted || !self.viewport.is_valid() || !self.has_content() {
            return;
        }
        self.cancel_settle();
        let (iw, ih) = (self.content.0 as f32, self.content.1 as f32);
        self.base_scale = (self.viewport.width / iw).min(self.viewport.height / ih);

        self.transform = AffineTransform::scaling_about(self.base_scale, Point::ZERO);
        let dx = (self.viewport.width - iw * self.base_scale) / 2.0;
        let dy = (self.viewport.height - ih * self.base_scale) / 2.0;
        self.transform.post_translate(dx, dy);

        self.user_scale = 1.0;
        self.fitted = true;
        self.apply_hard_bounds();
        log::debug!(
            "canvas fit {}x{} into {}x{} at scale {}",
            self.content.0,
            self.content.1,
            self.viewport.width,
            self.viewport.height,
            self.base_scale
        );
    }

    /// Immediately applies the elastic drag constraint.
    pub fn apply_soft_bounds(&mut self) {
        self.apply_bounds(BoundsMode::Soft {
            margin: self.overscroll,
        });
    }

    /// Immediately applies the strict constraint.
    pub fn apply_hard_bounds(&mut self) {
        self.apply_bounds(BoundsMode::Hard);
    }

    fn apply_bounds(&mut self, mode: BoundsMode) {
        if !self.has_content() {
            return;
        }
        let d = corrective_offset(&self.content_rect(), self.viewport, mode);
        if d != Point::ZERO {
            self.transform.post_translate(d.x, d.y);
        }
    }

    /// Starts easing back to hard bounds. Does nothing if already in bounds.
    pub fn start_settle(&mut self) {
        self.cancel_settle();
        if !self.has_content() {
            return;
        }
        let target = corrective_offset(&self.content_rect(), self.viewport, BoundsMode::Hard);
        if target != Point::ZERO {
            self.settle = Some(SettleAnimation::new(target, self.settle_duration));
        }
    }

    pub fn cancel_settle(&mut self) {
        self.settle = None;
    }

    /// Advances a running settle animation. Returns whether the canvas moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(anim) = self.settle.as_mut() else {
            return false;
        };
        let step = anim.advance(dt);
        if anim.is_finished() {
            self.settle = None;
        }
        if step != Point::ZERO {
            self.transform.post_translate(step.x, step.y);
        }
        true
    }

    /// Routes a pointer event through the canvas gesture tracker.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.interactive {
            return false;
        }
        let mut tracker = std::mem::take(&mut self.tracker);
        let consumed = tracker.handle_event(event, self);
        self.tracker = tracker;
        consumed
    }

    /// Zooms about `focus` to `target` (relative to fit), then applies hard bounds.
    pub fn zoom_to(&mut self, target: f32, focus: Point) {
        let clamped = target.clamp(self.min_user_scale, self.max_user_scale);
        let factor = clamped / self.user_scale;
        if (factor - 1.0).abs() > SCALE_EPSILON {
            self.transform.post_scale_about(factor, focus);
            self.user_scale = clamped;
            self.apply_hard_bounds();
        }
    }

    /// Maps a viewport-space crop rectangle to source pixels.
    ///
    /// The rectangle is first clipped to the displayed image; the result is at
    /// least 1×1 and always inside the image.
    pub fn source_region(&self, crop_in_view: &Rect) -> Result<PixelRect> {
        if !self.has_content() {
            return Err(Error::EmptyIntersection);
        }
        let (w, h) = self.content;
        let clipped = crop_in_view
            .intersect(&self.content_rect())
            .ok_or(Error::EmptyIntersection)?;
        let inverse = self.transform.invert().inspect_err(|_| {
            debug_assert!(false, "display transform lost its inverse");
        })?;
        let mapped = inverse.map_rect(&clipped);

        let (wf, hf) = (w as f32, h as f32);
        let left = mapped.left.clamp(0.0, wf);
        let top = mapped.top.clamp(0.0, hf);
        let right = mapped.right.clamp(0.0, wf);
        let bottom = mapped.bottom.clamp(0.0, hf);

        // Truncation toward zero matches integer pixel addressing.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y, width, height) = (
            left as u32,
            top as u32,
            ((right - left) as u32).max(1),
            ((bottom - top) as u32).max(1),
        );
        if x >= w || y >= h {
            return Err(Error::EmptyIntersection);
        }
        Ok(PixelRect::new(
            x,
            y,
            width.min(w - x),
            height.min(h - y),
        ))
    }
}

impl GestureTarget for ZoomCanvas {
    fn hit_test(&self, _position: Point) -> HitTarget {
        if self.has_content() {
            HitTarget::Body
        } else {
            HitTarget::Miss
        }
    }

    fn on_pointer_down(&mut self) {
        self.cancel_settle();
    }

    fn transform_pivot(&self) -> Option<Point> {
        None
    }

    fn supports_dual_pointer(&self) -> bool {
        true
    }

    fn begin_transform(&mut self) {
        self.gesture_start_scale = self.user_scale;
    }

    fn apply_transform(&mut self, sample: TransformSample) {
        self.zoom_to(self.gesture_start_scale * sample.scale_ratio, sample.focus);
    }

    fn pan_by(&mut self, delta: Point) {
        self.transform.post_translate(delta.x, delta.y);
        self.apply_soft_bounds();
    }

    fn end_gesture(&mut self, _phase: GesturePhase) {
        self.start_settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::PointerSample;
    use crate::test_utils::assert_abs_diff_eq;

    fn canvas(viewport: Size, image: (u32, u32)) -> ZoomCanvas {
        let mut c = ZoomCanvas::new(&CanvasConfig::default(), &DisplayConfig::default());
        c.set_viewport(viewport);
        c.set_content(image.0, image.1);
        c
    }

    fn run_settle(c: &mut ZoomCanvas) {
        while c.tick(Duration::from_millis(16)) {}
    }

    #[test]
    fn initial_fit_centres_wide_image() {
        let c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        assert_abs_diff_eq!(c.base_scale(), 0.5);
        let r = c.content_rect();
        assert_abs_diff_eq!(r.left, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.top, 250.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.right, 1000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.bottom, 750.0, epsilon = 1e-3);
    }

    #[test]
    fn pan_past_left_edge_settles_back_flush() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        c.handle_pointer(&PointerEvent::down(0, 500.0, 500.0));
        c.handle_pointer(&PointerEvent::move_to(0, 1000.0, 500.0));
        // Soft bounds cap the drift at the overscroll margin.
        assert_abs_diff_eq!(c.content_rect().left, 80.0, epsilon = 1e-3);

        c.handle_pointer(&PointerEvent::up(0));
        assert!(c.is_settling());
        run_settle(&mut c);
        assert_abs_diff_eq!(c.content_rect().left, 0.0, epsilon = 1e-3);
        assert!(!c.is_settling());
    }

    #[test]
    fn zoomed_content_never_leaves_a_left_gap_after_settle() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        c.zoom_to(2.0, Point::new(500.0, 500.0));
        assert_abs_diff_eq!(c.content_rect().left, -500.0, epsilon = 1e-3);

        c.handle_pointer(&PointerEvent::down(0, 100.0, 500.0));
        c.handle_pointer(&PointerEvent::move_to(0, 700.0, 500.0));
        assert_abs_diff_eq!(c.content_rect().left, 80.0, epsilon = 1e-3);
        c.handle_pointer(&PointerEvent::up(0));
        run_settle(&mut c);
        assert_abs_diff_eq!(c.content_rect().left, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn pinch_is_clamped_to_user_scale_bounds() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (1000, 1000));
        c.handle_pointer(&PointerEvent::down(0, 400.0, 500.0));
        c.handle_pointer(&PointerEvent::down(1, 600.0, 500.0));
        c.handle_pointer(&PointerEvent::Move {
            samples: vec![
                PointerSample::new(0, 0.0, 500.0),
                PointerSample::new(1, 1000.0, 500.0),
            ],
        });
        assert_abs_diff_eq!(c.user_scale(), 2.0);

        c.handle_pointer(&PointerEvent::Move {
            samples: vec![
                PointerSample::new(0, 490.0, 500.0),
                PointerSample::new(1, 510.0, 500.0),
            ],
        });
        assert_abs_diff_eq!(c.user_scale(), 0.5);
        // Smaller than the viewport: hard bounds keep it centred.
        let r = c.content_rect();
        assert_abs_diff_eq!(r.center().x, 500.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center().y, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn pointer_down_cancels_running_settle() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        c.handle_pointer(&PointerEvent::down(0, 500.0, 500.0));
        c.handle_pointer(&PointerEvent::move_to(0, 900.0, 500.0));
        c.handle_pointer(&PointerEvent::up(0));
        assert!(c.is_settling());
        c.handle_pointer(&PointerEvent::down(0, 500.0, 500.0));
        assert!(!c.is_settling());
    }

    #[test]
    fn non_interactive_canvas_ignores_pointers() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        c.set_interactive(false);
        assert!(!c.handle_pointer(&PointerEvent::down(0, 500.0, 500.0)));
        assert!(!c.handle_pointer(&PointerEvent::move_to(0, 900.0, 500.0)));
        assert_abs_diff_eq!(c.content_rect().left, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn source_region_maps_through_inverse_display_transform() {
        let c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        let region = c
            .source_region(&Rect::new(100.0, 300.0, 500.0, 700.0))
            .expect("overlaps image");
        assert_eq!(region, PixelRect::new(200, 100, 800, 800));
    }

    #[test]
    fn source_region_clips_to_displayed_image() {
        let c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        let region = c
            .source_region(&Rect::new(-100.0, 200.0, 300.0, 400.0))
            .expect("overlaps image");
        assert_eq!(region, PixelRect::new(0, 0, 600, 300));
    }

    #[test]
    fn source_region_outside_image_fails() {
        let c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        let err = c
            .source_region(&Rect::new(0.0, 0.0, 1000.0, 200.0))
            .expect_err("no overlap");
        assert!(matches!(err, Error::EmptyIntersection));
    }

    #[test]
    fn replacing_content_refits() {
        let mut c = canvas(Size::new(1000.0, 1000.0), (2000, 1000));
        c.zoom_to(2.0, Point::new(500.0, 500.0));
        c.set_content(1000, 2000);
        assert_abs_diff_eq!(c.user_scale(), 1.0);
        assert_abs_diff_eq!(c.base_scale(), 0.5);
        assert_abs_diff_eq!(c.content_rect().left, 250.0, epsilon = 1e-3);
    }
}

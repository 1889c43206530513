// SPDX-License-Identifier: MPL-2.0
//! Crop rectangle geometry.
//!
//! The crop rectangle lives in viewport coordinates and is always contained in
//! the viewport and at least `min_size` on each side. With a fixed aspect ratio
//! the ratio is exact: every resize derives one side from the other.
//!
//! Mapping the rectangle to source pixels is the canvas's job
//! ([`crate::canvas::ZoomCanvas::source_region`]).

use crate::config::defaults::CROP_INITIAL_ASPECT;
use crate::config::{CropConfig, DisplayConfig};
use crate::geometry::{Point, Rect, Size};
use crate::gesture::{PointerEvent, PointerId};

/// Aspect ratio constraint of the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum AspectRatioMode {
    #[default]
    Free,
    Ratio1x1,
    Ratio4x3,
    Ratio16x9,
    Ratio3x4,
    Ratio9x16,
}

impl AspectRatioMode {
    pub const ALL: [AspectRatioMode; 6] = [
        AspectRatioMode::Free,
        AspectRatioMode::Ratio1x1,
        AspectRatioMode::Ratio4x3,
        AspectRatioMode::Ratio16x9,
        AspectRatioMode::Ratio3x4,
        AspectRatioMode::Ratio9x16,
    ];

    /// Width over height, or `None` in free mode.
    #[must_use]
    pub fn ratio(self) -> Option<f32> {
        match self {
            AspectRatioMode::Free => None,
            AspectRatioMode::Ratio1x1 => Some(1.0),
            AspectRatioMode::Ratio4x3 => Some(4.0 / 3.0),
            AspectRatioMode::Ratio16x9 => Some(16.0 / 9.0),
            AspectRatioMode::Ratio3x4 => Some(3.0 / 4.0),
            AspectRatioMode::Ratio9x16 => Some(9.0 / 16.0),
        }
    }
}

/// Grab points on the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

impl CropHandle {
    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            CropHandle::TopLeft
                | CropHandle::TopRight
                | CropHandle::BottomLeft
                | CropHandle::BottomRight
        )
    }

    fn position(self, r: &Rect) -> Point {
        let c = r.center();
        match self {
            CropHandle::TopLeft => Point::new(r.left, r.top),
            CropHandle::TopRight => Point::new(r.right, r.top),
            CropHandle::BottomLeft => Point::new(r.left, r.bottom),
            CropHandle::BottomRight => Point::new(r.right, r.bottom),
            CropHandle::Top => Point::new(c.x, r.top),
            CropHandle::Bottom => Point::new(c.x, r.bottom),
            CropHandle::Left => Point::new(r.left, c.y),
            CropHandle::Right => Point::new(r.right, c.y),
        }
    }
}

const CORNERS: [CropHandle; 4] = [
    CropHandle::TopLeft,
    CropHandle::TopRight,
    CropHandle::BottomLeft,
    CropHandle::BottomRight,
];

const EDGES: [CropHandle; 4] = [
    CropHandle::Top,
    CropHandle::Bottom,
    CropHandle::Left,
    CropHandle::Right,
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum CropTouch {
    Drag,
    Resize(CropHandle),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CropSession {
    pointer: PointerId,
    touch: CropTouch,
    last: Point,
}

/// `value.clamp(lo, hi)` that tolerates `lo > hi` by favouring `lo`.
fn clamp_lenient(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}

#[derive(Debug, Clone)]
pub struct CropEngine {
    rect: Rect,
    viewport: Size,
    mode: AspectRatioMode,
    handle_radius: f32,
    min_width: f32,
    min_height: f32,
    padding: f32,
    top_band: f32,
    bottom_band: f32,
    session: Option<CropSession>,
}

impl CropEngine {
    #[must_use]
    pub fn new(config: &CropConfig, display: &DisplayConfig) -> Self {
        let min_size = display.dp(config.min_size_dp);
        Self {
            rect: Rect::default(),
            viewport: Size::default(),
            mode: AspectRatioMode::Free,
            handle_radius: display.dp(config.handle_radius_dp),
            min_width: min_size,
            min_height: min_size,
            padding: display.dp(config.padding_dp),
            top_band: config.top_band,
            bottom_band: config.bottom_band,
            session: None,
        }
    }

    /// Current rectangle in viewport coordinates.
    #[must_use]
    pub fn crop_region(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn aspect_mode(&self) -> AspectRatioMode {
        self.mode
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Sets the viewport and reseeds the rectangle.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.reset();
    }

    /// Seeds a centred 4:3 rectangle inside the padded chrome band, then
    /// re-applies the current aspect mode.
    pub fn reset(&mut self) {
        self.session = None;
        let (w, h) = (self.viewport.width, self.viewport.height);
        if !self.viewport.is_valid() {
            self.rect = Rect::default();
            return;
        }
        let available_width = w - 2.0 * self.padding;
        let top = h * self.top_band;
        let available_height = h * self.bottom_band - top;
        if available_width <= 0.0 || available_height <= 0.0 {
            self.rect = self.viewport.to_rect();
        } else if available_width / available_height > CROP_INITIAL_ASPECT {
            let crop_height = available_height;
            let crop_width = crop_height * CROP_INITIAL_ASPECT;
            let left = (w - crop_width) / 2.0;
            self.rect = Rect::new(left, top, left + crop_width, top + crop_height);
        } else {
            let crop_width = available_width;
            let crop_height = crop_width / CROP_INITIAL_ASPECT;
            let top = (h - crop_height) / 2.0;
            self.rect = Rect::new(self.padding, top, self.padding + crop_width, top + crop_height);
        }
        if let Some(ratio) = self.mode.ratio() {
            self.apply_ratio(ratio);
        }
    }

    /// Switches the aspect constraint, reshaping the rectangle around its centre.
    pub fn set_aspect_ratio(&mut self, mode: AspectRatioMode) {
        self.mode = mode;
        if let Some(ratio) = mode.ratio() {
            self.apply_ratio(ratio);
        }
    }

    fn apply_ratio(&mut self, ratio: f32) {
        if !self.viewport.is_valid() || self.rect.is_empty() {
            return;
        }
        let center = self.rect.center();
        let (cw, ch) = (self.rect.width(), self.rect.height());

        // Largest rectangle of this ratio inside the current one.
        let (mut w, mut h) = if cw / ch > ratio {
            (ch * ratio, ch)
        } else {
            (cw, cw / ratio)
        };
        if w < self.min_width {
            w = self.min_width;
            h = w / ratio;
        }
        if h < self.min_height {
            h = self.min_height;
            w = h * ratio;
        }
        if w > self.viewport.width {
            w = self.viewport.width;
            h = w / ratio;
        }
        if h > self.viewport.height {
            h = self.viewport.height;
            w = h * ratio;
        }
        self.rect = self.slide_into_viewport(Rect::from_center(center, w, h));
        log::debug!(
            "crop reshaped to {:?} at ratio {}",
            self.rect,
            ratio
        );
    }

    fn slide_into_viewport(&self, r: Rect) -> Rect {
        let dx = clamp_lenient(r.left, 0.0, self.viewport.width - r.width()) - r.left;
        let dy = clamp_lenient(r.top, 0.0, self.viewport.height - r.height()) - r.top;
        r.offset(dx, dy)
    }

    /// Handles visible in the current mode: corners always, edge midpoints
    /// only in free mode.
    #[must_use]
    pub fn handles(&self) -> Vec<(CropHandle, Point)> {
        let free = self.mode == AspectRatioMode::Free;
        CORNERS
            .iter()
            .chain(EDGES.iter().filter(|_| free))
            .map(|&h| (h, h.position(&self.rect)))
            .collect()
    }

    /// Handle within the touch radius of `p`; corners win over edges.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<CropHandle> {
        if self.rect.is_empty() {
            return None;
        }
        let near = |h: &CropHandle| p.distance_to(h.position(&self.rect)) <= self.handle_radius;
        CORNERS.iter().find(|h| near(h)).copied().or_else(|| {
            if self.mode == AspectRatioMode::Free {
                EDGES.iter().find(|h| near(h)).copied()
            } else {
                None
            }
        })
    }

    /// Moves the whole rectangle, sliding along viewport edges rather than
    /// shrinking.
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.rect = self.slide_into_viewport(self.rect.offset(dx, dy));
    }

    /// Resizes by dragging `handle` to `touch`.
    pub fn resize(&mut self, handle: CropHandle, touch: Point) {
        if self.rect.is_empty() || !self.viewport.is_valid() {
            return;
        }
        match self.mode.ratio() {
            None => self.resize_free(handle, touch),
            Some(ratio) if handle.is_corner() => self.resize_fixed(handle, touch, ratio),
            Some(_) => {}
        }
    }

    fn resize_free(&mut self, handle: CropHandle, touch: Point) {
        let Rect {
            left,
            top,
            right,
            bottom,
        } = self.rect;
        let (vw, vh) = (self.viewport.width, self.viewport.height);
        let new_left = || clamp_lenient(touch.x, 0.0, right - self.min_width);
        let new_right = || clamp_lenient(touch.x, left + self.min_width, vw);
        let new_top = || clamp_lenient(touch.y, 0.0, bottom - self.min_height);
        let new_bottom = || clamp_lenient(touch.y, top + self.min_height, vh);

        let mut r = self.rect;
        match handle {
            CropHandle::TopLeft => {
                r.left = new_left();
                r.top = new_top();
            }
            CropHandle::TopRight => {
                r.right = new_right();
                r.top = new_top();
            }
            CropHandle::BottomLeft => {
                r.left = new_left();
                r.bottom = new_bottom();
            }
            CropHandle::BottomRight => {
                r.right = new_right();
                r.bottom = new_bottom();
            }
            CropHandle::Left => r.left = new_left(),
            CropHandle::Right => r.right = new_right(),
            CropHandle::Top => r.top = new_top(),
            CropHandle::Bottom => r.bottom = new_bottom(),
        }
        self.rect = r;
    }

    fn resize_fixed(&mut self, handle: CropHandle, touch: Point, ratio: f32) {
        let r = self.rect;
        let (vw, vh) = (self.viewport.width, self.viewport.height);
        // Anchor is the opposite corner; `grows_*` is the direction the moving
        // corner extends away from it.
        let (anchor, grows_left, grows_up) = match handle {
            CropHandle::TopLeft => (Point::new(r.right, r.bottom), true, true),
            CropHandle::TopRight => (Point::new(r.left, r.bottom), false, true),
            CropHandle::BottomLeft => (Point::new(r.right, r.top), true, false),
            CropHandle::BottomRight => (Point::new(r.left, r.top), false, false),
            _ => return,
        };

        let reach_x = if grows_left {
            anchor.x - touch.x
        } else {
            touch.x - anchor.x
        };
        let reach_y = if grows_up {
            anchor.y - touch.y
        } else {
            touch.y - anchor.y
        };
        let available_x = if grows_left { anchor.x } else { vw - anchor.x };
        let available_y = if grows_up { anchor.y } else { vh - anchor.y };

        let min_h = self.min_height.max(self.min_width / ratio);
        let max_h = available_y.min(available_x / ratio);
        if max_h < min_h {
            log::debug!("crop resize has no room at ratio {ratio}; keeping {:?}", self.rect);
            return;
        }
        let h = reach_y.max(reach_x / ratio).clamp(min_h, max_h);
        let w = h * ratio;

        let (left, right) = if grows_left {
            (anchor.x - w, anchor.x)
        } else {
            (anchor.x, anchor.x + w)
        };
        let (top, bottom) = if grows_up {
            (anchor.y - h, anchor.y)
        } else {
            (anchor.y, anchor.y + h)
        };
        self.rect = Rect::new(left, top, right, bottom);
    }

    /// Routes a pointer event. Returns whether it was consumed.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.viewport.is_valid() {
            return false;
        }
        match event {
            PointerEvent::Down { id, position } => {
                if self.session.is_some() {
                    return true;
                }
                let touch = match self.hit_test(*position) {
                    Some(handle) => CropTouch::Resize(handle),
                    None if self.rect.contains(*position) => CropTouch::Drag,
                    None => return false,
                };
                self.session = Some(CropSession {
                    pointer: *id,
                    touch,
                    last: *position,
                });
                true
            }
            PointerEvent::Move { samples } => {
                let Some(mut session) = self.session else {
                    return false;
                };
                if let Some(sample) = samples.iter().find(|s| s.id == session.pointer) {
                    let p = sample.position;
                    match session.touch {
                        CropTouch::Drag => self.drag_by(p.x - session.last.x, p.y - session.last.y),
                        CropTouch::Resize(handle) => self.resize(handle, p),
                    }
                    session.last = p;
                    self.session = Some(session);
                }
                true
            }
            PointerEvent::Up { id } => match self.session {
                Some(session) if session.pointer == *id => {
                    self.session = None;
                    true
                }
                Some(_) => true,
                None => false,
            },
            PointerEvent::Cancel => self.session.take().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    fn engine(viewport: Size) -> CropEngine {
        let mut e = CropEngine::new(&CropConfig::default(), &DisplayConfig::default());
        e.set_viewport(viewport);
        e
    }

    fn with_rect(rect: Rect) -> CropEngine {
        let mut e = engine(Size::new(1000.0, 1000.0));
        e.rect = rect;
        e
    }

    fn assert_rect_eq(a: Rect, b: Rect) {
        assert_abs_diff_eq!(a.left, b.left, epsilon = 1e-3);
        assert_abs_diff_eq!(a.top, b.top, epsilon = 1e-3);
        assert_abs_diff_eq!(a.right, b.right, epsilon = 1e-3);
        assert_abs_diff_eq!(a.bottom, b.bottom, epsilon = 1e-3);
    }

    fn assert_valid(e: &CropEngine) {
        let r = e.crop_region();
        assert!(e.viewport().to_rect().contains_rect(&r, 1e-3), "{r:?} escapes viewport");
        assert!(r.width() >= e.min_width - 1e-3 && r.height() >= e.min_height - 1e-3);
        if let Some(ratio) = e.aspect_mode().ratio() {
            assert_abs_diff_eq!(r.width() / r.height(), ratio, epsilon = 1e-4);
        }
    }

    #[test]
    fn initial_rect_is_four_by_three_inside_band() {
        let e = engine(Size::new(1000.0, 1000.0));
        let r = e.crop_region();
        assert_abs_diff_eq!(r.top, 150.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.height(), 700.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.width() / r.height(), 4.0 / 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(r.center().x, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn initial_rect_is_width_limited_on_portrait_viewport() {
        let e = engine(Size::new(400.0, 1000.0));
        let r = e.crop_region();
        assert_abs_diff_eq!(r.left, 24.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.width(), 352.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center().y, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn switching_to_square_keeps_centre_and_shorter_side() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.set_aspect_ratio(AspectRatioMode::Ratio1x1);
        assert_rect_eq(e.crop_region(), Rect::new(150.0, 100.0, 450.0, 400.0));
    }

    #[test]
    fn every_ratio_holds_after_switch() {
        for start in [
            Rect::new(100.0, 100.0, 500.0, 400.0),
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            Rect::new(900.0, 10.0, 1000.0, 990.0),
        ] {
            for mode in AspectRatioMode::ALL {
                let mut e = with_rect(start);
                e.set_aspect_ratio(mode);
                assert_valid(&e);
            }
        }
    }

    #[test]
    fn free_mode_restores_no_constraint_and_keeps_rect() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.set_aspect_ratio(AspectRatioMode::Free);
        assert_rect_eq(e.crop_region(), Rect::new(100.0, 100.0, 500.0, 400.0));
    }

    #[test]
    fn corner_hits_win_and_edges_only_exist_in_free_mode() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        assert_eq!(e.hit_test(Point::new(105.0, 95.0)), Some(CropHandle::TopLeft));
        assert_eq!(e.hit_test(Point::new(300.0, 110.0)), Some(CropHandle::Top));
        assert_eq!(e.handles().len(), 8);

        e.set_aspect_ratio(AspectRatioMode::Ratio4x3);
        assert_eq!(e.handles().len(), 4);
        let top_mid = e.crop_region().center().x;
        let top = e.crop_region().top;
        assert_eq!(e.hit_test(Point::new(top_mid, top)), None);
    }

    #[test]
    fn free_corner_resize_respects_minimum_and_viewport() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.resize(CropHandle::TopLeft, Point::new(490.0, 390.0));
        assert_rect_eq(e.crop_region(), Rect::new(440.0, 340.0, 500.0, 400.0));

        e.resize(CropHandle::BottomRight, Point::new(2000.0, -50.0));
        assert_rect_eq(e.crop_region(), Rect::new(440.0, 340.0, 1000.0, 400.0));
        assert_valid(&e);
    }

    #[test]
    fn free_edge_resize_moves_one_coordinate() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.resize(CropHandle::Right, Point::new(700.0, 0.0));
        assert_rect_eq(e.crop_region(), Rect::new(100.0, 100.0, 700.0, 400.0));
    }

    #[test]
    fn fixed_ratio_resize_anchors_opposite_corner() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.set_aspect_ratio(AspectRatioMode::Ratio4x3);
        let before = e.crop_region();
        e.resize(CropHandle::BottomRight, Point::new(before.right + 10.0, before.bottom + 90.0));
        let after = e.crop_region();
        assert_abs_diff_eq!(after.left, before.left, epsilon = 1e-3);
        assert_abs_diff_eq!(after.top, before.top, epsilon = 1e-3);
        assert_abs_diff_eq!(after.height(), before.height() + 90.0, epsilon = 1e-3);
        assert_valid(&e);
    }

    #[test]
    fn fixed_ratio_resize_stops_at_viewport() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.set_aspect_ratio(AspectRatioMode::Ratio16x9);
        e.resize(CropHandle::TopLeft, Point::new(-5000.0, -5000.0));
        let r = e.crop_region();
        assert!(r.left >= -1e-3 && r.top >= -1e-3);
        assert_valid(&e);

        e.resize(CropHandle::TopLeft, Point::new(5000.0, 5000.0));
        assert_valid(&e);
    }

    #[test]
    fn drag_slides_along_edges_without_resizing() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.drag_by(-300.0, 50.0);
        assert_rect_eq(e.crop_region(), Rect::new(0.0, 150.0, 400.0, 450.0));
        e.drag_by(900.0, 900.0);
        assert_rect_eq(e.crop_region(), Rect::new(600.0, 700.0, 1000.0, 1000.0));
    }

    #[test]
    fn pointer_routing_drags_body_and_ignores_outside() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        assert!(!e.handle_pointer(&PointerEvent::down(0, 900.0, 900.0)));
        assert!(e.handle_pointer(&PointerEvent::down(0, 300.0, 250.0)));
        assert!(e.handle_pointer(&PointerEvent::move_to(0, 320.0, 260.0)));
        assert!(e.handle_pointer(&PointerEvent::up(0)));
        assert!(!e.is_active());
        assert_rect_eq(e.crop_region(), Rect::new(120.0, 110.0, 520.0, 410.0));
    }

    #[test]
    fn pointer_routing_resizes_from_handle() {
        let mut e = with_rect(Rect::new(100.0, 100.0, 500.0, 400.0));
        e.handle_pointer(&PointerEvent::down(0, 500.0, 400.0));
        e.handle_pointer(&PointerEvent::move_to(0, 600.0, 450.0));
        assert_rect_eq(e.crop_region(), Rect::new(100.0, 100.0, 600.0, 450.0));
        assert!(e.handle_pointer(&PointerEvent::Cancel));
        assert!(!e.is_active());
    }
}

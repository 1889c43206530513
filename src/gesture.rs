// SPDX-License-Identifier: MPL-2.0
//! Pointer gesture recognition shared by the canvas and the overlay layers.
//!
//! A [`GestureTracker`] consumes raw pointer events and drives a
//! [`GestureTarget`]. One tracker exists per interactive surface; it holds only
//! the transient session (anchor pointers and start baselines) while the
//! target owns the state being manipulated.
//!
//! Precedence on the first pointer-down is decided by the target's
//! [`GestureTarget::hit_test`]: handle, then delete, then duplicate, then body.
//! A down on another element's body only switches selection. A down that hits
//! nothing is left unconsumed for the next responder.
//!
//! Start baselines are recaptured on every pointer-count transition, so going
//! from two pointers back to one re-anchors the pan at the remaining pointer
//! without a jump.
//!
//! A single pointer that goes down and up without travelling further than
//! [`TAP_SLOP`] is a tap. Two taps close in time and space form a double tap,
//! reported instead of the second single tap. Sequences that started on a
//! hot-zone or handle never report taps; their action already fired on down.

use crate::geometry::Point;
use std::time::{Duration, Instant};

/// Below this length a start radius/distance cannot define a ratio.
const MIN_BASELINE: f32 = 1e-3;

/// Travel in pixels beyond which a pointer sequence is no longer a tap.
pub const TAP_SLOP: f32 = 8.0;
/// Longest gap between the two taps of a double tap.
pub const DOUBLE_TAP_TIMEOUT: Duration = Duration::from_millis(300);
/// Largest distance between the two taps of a double tap.
pub const DOUBLE_TAP_SLOP: f32 = 100.0;

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub position: Point,
}

impl PointerSample {
    #[must_use]
    pub fn new(id: PointerId, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down { id: PointerId, position: Point },
    /// Current positions of every pointer that moved.
    Move { samples: Vec<PointerSample> },
    Up { id: PointerId },
    Cancel,
}

impl PointerEvent {
    #[must_use]
    pub fn down(id: PointerId, x: f32, y: f32) -> Self {
        PointerEvent::Down {
            id,
            position: Point::new(x, y),
        }
    }

    /// Single-pointer move.
    #[must_use]
    pub fn move_to(id: PointerId, x: f32, y: f32) -> Self {
        PointerEvent::Move {
            samples: vec![PointerSample::new(id, x, y)],
        }
    }

    #[must_use]
    pub fn up(id: PointerId) -> Self {
        PointerEvent::Up { id }
    }
}

/// Region of the target under a pointer-down, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Resize/rotate handle of the selected element.
    Handle,
    Delete,
    /// Duplicate hot-zone ("+1" for stickers, "new box" for text).
    Duplicate,
    /// Body of the selected element, or the pannable canvas.
    Body,
    /// Body of an unselected element; switches selection without dragging.
    Select(usize),
    Miss,
}

/// Coarse state reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Panning,
    /// Handle-based or two-pointer scale/rotate.
    Transform,
}

/// Scale/rotation relative to the baseline captured at transform start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSample {
    /// Current radius (or pointer distance) over the start value.
    pub scale_ratio: f32,
    /// Current angle minus start angle, in degrees.
    pub rotation_delta: f32,
    /// Pivot for handle mode, pointer midpoint for two-pointer mode.
    pub focus: Point,
}

/// Something a gesture can manipulate.
pub trait GestureTarget {
    fn hit_test(&self, position: Point) -> HitTarget;

    /// Fires a hot-zone action or a selection switch.
    fn perform(&mut self, _hit: HitTarget) {}

    /// First pointer of a sequence went down.
    fn on_pointer_down(&mut self) {}

    /// Anchor for handle-based transforms, usually the selected element's centre.
    fn transform_pivot(&self) -> Option<Point>;

    /// Whether a second pointer during a pan turns into a pinch/rotate.
    fn supports_dual_pointer(&self) -> bool;

    /// Captures the target's own baseline (scale, rotation) for a new transform.
    fn begin_transform(&mut self);

    fn apply_transform(&mut self, sample: TransformSample);

    fn pan_by(&mut self, delta: Point);

    /// The pointer sequence ended (all pointers up, or cancel).
    fn end_gesture(&mut self, _phase: GesturePhase) {}

    /// Single tap. Returns whether the target acted on it.
    fn on_tap(&mut self, _position: Point) -> bool {
        false
    }

    /// Second tap of a double tap. Returns whether the target acted on it.
    fn on_double_tap(&mut self, _position: Point) -> bool {
        false
    }
}

/// Normalizes an angle in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Session {
    #[default]
    Idle,
    /// The down fired an action; the rest of the sequence is absorbed.
    Swallowed,
    Panning {
        id: PointerId,
        last: Point,
    },
    Handle {
        id: PointerId,
        pivot: Point,
        start_radius: f32,
        start_angle: f32,
    },
    Dual {
        first: PointerId,
        second: PointerId,
        start_distance: f32,
        start_angle: f32,
    },
}

impl Session {
    fn phase(self) -> GesturePhase {
        match self {
            Session::Idle | Session::Swallowed => GesturePhase::Idle,
            Session::Panning { .. } => GesturePhase::Panning,
            Session::Handle { .. } | Session::Dual { .. } => GesturePhase::Transform,
        }
    }
}

/// Pointer sequence that may still end as a tap.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TapCandidate {
    id: PointerId,
    origin: Point,
}

/// Per-surface gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    pointers: Vec<PointerSample>,
    session: Session,
    tap: Option<TapCandidate>,
    /// Position and time of the last single tap, for double-tap pairing.
    last_tap: Option<(Point, Instant)>,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        self.session.phase()
    }

    #[must_use]
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// Drops any in-flight session without notifying a target.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.session = Session::Idle;
        self.tap = None;
        self.last_tap = None;
    }

    /// Feeds one event. Returns whether the event was consumed.
    pub fn handle_event<T>(&mut self, event: &PointerEvent, target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        self.handle_event_at(event, target, Instant::now())
    }

    /// Feeds one event that happened at `now`.
    pub fn handle_event_at<T>(
        &mut self,
        event: &PointerEvent,
        target: &mut T,
        now: Instant,
    ) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        match event {
            PointerEvent::Down { id, position } => self.on_down(*id, *position, target),
            PointerEvent::Move { samples } => self.on_move(samples, target),
            PointerEvent::Up { id } => self.on_up(*id, target, now),
            PointerEvent::Cancel => self.on_cancel(target),
        }
    }

    fn position_of(&self, id: PointerId) -> Option<Point> {
        self.pointers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.position)
    }

    fn on_down<T>(&mut self, id: PointerId, position: Point, target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        let first = self.pointers.is_empty();
        self.pointers.retain(|p| p.id != id);
        self.pointers.push(PointerSample { id, position });

        if first {
            target.on_pointer_down();
            return self.begin(id, position, target);
        }
        self.tap = None;

        match self.session {
            Session::Idle => false,
            Session::Panning { .. } if target.supports_dual_pointer() => {
                self.start_dual(target);
                true
            }
            _ => true,
        }
    }

    fn begin<T>(&mut self, id: PointerId, position: Point, target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        let hit = target.hit_test(position);
        log::trace!("gesture down {id} at ({}, {}) hit {hit:?}", position.x, position.y);
        self.tap = match hit {
            HitTarget::Body | HitTarget::Select(_) | HitTarget::Miss => {
                Some(TapCandidate { id, origin: position })
            }
            HitTarget::Handle | HitTarget::Delete | HitTarget::Duplicate => None,
        };
        match hit {
            HitTarget::Handle => match target.transform_pivot() {
                Some(pivot) => {
                    target.begin_transform();
                    self.session = Session::Handle {
                        id,
                        pivot,
                        start_radius: position.distance_to(pivot),
                        start_angle: position.angle_from(pivot),
                    };
                }
                None => self.session = Session::Panning { id, last: position },
            },
            HitTarget::Delete | HitTarget::Duplicate | HitTarget::Select(_) => {
                target.perform(hit);
                self.session = Session::Swallowed;
            }
            HitTarget::Body => self.session = Session::Panning { id, last: position },
            HitTarget::Miss => {
                self.session = Session::Idle;
                return false;
            }
        }
        true
    }

    fn start_dual<T>(&mut self, target: &mut T)
    where
        T: GestureTarget + ?Sized,
    {
        let (a, b) = (self.pointers[0], self.pointers[1]);
        target.begin_transform();
        self.session = Session::Dual {
            first: a.id,
            second: b.id,
            start_distance: a.position.distance_to(b.position),
            start_angle: b.position.angle_from(a.position),
        };
        log::trace!("gesture switched to two-pointer transform");
    }

    fn on_move<T>(&mut self, samples: &[PointerSample], target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        for sample in samples {
            if let Some(p) = self.pointers.iter_mut().find(|p| p.id == sample.id) {
                p.position = sample.position;
            }
            let strayed = self.tap.is_some_and(|t| {
                t.id == sample.id && t.origin.distance_to(sample.position) > TAP_SLOP
            });
            if strayed {
                self.tap = None;
            }
        }

        match self.session {
            Session::Idle => false,
            Session::Swallowed => true,
            Session::Panning { id, last } => {
                if let Some(current) = self.position_of(id) {
                    let delta = current - last;
                    if delta != Point::ZERO {
                        target.pan_by(delta);
                        self.session = Session::Panning { id, last: current };
                    }
                }
                true
            }
            Session::Handle {
                id,
                pivot,
                start_radius,
                start_angle,
            } => {
                if let Some(current) = self.position_of(id) {
                    let radius = current.distance_to(pivot);
                    target.apply_transform(TransformSample {
                        scale_ratio: ratio(radius, start_radius),
                        rotation_delta: current.angle_from(pivot) - start_angle,
                        focus: pivot,
                    });
                }
                true
            }
            Session::Dual {
                first,
                second,
                start_distance,
                start_angle,
            } => {
                if let (Some(a), Some(b)) = (self.position_of(first), self.position_of(second)) {
                    target.apply_transform(TransformSample {
                        scale_ratio: ratio(a.distance_to(b), start_distance),
                        rotation_delta: b.angle_from(a) - start_angle,
                        focus: a.midpoint(b),
                    });
                }
                true
            }
        }
    }

    fn on_up<T>(&mut self, id: PointerId, target: &mut T, now: Instant) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        self.pointers.retain(|p| p.id != id);
        let active = self.session != Session::Idle;

        if self.pointers.is_empty() {
            self.finish(target);
            let tapped = match self.tap.take() {
                Some(tap) if tap.id == id => self.report_tap(tap.origin, now, target),
                _ => false,
            };
            return active || tapped;
        }

        match self.session {
            Session::Dual { first, second, .. } if id == first || id == second => {
                if self.pointers.len() >= 2 {
                    self.start_dual(target);
                } else {
                    let remaining = self.pointers[0];
                    self.session = Session::Panning {
                        id: remaining.id,
                        last: remaining.position,
                    };
                    log::trace!("gesture re-anchored pan at pointer {}", remaining.id);
                }
            }
            Session::Panning { id: anchor, .. } if anchor == id => {
                let remaining = self.pointers[0];
                self.session = Session::Panning {
                    id: remaining.id,
                    last: remaining.position,
                };
            }
            Session::Handle { id: anchor, .. } if anchor == id => {
                self.session = Session::Swallowed;
            }
            _ => {}
        }
        active
    }

    fn on_cancel<T>(&mut self, target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        let active = self.session != Session::Idle;
        self.pointers.clear();
        self.tap = None;
        self.finish(target);
        active
    }

    fn report_tap<T>(&mut self, position: Point, now: Instant, target: &mut T) -> bool
    where
        T: GestureTarget + ?Sized,
    {
        let pairs_with_last = self.last_tap.is_some_and(|(last, at)| {
            now.saturating_duration_since(at) <= DOUBLE_TAP_TIMEOUT
                && last.distance_to(position) <= DOUBLE_TAP_SLOP
        });
        if pairs_with_last {
            self.last_tap = None;
            log::trace!("double tap at ({}, {})", position.x, position.y);
            target.on_double_tap(position)
        } else {
            self.last_tap = Some((position, now));
            target.on_tap(position)
        }
    }

    fn finish<T>(&mut self, target: &mut T)
    where
        T: GestureTarget + ?Sized,
    {
        let phase = self.session.phase();
        if phase != GesturePhase::Idle {
            target.end_gesture(phase);
        }
        self.session = Session::Idle;
    }
}

fn ratio(current: f32, start: f32) -> f32 {
    if start > MIN_BASELINE {
        current / start
    } else {
        1.0
    }
}

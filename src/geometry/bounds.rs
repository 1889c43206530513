// SPDX-License-Identifier: MPL-2.0
//! Boundary constraints for panned and zoomed content.
//!
//! Two policies keep the content rectangle in a sensible place:
//!
//! - **Soft** bounds tolerate up to `margin` pixels of drift or inset during an
//!   active drag, giving the elastic "pull past the edge" feel.
//! - **Hard** bounds centre content that fits and keep at least one edge flush
//!   for content that does not.
//!
//! The hard correction can be applied at once or eased in with a
//! [`SettleAnimation`].

use super::affine::{Point, Rect, Size};
use std::time::Duration;

/// Corrections below this magnitude are float residue and are dropped, which
/// makes a second hard correction a no-op.
const RESIDUE_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsMode {
    Soft { margin: f32 },
    Hard,
}

/// Offset that brings `content` back within `viewport` under `mode`.
///
/// Returns zero when the viewport has no area.
#[must_use]
pub fn corrective_offset(content: &Rect, viewport: Size, mode: BoundsMode) -> Point {
    if !viewport.is_valid() {
        return Point::ZERO;
    }
    let dx = axis_offset(content.left, content.right, viewport.width, mode);
    let dy = axis_offset(content.top, content.bottom, viewport.height, mode);
    Point::new(snap(dx), snap(dy))
}

fn axis_offset(start: f32, end: f32, extent: f32, mode: BoundsMode) -> f32 {
    let length = end - start;
    if length <= extent {
        let center_offset = extent * 0.5 - (start + end) * 0.5;
        match mode {
            BoundsMode::Hard => center_offset,
            BoundsMode::Soft { margin } => {
                if center_offset > margin {
                    center_offset - margin
                } else if center_offset < -margin {
                    center_offset + margin
                } else {
                    0.0
                }
            }
        }
    } else {
        let slack = match mode {
            BoundsMode::Hard => 0.0,
            BoundsMode::Soft { margin } => margin,
        };
        if start > slack {
            slack - start
        } else if end < extent - slack {
            extent - slack - end
        } else {
            0.0
        }
    }
}

fn snap(value: f32) -> f32 {
    if value.abs() < RESIDUE_EPSILON {
        0.0
    } else {
        value
    }
}

/// Accelerate-decelerate easing: slow start, fast middle, slow end.
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    ((t + 1.0) * std::f32::consts::PI).cos() * 0.5 + 0.5
}

/// Time-based interpolation of a total offset, handed out as incremental steps.
///
/// The sum of all steps equals `target` exactly once the animation finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleAnimation {
    target: Point,
    duration: Duration,
    elapsed: Duration,
    applied: Point,
}

impl SettleAnimation {
    #[must_use]
    pub fn new(target: Point, duration: Duration) -> Self {
        Self {
            target,
            duration,
            elapsed: Duration::ZERO,
            applied: Point::ZERO,
        }
    }

    #[must_use]
    pub fn target(&self) -> Point {
        self.target
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances the clock by `dt` and returns the offset to apply this tick.
    pub fn advance(&mut self, dt: Duration) -> Point {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            ease_in_out(self.elapsed.as_secs_f32() / self.duration.as_secs_f32())
        };
        let wanted = if self.is_finished() {
            self.target
        } else {
            Point::new(self.target.x * fraction, self.target.y * fraction)
        };
        let step = wanted - self.applied;
        self.applied = wanted;
        step
    }
}

// SPDX-License-Identifier: MPL-2.0
//! 2D affine transforms and the point/rectangle types they act on.
//!
//! A transform maps `(x, y)` to
//!
//! ```text
//!   X = sx * x + kx * y + tx
//!   Y = ky * x + sy * y + ty
//! ```
//!
//! in a y-down coordinate system, so positive rotation angles turn clockwise on
//! screen. The `post_*` operations append a step after the existing mapping,
//! which lets call sites read in application order:
//!
//! ```
//! use lightedit::geometry::{AffineTransform, Point};
//!
//! let mut t = AffineTransform::identity();
//! t.post_scale_about(2.0, Point::ZERO);
//! t.post_translate(10.0, 0.0);
//! assert_eq!(t.map_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
//! ```

use crate::error::{Error, Result};
use std::ops::{Add, Sub};

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

// =============================================================================
// Point
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Point) -> f32 {
        (other - self).length()
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle in degrees of the vector from `origin` to `self`, measured from +x.
    #[must_use]
    pub fn angle_from(self, origin: Point) -> f32 {
        let d = self - origin;
        d.y.atan2(d.x).to_degrees()
    }

    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// =============================================================================
// Size
// =============================================================================

/// Width and height of a viewport or content extent, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle stored as edges (`left <= right`, `top <= bottom`
/// for non-empty rectangles).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(center.x - hw, center.y - hh, center.x + hw, center.y + hh)
    }

    /// Smallest rectangle containing every point. Returns an empty rectangle at
    /// the origin for an empty slice.
    #[must_use]
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().skip(1).fold(
            Self::new(first.x, first.y, first.x, first.y),
            |acc, p| {
                Self::new(
                    acc.left.min(p.x),
                    acc.top.min(p.y),
                    acc.right.max(p.x),
                    acc.bottom.max(p.y),
                )
            },
        )
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Corners in clockwise order starting top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Whether `other` lies entirely inside `self`, allowing `slack` of float error.
    #[must_use]
    pub fn contains_rect(&self, other: &Rect, slack: f32) -> bool {
        other.left >= self.left - slack
            && other.top >= self.top - slack
            && other.right <= self.right + slack
            && other.bottom <= self.bottom + slack
    }

    /// Overlapping region, or `None` if the rectangles do not overlap with
    /// positive area.
    #[must_use]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    #[must_use]
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Grows (positive) or shrinks (negative) every edge by `amount`.
    #[must_use]
    pub fn outset(&self, amount: f32) -> Rect {
        Rect::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }
}

// =============================================================================
// PixelRect
// =============================================================================

/// Integer sub-rectangle of a raster, at least 1×1 when produced by crop mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies fully inside a `width`×`height` raster.
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

// =============================================================================
// AffineTransform
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub sx: f32,
    pub kx: f32,
    pub tx: f32,
    pub ky: f32,
    pub sy: f32,
    pub ty: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            sx: 1.0,
            kx: 0.0,
            tx: 0.0,
            ky: 0.0,
            sy: 1.0,
            ty: 0.0,
        }
    }

    #[must_use]
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            tx: dx,
            ty: dy,
            ..Self::identity()
        }
    }

    /// Uniform scale about `pivot`.
    #[must_use]
    pub fn scaling_about(factor: f32, pivot: Point) -> Self {
        Self {
            sx: factor,
            sy: factor,
            tx: pivot.x - factor * pivot.x,
            ty: pivot.y - factor * pivot.y,
            ..Self::identity()
        }
    }

    /// Rotation by `degrees` (clockwise on a y-down screen) about `pivot`.
    #[must_use]
    pub fn rotation_about(degrees: f32, pivot: Point) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            sx: cos,
            kx: -sin,
            ky: sin,
            sy: cos,
            tx: pivot.x - cos * pivot.x + sin * pivot.y,
            ty: pivot.y - sin * pivot.x - cos * pivot.y,
        }
    }

    /// Placement of a locally centred element: scale, then rotate, then move
    /// the local origin to `center`.
    #[must_use]
    pub fn placement(center: Point, scale: f32, rotation_degrees: f32) -> Self {
        let mut t = Self::scaling_about(scale, Point::ZERO);
        t.post_rotate_about(rotation_degrees, Point::ZERO);
        t.post_translate(center.x, center.y);
        t
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Returns the transform that applies `self` first and then `next`.
    #[must_use]
    pub fn then(&self, next: &AffineTransform) -> AffineTransform {
        let a = next;
        let b = self;
        AffineTransform {
            sx: a.sx * b.sx + a.kx * b.ky,
            kx: a.sx * b.kx + a.kx * b.sy,
            tx: a.sx * b.tx + a.kx * b.ty + a.tx,
            ky: a.ky * b.sx + a.sy * b.ky,
            sy: a.ky * b.kx + a.sy * b.sy,
            ty: a.ky * b.tx + a.sy * b.ty + a.ty,
        }
    }

    pub fn post_concat(&mut self, next: &AffineTransform) {
        *self = self.then(next);
    }

    pub fn pre_concat(&mut self, first: &AffineTransform) {
        *self = first.then(self);
    }

    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.tx += dx;
        self.ty += dy;
    }

    pub fn post_scale_about(&mut self, factor: f32, pivot: Point) {
        self.post_concat(&Self::scaling_about(factor, pivot));
    }

    pub fn post_rotate_about(&mut self, degrees: f32, pivot: Point) {
        self.post_concat(&Self::rotation_about(degrees, pivot));
    }

    #[must_use]
    pub fn determinant(&self) -> f32 {
        self.sx * self.sy - self.kx * self.ky
    }

    /// Uniform scale magnitude of the linear part.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.sx.hypot(self.ky)
    }

    #[must_use]
    pub fn translation_part(&self) -> Point {
        Point::new(self.tx, self.ty)
    }

    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        Point::new(
            self.sx * p.x + self.kx * p.y + self.tx,
            self.ky * p.x + self.sy * p.y + self.ty,
        )
    }

    #[must_use]
    pub fn map_points<const N: usize>(&self, points: [Point; N]) -> [Point; N] {
        points.map(|p| self.map_point(p))
    }

    /// Axis-aligned bounding box of the four mapped corners.
    #[must_use]
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        Rect::bounding(&self.map_points(rect.corners()))
    }

    /// Inverse mapping. Fails with [`Error::SingularTransform`] when the linear
    /// part has collapsed.
    pub fn invert(&self) -> Result<AffineTransform> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(Error::SingularTransform);
        }
        let inv_det = 1.0 / det;
        let sx = self.sy * inv_det;
        let kx = -self.kx * inv_det;
        let ky = -self.ky * inv_det;
        let sy = self.sx * inv_det;
        Ok(AffineTransform {
            sx,
            kx,
            ky,
            sy,
            tx: -(sx * self.tx + kx * self.ty),
            ty: -(ky * self.tx + sy * self.ty),
        })
    }

    /// Converts to the rasterizer's transform type.
    #[must_use]
    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(self.sx, self.ky, self.kx, self.sy, self.tx, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    fn assert_point_eq(a: Point, b: Point) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-3);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-3);
    }

    #[test]
    fn invert_round_trips_points_over_scale_and_rotation_grid() {
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(120.5, -33.0),
            Point::new(-800.0, 640.0),
        ];
        for scale in [0.3_f32, 0.5, 1.0, 2.0, 4.0] {
            for rotation in [0.0_f32, 37.0, 90.0, 181.0, 359.0] {
                let t = AffineTransform::placement(Point::new(500.0, 250.0), scale, rotation);
                let inv = t.invert().expect("bounded scale is invertible");
                for p in samples {
                    assert_point_eq(inv.map_point(t.map_point(p)), p);
                }
            }
        }
    }

    #[test]
    fn zero_scale_is_singular() {
        let t = AffineTransform::scaling_about(0.0, Point::ZERO);
        assert!(matches!(t.invert(), Err(Error::SingularTransform)));
    }

    #[test]
    fn scale_about_pivot_keeps_pivot_fixed() {
        let pivot = Point::new(40.0, 60.0);
        let mut t = AffineTransform::translation(5.0, 5.0);
        t.post_scale_about(3.0, pivot);
        let before = AffineTransform::translation(5.0, 5.0)
            .invert()
            .expect("invertible")
            .map_point(pivot);
        assert_point_eq(t.map_point(before), pivot);
    }

    #[test]
    fn rotate_about_pivot_turns_clockwise_on_screen() {
        let pivot = Point::new(10.0, 10.0);
        let t = AffineTransform::rotation_about(90.0, pivot);
        assert_point_eq(t.map_point(pivot), pivot);
        // A point to the right of the pivot moves below it.
        assert_point_eq(t.map_point(Point::new(20.0, 10.0)), Point::new(10.0, 20.0));
    }

    #[test]
    fn map_rect_returns_bounding_box_of_rotated_corners() {
        let t = AffineTransform::rotation_about(45.0, Point::ZERO);
        let r = t.map_rect(&Rect::from_center(Point::ZERO, 2.0, 2.0));
        let half_diag = 2.0_f32.sqrt();
        assert_abs_diff_eq!(r.left, -half_diag, epsilon = 1e-4);
        assert_abs_diff_eq!(r.right, half_diag, epsilon = 1e-4);
        assert_abs_diff_eq!(r.top, -half_diag, epsilon = 1e-4);
        assert_abs_diff_eq!(r.bottom, half_diag, epsilon = 1e-4);
    }

    #[test]
    fn then_applies_self_first() {
        let scale = AffineTransform::scaling_about(2.0, Point::ZERO);
        let shift = AffineTransform::translation(10.0, 0.0);
        assert_point_eq(
            scale.then(&shift).map_point(Point::new(1.0, 0.0)),
            Point::new(12.0, 0.0),
        );
        assert_point_eq(
            shift.then(&scale).map_point(Point::new(1.0, 0.0)),
            Point::new(22.0, 0.0),
        );
    }

    #[test]
    fn pre_concat_applies_argument_first() {
        let mut t = AffineTransform::scaling_about(2.0, Point::ZERO);
        t.pre_concat(&AffineTransform::translation(-1.0, -1.0));
        assert_point_eq(t.map_point(Point::new(1.0, 1.0)), Point::ZERO);
    }

    #[test]
    fn placement_reports_scale_factor() {
        let t = AffineTransform::placement(Point::new(3.0, 4.0), 1.5, 30.0);
        assert_abs_diff_eq!(t.scale_factor(), 1.5, epsilon = 1e-5);
        assert_point_eq(t.translation_part(), Point::new(3.0, 4.0));
    }

    #[test]
    fn rect_intersection_and_emptiness() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 20.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 20.0, 10.0)), None);
        assert!(Rect::new(3.0, 3.0, 3.0, 9.0).is_empty());
    }

    #[test]
    fn point_angle_and_distance() {
        let origin = Point::new(1.0, 1.0);
        assert_abs_diff_eq!(Point::new(1.0, 3.0).angle_from(origin), 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(Point::new(4.0, 5.0).distance_to(origin), 5.0, epsilon = 1e-5);
    }
}

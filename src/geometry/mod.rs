// SPDX-License-Identifier: MPL-2.0
//! Planar geometry shared by the canvas, crop and overlay layers.
//!
//! - [`affine`]: Affine transforms, points, sizes and rectangles
//! - [`bounds`]: Soft/hard boundary correction and the settle animation

pub mod affine;
pub mod bounds;

pub use affine::{AffineTransform, PixelRect, Point, Rect, Size};
pub use bounds::{corrective_offset, BoundsMode, SettleAnimation};

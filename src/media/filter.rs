// SPDX-License-Identifier: MPL-2.0
//! Named colour filters.
//!
//! Each filter is a fixed 4×5 colour matrix applied to unpremultiplied RGBA:
//! `R' = m0·R + m1·G + m2·B + m3·A + m4` and so on per row, clamped to
//! `[0, 255]`.

use crate::error::Result;
use crate::media::alloc_rgba;
use image_rs::RgbaImage;

/// Luma weights used by the saturation matrix.
const SAT_LUMA: [f32; 3] = [0.213, 0.715, 0.072];

/// Luma weights of the reference per-pixel grayscale conversion.
const GRAY_LUMA: [f32; 3] = [0.3, 0.59, 0.11];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FilterKind {
    #[default]
    Original,
    BlackWhite,
    Vintage,
    Fresh,
    Warm,
    Cool,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Original,
        FilterKind::BlackWhite,
        FilterKind::Vintage,
        FilterKind::Fresh,
        FilterKind::Warm,
        FilterKind::Cool,
    ];

    /// Stable identifier used in logs and by UI layers.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            FilterKind::Original => "original",
            FilterKind::BlackWhite => "black-white",
            FilterKind::Vintage => "vintage",
            FilterKind::Fresh => "fresh",
            FilterKind::Warm => "warm",
            FilterKind::Cool => "cool",
        }
    }

    /// The colour matrix for this filter, or `None` for the original image.
    #[must_use]
    pub fn matrix(self) -> Option<ColorMatrix> {
        match self {
            FilterKind::Original => None,
            FilterKind::BlackWhite => Some(ColorMatrix::saturation(0.0)),
            FilterKind::Vintage => Some(
                ColorMatrix::new([
                    0.393, 0.769, 0.189, 0.0, 0.0, //
                    0.349, 0.686, 0.168, 0.0, 0.0, //
                    0.272, 0.534, 0.131, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0, 0.0,
                ])
                .then(&ColorMatrix::saturation(0.8)),
            ),
            FilterKind::Fresh => Some(ColorMatrix::saturation(1.2).then(&ColorMatrix::new([
                1.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 1.1, 0.0, 5.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ]))),
            FilterKind::Warm => Some(ColorMatrix::new([
                1.1, 0.0, 0.0, 0.0, 10.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.9, 0.0, -10.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ])),
            FilterKind::Cool => Some(ColorMatrix::new([
                0.9, 0.0, 0.0, 0.0, -10.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 1.1, 0.0, 10.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ])),
        }
    }
}

/// Row-major 4×5 colour matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([f32; 20]);

impl ColorMatrix {
    #[must_use]
    pub const fn new(values: [f32; 20]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::saturation(1.0)
    }

    /// Saturation scaling; 0 is grayscale, 1 is identity.
    #[must_use]
    pub fn saturation(s: f32) -> Self {
        let inv = 1.0 - s;
        let [r, g, b] = SAT_LUMA.map(|w| w * inv);
        Self([
            r + s, g, b, 0.0, 0.0, //
            r, g + s, b, 0.0, 0.0, //
            r, g, b + s, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Matrix applying `self` first and then `next`.
    #[must_use]
    pub fn then(&self, next: &ColorMatrix) -> ColorMatrix {
        let a = &next.0;
        let b = &self.0;
        let mut out = [0.0f32; 20];
        for row in 0..4 {
            for col in 0..5 {
                let mut v = 0.0;
                for k in 0..4 {
                    v += a[row * 5 + k] * b[k * 5 + col];
                }
                if col == 4 {
                    v += a[row * 5 + 4];
                }
                out[row * 5 + col] = v;
            }
        }
        ColorMatrix(out)
    }

    #[must_use]
    pub fn apply(&self, px: [u8; 4]) -> [u8; 4] {
        let m = &self.0;
        let input = px.map(f32::from);
        let mut out = [0u8; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            let r = &m[row * 5..row * 5 + 5];
            let v = r[0] * input[0] + r[1] * input[1] + r[2] * input[2] + r[3] * input[3] + r[4];
            *slot = v.round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

/// Returns a filtered copy; the source is never modified.
pub fn apply_filter(source: &RgbaImage, kind: FilterKind) -> Result<RgbaImage> {
    let mut out = alloc_rgba(source.width(), source.height())?;
    match kind.matrix() {
        None => out.copy_from_slice(source.as_raw()),
        Some(matrix) => {
            for (dst, src) in out.pixels_mut().zip(source.pixels()) {
                dst.0 = matrix.apply(src.0);
            }
        }
    }
    log::debug!("applied filter {}", kind.id());
    Ok(out)
}

/// Reference grayscale conversion with `0.3 R + 0.59 G + 0.11 B`, truncated.
pub fn to_grayscale(source: &RgbaImage) -> Result<RgbaImage> {
    let mut out = alloc_rgba(source.width(), source.height())?;
    for (dst, src) in out.pixels_mut().zip(source.pixels()) {
        let [r, g, b, a] = src.0;
        let gray = GRAY_LUMA[0] * f32::from(r) + GRAY_LUMA[1] * f32::from(g) + GRAY_LUMA[2] * f32::from(b);
        let gray = gray as u8;
        dst.0 = [gray, gray, gray, a];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_rs::Rgba;

    #[test]
    fn original_is_a_copy() {
        let src = RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 80, 9, 200]));
        assert_eq!(apply_filter(&src, FilterKind::Original).expect("filter"), src);
    }

    #[test]
    fn black_white_equalizes_channels() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 50, 10, 255]));
        let out = apply_filter(&src, FilterKind::BlackWhite).expect("filter");
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn warm_boosts_red_and_cuts_blue() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let out = apply_filter(&src, FilterKind::Warm).expect("filter");
        assert_eq!(out.get_pixel(0, 0).0, [120, 100, 80, 255]);
    }

    #[test]
    fn cool_is_mirror_of_warm() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let out = apply_filter(&src, FilterKind::Cool).expect("filter");
        assert_eq!(out.get_pixel(0, 0).0, [80, 100, 120, 255]);
    }

    #[test]
    fn identity_composition() {
        let m = FilterKind::Warm.matrix().expect("matrix");
        assert_eq!(m.then(&ColorMatrix::identity()), m);
        assert_eq!(ColorMatrix::identity().then(&m), m);
    }

    #[test]
    fn composition_applies_first_then_next() {
        let px = [90, 140, 30, 255];
        let a = FilterKind::Warm.matrix().expect("matrix");
        let b = ColorMatrix::saturation(0.5);
        let composed = a.then(&b).apply(px);
        let stepwise = b.apply(a.apply(px));
        for (c, s) in composed.iter().zip(stepwise.iter()) {
            assert!((i16::from(*c) - i16::from(*s)).abs() <= 1);
        }
    }

    #[test]
    fn grayscale_uses_reference_weights() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 50, 9]));
        let out = to_grayscale(&src).expect("gray");
        // 30 + 118 + 5.5 = 153.5
        assert_eq!(out.get_pixel(0, 0).0, [153, 153, 153, 9]);
    }

    #[test]
    fn every_filter_preserves_dimensions_and_alpha() {
        let src = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128]));
        for kind in FilterKind::ALL {
            let out = apply_filter(&src, kind).expect("filter");
            assert_eq!(out.dimensions(), (3, 2));
            assert_eq!(out.get_pixel(1, 1).0[3], 128, "{}", kind.id());
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Text measurement and glyph rasterization for text overlays and the watermark.
//!
//! Layout is a centred block: lines are split on `\n`, each line is centred on
//! x = 0 and the block is centred on y = 0. The baseline of line `i` sits at
//! `-total_height / 2 + line_height * 0.8 + i * line_height`.
//!
//! Glyph sources are tried in order: configured font files, the system's
//! sans-serif/serif/monospace families, then the DejaVu Sans face built into
//! the crate.

use crate::domain::editing::Typeface;
use crate::error::{Error, Result};
use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// DejaVu Sans, used when neither configured nor system fonts load.
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Baseline position within a line, as a fraction of the line height.
pub const BASELINE_FRACTION: f32 = 0.8;

/// Measured extent of a multi-line text block, in pixels at the requested size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub line_widths: Vec<f32>,
    pub max_line_width: f32,
    pub line_height: f32,
}

impl TextMetrics {
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_widths.len()
    }

    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.line_height * self.line_count() as f32
    }

    /// Baseline y of line `index`, relative to the block centre.
    #[must_use]
    pub fn baseline(&self, index: usize) -> f32 {
        -self.total_height() / 2.0
            + self.line_height * BASELINE_FRACTION
            + index as f32 * self.line_height
    }
}

/// 8-bit coverage of a rasterized text block.
///
/// `left`/`top` locate the mask's top-left pixel relative to the block centre.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub left: f32,
    pub top: f32,
    pub coverage: Vec<u8>,
}

/// Measures and rasterizes text blocks.
pub trait TextShaper: Send + Sync + fmt::Debug {
    fn measure(&self, text: &str, size_px: f32, typeface: Typeface) -> TextMetrics;

    /// Returns `None` when nothing in `text` has an outline.
    fn rasterize(&self, text: &str, size_px: f32, typeface: Typeface) -> Option<GlyphMask>;

    /// Whether this shaper draws glyphs at all.
    fn can_rasterize(&self) -> bool {
        true
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    // An empty line still takes the width of a space.
    text.split('\n').map(|line| if line.is_empty() { " " } else { line })
}

// =============================================================================
// Font-backed shaper
// =============================================================================

/// Shaper backed by real font outlines, one face per [`Typeface`] slot.
///
/// Missing slots fall back to the first face.
#[derive(Clone)]
pub struct FontShaper {
    faces: Vec<FontArc>,
}

impl fmt::Debug for FontShaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontShaper")
            .field("faces", &self.faces.len())
            .finish()
    }
}

impl FontShaper {
    /// Builds a shaper from already loaded faces, indexed like [`Typeface::index`].
    pub fn from_fonts(faces: Vec<FontArc>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::Font("no font faces provided".into()));
        }
        Ok(Self { faces })
    }

    /// Loads font files (TTF/OTF) in typeface order.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut faces = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = std::fs::read(path)?;
            let face = FontArc::try_from_vec(bytes)
                .map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
            faces.push(face);
        }
        Self::from_fonts(faces)
    }

    /// Shaper over the built-in DejaVu Sans face, for every typeface.
    pub fn bundled() -> Result<Self> {
        let face = FontArc::try_from_slice(BUNDLED_FONT)
            .map_err(|e| Error::Font(format!("bundled font: {e}")))?;
        Self::from_fonts(vec![face])
    }

    /// Looks up the system's generic families in typeface order.
    ///
    /// A missing serif or monospace family reuses the sans-serif face.
    pub fn system() -> Result<Self> {
        let source = SystemSource::new();
        let mut faces: Vec<FontArc> = Vec::with_capacity(Typeface::ALL.len());
        for typeface in Typeface::ALL {
            match load_system_family(&source, generic_family(typeface)) {
                Ok(face) => faces.push(face),
                Err(err) => match faces.first().cloned() {
                    Some(fallback) => {
                        log::debug!("{typeface:?} system font unavailable ({err}), using sans-serif");
                        faces.push(fallback);
                    }
                    None => return Err(err),
                },
            }
        }
        Self::from_fonts(faces)
    }

    fn face(&self, typeface: Typeface) -> &FontArc {
        self.faces
            .get(typeface.index())
            .unwrap_or(&self.faces[0])
    }

    fn line_width(font: &FontArc, line: &str, size_px: f32) -> f32 {
        let scaled = font.as_scaled(size_px);
        let mut width = 0.0f32;
        let mut last: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = last {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            last = Some(id);
        }
        width
    }
}

impl TextShaper for FontShaper {
    fn measure(&self, text: &str, size_px: f32, typeface: Typeface) -> TextMetrics {
        let font = self.face(typeface);
        let scaled = font.as_scaled(size_px);
        let line_widths: Vec<f32> = split_lines(text)
            .map(|line| Self::line_width(font, line, size_px))
            .collect();
        let max_line_width = line_widths.iter().copied().fold(0.0, f32::max);
        TextMetrics {
            line_widths,
            max_line_width,
            line_height: scaled.height() + scaled.line_gap(),
        }
    }

    fn rasterize(&self, text: &str, size_px: f32, typeface: Typeface) -> Option<GlyphMask> {
        let font = self.face(typeface);
        let scaled = font.as_scaled(size_px);
        let metrics = self.measure(text, size_px, typeface);

        // Outlined glyphs with their pixel bounds, positioned in block space.
        let mut outlined = Vec::new();
        for (index, line) in split_lines(text).enumerate() {
            let baseline = metrics.baseline(index);
            let mut x = -metrics.line_widths[index] / 2.0;
            let mut last: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = font.glyph_id(ch);
                if let Some(prev) = last {
                    x += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(size_px, point(x, baseline));
                if let Some(o) = font.outline_glyph(glyph) {
                    outlined.push(o);
                }
                x += scaled.h_advance(id);
                last = Some(id);
            }
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for o in &outlined {
            let b = o.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
        if outlined.is_empty() || max_x <= min_x || max_y <= min_y {
            return None;
        }

        let left = min_x.floor();
        let top = min_y.floor();
        let width = (max_x.ceil() - left) as u32;
        let height = (max_y.ceil() - top) as u32;
        let mut coverage = vec![0u8; width as usize * height as usize];

        for o in &outlined {
            let b = o.px_bounds();
            let ox = (b.min.x - left) as i64;
            let oy = (b.min.y - top) as i64;
            o.draw(|px, py, c| {
                let x = ox + i64::from(px);
                let y = oy + i64::from(py);
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    return;
                }
                let idx = y as usize * width as usize + x as usize;
                let v = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                coverage[idx] = coverage[idx].max(v);
            });
        }

        Some(GlyphMask {
            width,
            height,
            left,
            top,
            coverage,
        })
    }
}

// =============================================================================
// Approximate shaper
// =============================================================================

/// Average advance of a glyph, as a fraction of the font size.
const APPROX_ADVANCE: f32 = 0.55;
/// Line spacing as a fraction of the font size.
const APPROX_LINE_HEIGHT: f32 = 1.17;

/// Metric-only shaper used when no font file is configured.
///
/// Geometry (bounds, hot-zones, hit-testing) stays fully functional; text is
/// not drawn into exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateShaper;

impl TextShaper for ApproximateShaper {
    fn measure(&self, text: &str, size_px: f32, _typeface: Typeface) -> TextMetrics {
        let line_widths: Vec<f32> = split_lines(text)
            .map(|line| line.chars().count() as f32 * size_px * APPROX_ADVANCE)
            .collect();
        let max_line_width = line_widths.iter().copied().fold(0.0, f32::max);
        TextMetrics {
            line_widths,
            max_line_width,
            line_height: size_px * APPROX_LINE_HEIGHT,
        }
    }

    fn rasterize(&self, _text: &str, _size_px: f32, _typeface: Typeface) -> Option<GlyphMask> {
        None
    }

    fn can_rasterize(&self) -> bool {
        false
    }
}

fn generic_family(typeface: Typeface) -> FamilyName {
    match typeface {
        Typeface::Default => FamilyName::SansSerif,
        Typeface::Serif => FamilyName::Serif,
        Typeface::Monospace => FamilyName::Monospace,
    }
}

fn load_system_family(source: &SystemSource, family: FamilyName) -> Result<FontArc> {
    let handle = source
        .select_best_match(&[family], &Properties::new())
        .map_err(|e| Error::Font(format!("no system match: {e}")))?;
    let font = handle
        .load()
        .map_err(|e| Error::Font(format!("cannot load system font: {e}")))?;
    let data = font
        .copy_font_data()
        .ok_or_else(|| Error::Font(format!("{} has no font data", font.full_name())))?;
    FontArc::try_from_vec((*data).clone()).map_err(|e| Error::Font(e.to_string()))
}

/// Builds the shaper for the configured font files.
///
/// Falls back to system fonts, then to the bundled face. The approximate
/// shaper is only returned when every source fails.
pub fn shaper_from_config(fonts: &[PathBuf]) -> Arc<dyn TextShaper> {
    if !fonts.is_empty() {
        match FontShaper::from_paths(fonts) {
            Ok(shaper) => return Arc::new(shaper),
            Err(err) => log::warn!("failed to load configured text fonts: {err}"),
        }
    }
    match FontShaper::system() {
        Ok(shaper) => return Arc::new(shaper),
        Err(err) => log::debug!("system fonts unavailable: {err}"),
    }
    match FontShaper::bundled() {
        Ok(shaper) => Arc::new(shaper),
        Err(err) => {
            log::error!("no usable font, text cannot be drawn: {err}");
            Arc::new(ApproximateShaper)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn approximate_measure_splits_lines() {
        let m = ApproximateShaper.measure("abcd\nab", 20.0, Typeface::Default);
        assert_eq!(m.line_count(), 2);
        assert_abs_diff_eq!(m.line_widths[0], 44.0, epsilon = 1e-4);
        assert_abs_diff_eq!(m.line_widths[1], 22.0, epsilon = 1e-4);
        assert_abs_diff_eq!(m.max_line_width, 44.0, epsilon = 1e-4);
        assert_abs_diff_eq!(m.total_height(), 2.0 * 20.0 * 1.17, epsilon = 1e-4);
    }

    #[test]
    fn empty_line_measures_as_space() {
        let m = ApproximateShaper.measure("a\n\nb", 10.0, Typeface::Serif);
        assert_eq!(m.line_count(), 3);
        assert!(m.line_widths[1] > 0.0);
    }

    #[test]
    fn first_baseline_follows_fraction() {
        let m = TextMetrics {
            line_widths: vec![10.0, 10.0],
            max_line_width: 10.0,
            line_height: 20.0,
        };
        assert_abs_diff_eq!(m.baseline(0), -20.0 + 16.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.baseline(1), -20.0 + 36.0, epsilon = 1e-5);
    }

    #[test]
    fn approximate_shaper_does_not_rasterize() {
        assert!(ApproximateShaper
            .rasterize("hi", 18.0, Typeface::Default)
            .is_none());
    }

    #[test]
    fn font_shaper_requires_a_face() {
        assert!(matches!(FontShaper::from_fonts(Vec::new()), Err(Error::Font(_))));
    }

    #[test]
    fn invalid_font_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").expect("write");
        let err = FontShaper::from_paths(&[path]).expect_err("should fail");
        assert_eq!(err.key(), "error-font");
    }

    #[test]
    fn missing_font_files_still_give_a_drawing_shaper() {
        let shaper = shaper_from_config(&[PathBuf::from("/nonexistent/font.ttf")]);
        assert!(shaper.can_rasterize());
        assert!(shaper.rasterize("x", 12.0, Typeface::Default).is_some());
    }

    #[test]
    fn default_config_shaper_draws_text() {
        let shaper = shaper_from_config(&[]);
        assert!(shaper.can_rasterize());
        let mask = shaper
            .rasterize("Hello", 24.0, Typeface::Default)
            .expect("glyphs");
        assert!(mask.coverage.iter().any(|&c| c > 0));
    }

    #[test]
    fn font_measure_grows_with_text_and_size() {
        let shaper = FontShaper::bundled().expect("bundled font");
        let short = shaper.measure("Hi", 20.0, Typeface::Default);
        let long = shaper.measure("Hi there", 20.0, Typeface::Default);
        let big = shaper.measure("Hi", 40.0, Typeface::Default);
        assert!(short.max_line_width > 0.0);
        assert!(long.max_line_width > short.max_line_width);
        assert_abs_diff_eq!(big.max_line_width, 2.0 * short.max_line_width, epsilon = 0.5);
        assert_abs_diff_eq!(big.line_height, 2.0 * short.line_height, epsilon = 0.5);

        let two = shaper.measure("Hi\nthere", 20.0, Typeface::Monospace);
        assert_eq!(two.line_count(), 2);
        assert_abs_diff_eq!(two.total_height(), 2.0 * short.line_height, epsilon = 1e-3);
    }

    #[test]
    fn font_rasterize_covers_a_centred_block() {
        let shaper = FontShaper::bundled().expect("bundled font");
        let metrics = shaper.measure("HELLO", 32.0, Typeface::Default);
        let mask = shaper
            .rasterize("HELLO", 32.0, Typeface::Default)
            .expect("glyphs");
        assert_eq!(mask.coverage.len(), (mask.width * mask.height) as usize);
        assert!(mask.coverage.iter().any(|&c| c == 255));
        // Ink stays within the measured block, centred on the origin.
        assert!(mask.left < 0.0 && mask.left + mask.width as f32 > 0.0);
        assert!(mask.width as f32 <= metrics.max_line_width + 2.0);
        assert!(mask.top < 0.0);
        assert!(mask.top >= -metrics.total_height() / 2.0 - 1.0);
    }

    #[test]
    fn whitespace_has_no_glyphs() {
        let shaper = FontShaper::bundled().expect("bundled font");
        assert!(shaper.rasterize("   ", 20.0, Typeface::Default).is_none());
        assert!(shaper.measure("   ", 20.0, Typeface::Default).max_line_width > 0.0);
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Flattening of the editing canvas into one raster.
//!
//! A [`Scene`] is a value snapshot of everything visible on the canvas: the
//! base image with its display transform, overlay elements in ascending
//! z-order and an optional watermark. It owns or shares everything it needs,
//! so it can be rendered on a worker thread while the interactive state keeps
//! changing.

use crate::domain::editing::Typeface;
use crate::error::{Error, Result};
use crate::geometry::{AffineTransform, Point};
use crate::media::alloc_rgba;
use crate::overlay::{ElementKind, GlyphMask, OverlayElement, OverlayLayer, TextShaper};
use image_rs::RgbaImage;
use std::sync::Arc;
use tiny_skia::{Color, ColorU8, FilterQuality, Pixmap, PixmapPaint};

/// Shadow offset under the watermark, in pixels.
const SHADOW_OFFSET: f32 = 2.0;
/// Box blur radius applied to the watermark shadow.
const SHADOW_BLUR_RADIUS: u32 = 2;
/// Shadow opacity (`0x80`).
const SHADOW_ALPHA: u8 = 0x80;

/// One overlay element with the transform that places its content on the
/// canvas.
#[derive(Debug, Clone)]
pub struct OverlayItem {
    pub kind: ElementKind,
    /// Text: block space to canvas. Sticker: bitmap pixels to canvas.
    pub transform: AffineTransform,
    pub text_size_px: Option<f32>,
}

impl OverlayItem {
    #[must_use]
    pub fn new(element: &OverlayElement, transform: AffineTransform, scaled_density: f32) -> Self {
        Self {
            kind: element.kind.clone(),
            transform,
            text_size_px: element.text_size_px(scaled_density),
        }
    }

    /// Items of `layer` in ascending z-order. Selection decorations are never
    /// part of an item.
    #[must_use]
    pub fn from_layer(layer: &OverlayLayer) -> Vec<Self> {
        layer
            .elements()
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let geometry = layer.geometry(index)?;
                Some(Self::new(element, geometry.transform, layer.scaled_density()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub size_px: f32,
    pub padding_px: f32,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub base: Option<(Arc<RgbaImage>, AffineTransform)>,
    pub overlays: Vec<OverlayItem>,
    pub watermark: Option<Watermark>,
    shaper: Arc<dyn TextShaper>,
}

impl Scene {
    #[must_use]
    pub fn new(width: u32, height: u32, shaper: Arc<dyn TextShaper>) -> Self {
        Self {
            width,
            height,
            base: None,
            overlays: Vec::new(),
            watermark: None,
            shaper,
        }
    }

    #[must_use]
    pub fn with_base(mut self, image: Arc<RgbaImage>, transform: AffineTransform) -> Self {
        self.base = Some((image, transform));
        self
    }

    /// Appends the layer's elements above everything added so far.
    #[must_use]
    pub fn with_layer(mut self, layer: &OverlayLayer) -> Self {
        self.overlays.extend(OverlayItem::from_layer(layer));
        self
    }

    #[must_use]
    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = Some(watermark);
        self
    }
}

/// Renders `scene` onto a black canvas of the scene's size.
pub fn compose(scene: &Scene) -> Result<RgbaImage> {
    if scene.width == 0 || scene.height == 0 {
        return Err(Error::InvalidGeometry(format!(
            "composition canvas is {}x{}",
            scene.width, scene.height
        )));
    }
    let has_text = scene.watermark.is_some()
        || scene
            .overlays
            .iter()
            .any(|item| matches!(item.kind, ElementKind::Text(_)));
    if has_text && !scene.shaper.can_rasterize() {
        return Err(Error::Font("no font available to draw text".into()));
    }
    let mut canvas = new_pixmap(scene.width, scene.height)?;
    canvas.fill(Color::BLACK);

    if let Some((image, transform)) = &scene.base {
        draw_image(&mut canvas, image, transform)?;
    }
    for item in &scene.overlays {
        match &item.kind {
            ElementKind::Sticker(sticker) => draw_image(&mut canvas, &sticker.image, &item.transform)?,
            ElementKind::Text(text) => {
                let Some(size_px) = item.text_size_px else {
                    continue;
                };
                match scene.shaper.rasterize(&text.text, size_px, text.typeface) {
                    Some(mask) => {
                        let [r, g, b] = text.color.0;
                        draw_mask(&mut canvas, &mask, [r, g, b, text.alpha], &item.transform)?;
                    }
                    None => log::debug!("text overlay has no visible glyphs"),
                }
            }
        }
    }
    if let Some(watermark) = &scene.watermark {
        draw_watermark(&mut canvas, scene.shaper.as_ref(), watermark)?;
    }

    let mut out = alloc_rgba(scene.width, scene.height)?;
    for (dst, src) in out.pixels_mut().zip(canvas.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    Ok(out)
}

/// Translation placing a watermark block so its text ends `padding` from the
/// right edge and its first baseline sits `padding` above the bottom edge.
#[must_use]
pub fn watermark_origin(
    canvas_width: f32,
    canvas_height: f32,
    text_width: f32,
    first_baseline: f32,
    padding: f32,
) -> Point {
    // Block space is centred horizontally on the text.
    Point::new(
        canvas_width - padding - text_width / 2.0,
        canvas_height - padding - first_baseline,
    )
}

fn draw_watermark(canvas: &mut Pixmap, shaper: &dyn TextShaper, watermark: &Watermark) -> Result<()> {
    let Some(mask) = shaper.rasterize(&watermark.text, watermark.size_px, Typeface::Default) else {
        log::debug!("watermark text has no visible glyphs");
        return Ok(());
    };
    let metrics = shaper.measure(&watermark.text, watermark.size_px, Typeface::Default);
    let origin = watermark_origin(
        canvas.width() as f32,
        canvas.height() as f32,
        metrics.max_line_width,
        metrics.baseline(0),
        watermark.padding_px,
    );
    let placement = AffineTransform::translation(origin.x, origin.y);

    let shadow = blur_mask(&mask, SHADOW_BLUR_RADIUS);
    let shadow_placement = AffineTransform::translation(SHADOW_OFFSET, SHADOW_OFFSET).then(&placement);
    draw_mask(canvas, &shadow, [0, 0, 0, SHADOW_ALPHA], &shadow_placement)?;
    draw_mask(canvas, &mask, [255, 255, 255, 255], &placement)
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(Error::ResourceExhaustion { width, height })
}

fn draw_image(canvas: &mut Pixmap, image: &RgbaImage, transform: &AffineTransform) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        log::debug!("skipping empty bitmap");
        return Ok(());
    }
    let mut source = new_pixmap(image.width(), image.height())?;
    for (dst, src) in source.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    draw_pixmap(canvas, &source, transform);
    Ok(())
}

/// Draws `mask` in `rgba`, with coverage scaling the alpha. The mask's own
/// offset is applied before `transform`.
fn draw_mask(
    canvas: &mut Pixmap,
    mask: &GlyphMask,
    rgba: [u8; 4],
    transform: &AffineTransform,
) -> Result<()> {
    let [r, g, b, a] = rgba;
    let mut source = new_pixmap(mask.width, mask.height)?;
    for (dst, &coverage) in source.pixels_mut().iter_mut().zip(mask.coverage.iter()) {
        let alpha = (u16::from(coverage) * u16::from(a) / 255) as u8;
        *dst = ColorU8::from_rgba(r, g, b, alpha).premultiply();
    }
    let placement = AffineTransform::translation(mask.left, mask.top).then(transform);
    draw_pixmap(canvas, &source, &placement);
    Ok(())
}

fn draw_pixmap(canvas: &mut Pixmap, source: &Pixmap, transform: &AffineTransform) {
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint, transform.to_skia(), None);
}

/// Separable box blur of a coverage mask, growing it by `radius` on each side.
fn blur_mask(mask: &GlyphMask, radius: u32) -> GlyphMask {
    let r = radius as usize;
    let w = mask.width as usize + 2 * r;
    let h = mask.height as usize + 2 * r;
    let window = (2 * r + 1) as u32;

    let mut padded = vec![0u8; w * h];
    for y in 0..mask.height as usize {
        let src = &mask.coverage[y * mask.width as usize..(y + 1) * mask.width as usize];
        padded[(y + r) * w + r..(y + r) * w + r + src.len()].copy_from_slice(src);
    }

    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            let sum: u32 = padded[y * w + lo..=y * w + hi].iter().map(|&v| u32::from(v)).sum();
            horizontal[y * w + x] = (sum / window) as u8;
        }
    }

    let mut coverage = vec![0u8; w * h];
    for x in 0..w {
        for y in 0..h {
            let lo = y.saturating_sub(r);
            let hi = (y + r).min(h - 1);
            let sum: u32 = (lo..=hi).map(|yy| u32::from(horizontal[yy * w + x])).sum();
            coverage[y * w + x] = (sum / window) as u8;
        }
    }

    GlyphMask {
        width: w as u32,
        height: h as u32,
        left: mask.left - radius as f32,
        top: mask.top - radius as f32,
        coverage,
    }
}

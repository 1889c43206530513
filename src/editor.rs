// SPDX-License-Identifier: MPL-2.0
//! Editor session: one photo, one active mode, and everything drawn over it.
//!
//! The session is the single writer of all interactive state. Pixel work that
//! scales with the image runs on the [`PixelWorker`]; the async methods await
//! it and only then install the result, so a failure leaves the previous image
//! untouched.
//!
//! Modes are mutually exclusive. Entering a mode first commits the active one:
//! rotate and adjust keep their working image, crop simply exits, text and
//! sticker keep their elements and drop the selection.

use crate::canvas::ZoomCanvas;
use crate::config::EditorConfig;
use crate::crop::{AspectRatioMode, CropEngine};
use crate::domain::editing::{Brightness, Contrast, EditorMode, Typeface};
use crate::error::Result;
use crate::geometry::Size;
use crate::gesture::PointerEvent;
use crate::media::{
    adjust_brightness_contrast, apply_filter, compose, extract_region, flip, rotate,
    suggested_file_name, AdjustSession, ExportImage, FilterKind, FlipAxis, ImageSink,
    PixelWorker, RotateSession, Rotation, Scene, Watermark, EXPORT_MIME_TYPE,
};
use crate::overlay::{shaper_from_config, OverlayLayer, OverlaySnapshot, TextShaper};
use image_rs::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State owned by the active mode until commit or cancel.
#[derive(Debug)]
enum ModeState {
    Idle,
    Rotate(RotateSession),
    Adjust(AdjustSession),
    Overlay(OverlaySnapshot),
}

/// Values the UI layer mirrors in its controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiState {
    pub mode: EditorMode,
    pub brightness: i32,
    pub contrast: i32,
    pub comparing: bool,
    /// Selected text element's size in sp.
    pub text_size_sp: Option<f32>,
    /// Selected text element's opacity in percent.
    pub text_alpha_percent: Option<u8>,
    pub typeface: Option<Typeface>,
    pub has_image: bool,
}

#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    mode: EditorMode,
    state: ModeState,
    image: Option<Arc<RgbaImage>>,
    canvas: ZoomCanvas,
    crop: CropEngine,
    texts: OverlayLayer,
    stickers: OverlayLayer,
    shaper: Arc<dyn TextShaper>,
    worker: PixelWorker,
    redraw: bool,
}

impl EditorSession {
    /// Creates a session, loading fonts from the configuration.
    #[must_use]
    pub fn new(config: EditorConfig, worker: PixelWorker) -> Self {
        let shaper = shaper_from_config(&config.text.fonts);
        Self::with_shaper(config, shaper, worker)
    }

    #[must_use]
    pub fn with_shaper(config: EditorConfig, shaper: Arc<dyn TextShaper>, worker: PixelWorker) -> Self {
        Self {
            mode: EditorMode::Normal,
            state: ModeState::Idle,
            image: None,
            canvas: ZoomCanvas::new(&config.canvas, &config.display),
            crop: CropEngine::new(&config.crop, &config.display),
            texts: OverlayLayer::new(&config, Arc::clone(&shaper)),
            stickers: OverlayLayer::new(&config, Arc::clone(&shaper)),
            shaper,
            worker,
            redraw: true,
            config,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// The committed image.
    #[must_use]
    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        self.image.clone()
    }

    /// The image currently on screen: the working image in rotate mode, the
    /// preview (or the backup while comparing) in adjust mode.
    #[must_use]
    pub fn displayed_image(&self) -> Option<Arc<RgbaImage>> {
        match &self.state {
            ModeState::Rotate(session) => Some(session.current()),
            ModeState::Adjust(session) => Some(session.displayed()),
            ModeState::Idle | ModeState::Overlay(_) => self.image.clone(),
        }
    }

    /// The image edits apply to: like [`Self::displayed_image`], but the
    /// adjust preview even while the original is held up for comparison.
    #[must_use]
    pub fn working_image(&self) -> Option<Arc<RgbaImage>> {
        match &self.state {
            ModeState::Adjust(session) => Some(session.preview()),
            _ => self.displayed_image(),
        }
    }

    #[must_use]
    pub fn canvas(&self) -> &ZoomCanvas {
        &self.canvas
    }

    #[must_use]
    pub fn crop(&self) -> &CropEngine {
        &self.crop
    }

    #[must_use]
    pub fn texts(&self) -> &OverlayLayer {
        &self.texts
    }

    #[must_use]
    pub fn stickers(&self) -> &OverlayLayer {
        &self.stickers
    }

    /// Mutable text layer for styling and ordering operations.
    pub fn texts_mut(&mut self) -> &mut OverlayLayer {
        self.redraw = true;
        &mut self.texts
    }

    /// Mutable sticker layer for ordering and deletion.
    pub fn stickers_mut(&mut self) -> &mut OverlayLayer {
        self.redraw = true;
        &mut self.stickers
    }

    #[must_use]
    pub fn ui_state(&self) -> UiState {
        let (brightness, contrast, comparing) = match &self.state {
            ModeState::Adjust(s) => (s.brightness().value(), s.contrast().value(), s.is_comparing()),
            _ => (0, 0, false),
        };
        let text = self.texts.selected_text();
        UiState {
            mode: self.mode,
            brightness,
            contrast,
            comparing,
            text_size_sp: text.map(|t| t.size.value()),
            text_alpha_percent: text.map(|t| t.alpha_percent().value()),
            typeface: text.map(|t| t.typeface),
            has_image: self.image.is_some(),
        }
    }

    /// Returns and clears the redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // -------------------------------------------------------------------------
    // Image and viewport
    // -------------------------------------------------------------------------

    /// Starts editing a new photo. Any active mode is discarded and overlays
    /// are cleared.
    pub fn load_image(&mut self, image: RgbaImage) {
        self.cancel_mode();
        self.texts.clear_all();
        self.stickers.clear_all();
        self.canvas.set_content(image.width(), image.height());
        self.image = Some(Arc::new(image));
        self.redraw = true;
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.canvas.set_viewport(viewport);
        self.crop.set_viewport(viewport);
        self.texts.set_viewport(viewport);
        self.stickers.set_viewport(viewport);
        self.redraw = true;
    }

    /// Advances animations. Returns whether anything moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let moved = self.canvas.tick(dt);
        self.redraw |= moved;
        moved
    }

    fn install_image(&mut self, image: Arc<RgbaImage>) {
        if self.canvas.content_size() != image.dimensions() {
            self.canvas.set_content(image.width(), image.height());
        }
        self.image = Some(image);
        self.redraw = true;
    }

    // -------------------------------------------------------------------------
    // Modes
    // -------------------------------------------------------------------------

    /// Switches to `mode`, committing the active one first.
    ///
    /// Crop, rotate and adjust need an image; without one nothing changes and
    /// `false` is returned.
    pub fn enter_mode(&mut self, mode: EditorMode) -> bool {
        if mode == self.mode {
            return true;
        }
        let needs_image = matches!(mode, EditorMode::Crop | EditorMode::Rotate | EditorMode::Adjust);
        let current = match (&self.image, needs_image) {
            (Some(image), _) => Some(Arc::clone(image)),
            (None, true) => {
                log::debug!("cannot enter {:?} without an image", mode);
                return false;
            }
            (None, false) => None,
        };

        self.commit_active_mode();
        self.state = match (mode, current) {
            (EditorMode::Crop, _) => {
                self.crop.reset();
                self.canvas.set_interactive(false);
                ModeState::Idle
            }
            (EditorMode::Rotate, Some(image)) => ModeState::Rotate(RotateSession::begin(image)),
            (EditorMode::Adjust, Some(image)) => ModeState::Adjust(AdjustSession::begin(image)),
            (EditorMode::Text, _) => ModeState::Overlay(self.texts.snapshot()),
            (EditorMode::Sticker, _) => ModeState::Overlay(self.stickers.snapshot()),
            _ => ModeState::Idle,
        };
        log::debug!("editor mode -> {:?}", mode);
        self.mode = mode;
        self.redraw = true;
        true
    }

    /// Keeps the active mode's result and returns to normal mode.
    pub fn commit_active_mode(&mut self) {
        match std::mem::replace(&mut self.state, ModeState::Idle) {
            ModeState::Rotate(session) => self.install_image(session.commit()),
            ModeState::Adjust(session) => self.install_image(session.commit()),
            ModeState::Overlay(_) => self.active_layer_mut().clear_selection(),
            ModeState::Idle => {}
        }
        self.leave_mode();
    }

    /// Discards the active mode's changes and returns to normal mode.
    pub fn cancel_mode(&mut self) {
        match std::mem::replace(&mut self.state, ModeState::Idle) {
            ModeState::Rotate(session) => self.install_image(session.cancel()),
            ModeState::Adjust(session) => self.install_image(session.cancel()),
            ModeState::Overlay(snapshot) => self.active_layer_mut().restore(snapshot),
            ModeState::Idle => {}
        }
        self.leave_mode();
    }

    fn leave_mode(&mut self) {
        if self.mode == EditorMode::Crop {
            self.canvas.set_interactive(true);
        }
        if self.mode != EditorMode::Normal {
            log::debug!("editor mode {:?} -> Normal", self.mode);
            self.mode = EditorMode::Normal;
            self.redraw = true;
        }
    }

    fn active_layer_mut(&mut self) -> &mut OverlayLayer {
        if self.mode == EditorMode::Sticker {
            &mut self.stickers
        } else {
            &mut self.texts
        }
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Routes one pointer event to the surfaces of the active mode, topmost
    /// first. Returns whether any surface consumed it.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.handle_pointer_at(event, Instant::now())
    }

    /// Same as [`Self::handle_pointer`] for an event that happened at `now`.
    pub fn handle_pointer_at(&mut self, event: &PointerEvent, now: Instant) -> bool {
        let consumed = match self.mode {
            EditorMode::Crop => self.crop.handle_pointer(event),
            EditorMode::Text => Self::route(&mut self.texts, &mut self.canvas, event, now),
            EditorMode::Sticker => Self::route(&mut self.stickers, &mut self.canvas, event, now),
            EditorMode::Normal | EditorMode::Rotate | EditorMode::Adjust => {
                self.canvas.handle_pointer(event)
            }
        };
        self.redraw |= consumed;
        consumed
    }

    fn route(
        layer: &mut OverlayLayer,
        canvas: &mut ZoomCanvas,
        event: &PointerEvent,
        now: Instant,
    ) -> bool {
        match event {
            // Both trackers must see the end of a sequence.
            PointerEvent::Up { .. } | PointerEvent::Cancel => {
                let a = layer.handle_pointer_at(event, now);
                let b = canvas.handle_pointer(event);
                a || b
            }
            _ => layer.handle_pointer_at(event, now) || canvas.handle_pointer(event),
        }
    }

    /// Text box a double tap asked to edit, if any. Reported once.
    pub fn take_text_edit_request(&mut self) -> Option<usize> {
        if self.mode == EditorMode::Text {
            self.texts.take_edit_request()
        } else {
            None
        }
    }

    // -------------------------------------------------------------------------
    // Crop
    // -------------------------------------------------------------------------

    pub fn set_crop_aspect(&mut self, mode: AspectRatioMode) {
        self.crop.set_aspect_ratio(mode);
        self.redraw = true;
    }

    /// Cuts the image to the crop rectangle and leaves crop mode.
    ///
    /// Returns `Ok(false)` outside crop mode. On error crop mode stays active
    /// and the image is unchanged.
    pub async fn confirm_crop(&mut self) -> Result<bool> {
        if self.mode != EditorMode::Crop {
            return Ok(false);
        }
        let Some(source) = self.image.clone() else {
            return Ok(false);
        };
        let region = self.canvas.source_region(&self.crop.crop_region())?;
        let cropped = self.worker.run(move || extract_region(&source, region)).await?;
        log::debug!("cropped to {}x{}", cropped.width(), cropped.height());
        self.install_image(Arc::new(cropped));
        self.commit_active_mode();
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Rotate
    // -------------------------------------------------------------------------

    /// Rotates the working image. Returns `Ok(false)` outside rotate mode.
    pub async fn rotate(&mut self, rotation: Rotation) -> Result<bool> {
        self.replace_rotate_image(move |image| rotate(image, rotation)).await
    }

    /// Mirrors the working image. Returns `Ok(false)` outside rotate mode.
    pub async fn flip(&mut self, axis: FlipAxis) -> Result<bool> {
        self.replace_rotate_image(move |image| flip(image, axis)).await
    }

    async fn replace_rotate_image<F>(&mut self, op: F) -> Result<bool>
    where
        F: FnOnce(&RgbaImage) -> Result<RgbaImage> + Send + 'static,
    {
        let ModeState::Rotate(session) = &self.state else {
            return Ok(false);
        };
        let source = session.current();
        let next = self.worker.run(move || op(&source)).await?;
        if let ModeState::Rotate(session) = &mut self.state {
            self.canvas.set_content(next.width(), next.height());
            session.replace(next);
            self.redraw = true;
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Adjust
    // -------------------------------------------------------------------------

    /// Updates the adjust preview. Returns `Ok(false)` outside adjust mode.
    ///
    /// The preview is always computed from the backup taken on entry.
    pub async fn set_adjustment(&mut self, brightness: Brightness, contrast: Contrast) -> Result<bool> {
        let ModeState::Adjust(session) = &mut self.state else {
            return Ok(false);
        };
        if !session.set_values(brightness, contrast) {
            return Ok(true);
        }
        if brightness.is_neutral() && contrast.is_neutral() {
            session.refresh_preview()?;
            self.redraw = true;
            return Ok(true);
        }
        let backup = session.backup();
        let preview = self
            .worker
            .run(move || adjust_brightness_contrast(&backup, brightness, contrast))
            .await?;
        if let ModeState::Adjust(session) = &mut self.state {
            self.redraw |= session.install_preview(brightness, contrast, preview);
        }
        Ok(true)
    }

    pub async fn set_brightness(&mut self, brightness: Brightness) -> Result<bool> {
        let contrast = match &self.state {
            ModeState::Adjust(session) => session.contrast(),
            _ => return Ok(false),
        };
        self.set_adjustment(brightness, contrast).await
    }

    pub async fn set_contrast(&mut self, contrast: Contrast) -> Result<bool> {
        let brightness = match &self.state {
            ModeState::Adjust(session) => session.brightness(),
            _ => return Ok(false),
        };
        self.set_adjustment(brightness, contrast).await
    }

    /// Press-and-hold compare with the unadjusted image.
    pub fn set_comparing(&mut self, comparing: bool) {
        if let ModeState::Adjust(session) = &mut self.state {
            session.set_comparing(comparing);
            self.redraw = true;
        }
    }

    // -------------------------------------------------------------------------
    // Filters
    // -------------------------------------------------------------------------

    /// Commits the active mode, then applies `kind` to the image. Returns
    /// `Ok(false)` without an image.
    pub async fn apply_filter(&mut self, kind: FilterKind) -> Result<bool> {
        self.commit_active_mode();
        let Some(source) = self.image.clone() else {
            return Ok(false);
        };
        if kind == FilterKind::Original {
            return Ok(true);
        }
        let filtered = self.worker.run(move || apply_filter(&source, kind)).await?;
        self.install_image(Arc::new(filtered));
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Overlays
    // -------------------------------------------------------------------------

    /// Enters text mode and adds a text element. Returns its index.
    pub fn add_text(&mut self, text: &str) -> usize {
        self.enter_mode(EditorMode::Text);
        self.redraw = true;
        self.texts.add_text(text)
    }

    /// Enters sticker mode and adds a sticker. Returns its index.
    pub fn add_sticker(&mut self, image: Arc<RgbaImage>) -> Result<usize> {
        self.enter_mode(EditorMode::Sticker);
        let index = self.stickers.add_sticker(image)?;
        self.redraw = true;
        Ok(index)
    }

    // -------------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------------

    /// Snapshot of what is on screen, without selection decorations.
    ///
    /// Text elements are drawn below stickers. An adjust compare in progress
    /// does not affect it; the adjusted preview is always the base.
    #[must_use]
    pub fn scene(&self) -> Scene {
        let viewport = self.canvas.viewport();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (width, height) = (viewport.width.round() as u32, viewport.height.round() as u32);
        let mut scene = Scene::new(width, height, Arc::clone(&self.shaper));
        if let Some(image) = self.working_image() {
            scene = scene.with_base(image, *self.canvas.transform());
        }
        scene = scene.with_layer(&self.texts).with_layer(&self.stickers);
        let watermark = &self.config.watermark;
        if watermark.enabled {
            scene = scene.with_watermark(Watermark {
                text: watermark.text.clone(),
                size_px: self.config.display.sp(watermark.size_sp),
                padding_px: self.config.display.dp(watermark.padding_dp),
            });
        }
        scene
    }

    /// Composes the screen and hands it to `sink` as a timestamped JPEG.
    pub async fn export(&self, sink: Arc<dyn ImageSink>) -> Result<PathBuf> {
        let job = self.export_job(sink);
        let result = self.worker.run(job).await;
        if let Err(err) = &result {
            log::warn!("export failed: {}", err);
        }
        result
    }

    /// Starts an export and returns immediately. `callback` runs exactly once
    /// on the worker with the stored path or the failure.
    pub fn export_in_background<C>(&self, sink: Arc<dyn ImageSink>, callback: C)
    where
        C: FnOnce(Result<PathBuf>) + Send + 'static,
    {
        let job = self.export_job(sink);
        self.worker.submit_with_callback(job, move |result| {
            if let Err(err) = &result {
                log::warn!("export failed: {}", err);
            }
            callback(result);
        });
    }

    fn export_job(&self, sink: Arc<dyn ImageSink>) -> impl FnOnce() -> Result<PathBuf> + Send + 'static {
        let scene = self.scene();
        let file_name = suggested_file_name(&self.config.export.file_prefix, &chrono::Local::now());
        move || {
            let composed = compose(&scene)?;
            sink.store(&ExportImage::from_image(composed), &file_name, EXPORT_MIME_TYPE)
        }
    }
}

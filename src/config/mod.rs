// SPDX-License-Identifier: MPL-2.0
//! This module handles the editor's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! Every section is optional in the file; missing fields fall back to the
//! constants in [`defaults`].
//!
//! # Examples
//!
//! ```no_run
//! use lightedit::config::{self, EditorConfig};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.export.jpeg_quality = 90;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_file = PathBuf::from("./temp_config_dir/test_settings.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded.export.jpeg_quality, 90);
//! ```

pub mod defaults;

use crate::error::Result;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "LightEdit";

/// Root configuration, one table per editor concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub display: DisplayConfig,
    pub canvas: CanvasConfig,
    pub crop: CropConfig,
    pub text: TextConfig,
    pub sticker: StickerConfig,
    pub watermark: WatermarkConfig,
    pub export: ExportConfig,
    pub thumbnail: ThumbnailConfig,
}

/// Screen density used to turn dp/sp sizes into device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub density: f32,
    pub scaled_density: f32,
}

impl DisplayConfig {
    /// Converts density-independent pixels to device pixels.
    #[must_use]
    pub fn dp(&self, value: f32) -> f32 {
        value * self.density
    }

    /// Converts scale-independent pixels (font sizes) to device pixels.
    #[must_use]
    pub fn sp(&self, value: f32) -> f32 {
        value * self.scaled_density
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            scaled_density: DEFAULT_SCALED_DENSITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_user_scale: f32,
    pub max_user_scale: f32,
    pub overscroll_margin_dp: f32,
    pub settle_duration_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_user_scale: MIN_USER_SCALE,
            max_user_scale: MAX_USER_SCALE,
            overscroll_margin_dp: OVERSCROLL_MARGIN_DP,
            settle_duration_ms: SETTLE_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub handle_radius_dp: f32,
    pub min_size_dp: f32,
    pub padding_dp: f32,
    pub top_band: f32,
    pub bottom_band: f32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            handle_radius_dp: CROP_HANDLE_RADIUS_DP,
            min_size_dp: MIN_CROP_SIZE_DP,
            padding_dp: CROP_PADDING_DP,
            top_band: CROP_TOP_BAND,
            bottom_band: CROP_BOTTOM_BAND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub default_text: String,
    pub default_size_sp: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub stack_step_dp: f32,
    /// Font files for typeface indices 0 (default), 1 (serif) and 2 (monospace).
    /// A missing entry falls back to approximate metrics and boxes.
    pub fonts: Vec<PathBuf>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            default_text: DEFAULT_TEXT.to_string(),
            default_size_sp: DEFAULT_TEXT_SIZE_SP,
            min_scale: TEXT_MIN_SCALE,
            max_scale: TEXT_MAX_SCALE,
            stack_step_dp: TEXT_STACK_STEP_DP,
            fonts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub handle_radius_dp: f32,
    pub duplicate_offset_dp: f32,
}

impl Default for StickerConfig {
    fn default() -> Self {
        Self {
            min_scale: STICKER_MIN_SCALE,
            max_scale: STICKER_MAX_SCALE,
            handle_radius_dp: STICKER_HANDLE_RADIUS_DP,
            duplicate_offset_dp: STICKER_DUPLICATE_OFFSET_DP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub enabled: bool,
    pub text: String,
    pub size_sp: f32,
    pub padding_dp: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            text: WATERMARK_TEXT.to_string(),
            size_sp: WATERMARK_SIZE_SP,
            padding_dp: WATERMARK_PADDING_DP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub jpeg_quality: u8,
    pub file_prefix: String,
    /// Target directory; `None` means the user's picture directory.
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    /// Resolves the directory exports are written to.
    #[must_use]
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| dirs::picture_dir().map(|dir| dir.join(APP_NAME)))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: EXPORT_JPEG_QUALITY,
            file_prefix: EXPORT_FILE_PREFIX.to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub capacity: usize,
    pub edge_px: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            capacity: THUMBNAIL_CACHE_CAPACITY,
            edge_px: THUMBNAIL_EDGE_PX,
        }
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<EditorConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(EditorConfig::default())
}

pub fn save(config: &EditorConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<EditorConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            log::warn!("Ignoring invalid config at {}: {}", path.display(), err);
            Ok(EditorConfig::default())
        }
    }
}

pub fn save_to_path(config: &EditorConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

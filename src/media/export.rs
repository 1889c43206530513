// SPDX-License-Identifier: MPL-2.0
//! Hand-off of a finished composition to storage.

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone};
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const EXPORT_MIME_TYPE: &str = "image/jpeg";

/// A finished RGBA8 raster ready for encoding.
///
/// Uses `Arc<Vec<u8>>` so the buffer can be handed to a worker without a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl ExportImage {
    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: Arc::new(image.into_raw()),
        }
    }

    /// Encodes as baseline JPEG. Alpha is dropped.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(Error::InvalidGeometry(format!(
                "export buffer of {} bytes does not match {}x{}",
                self.pixels.len(),
                self.width,
                self.height
            )));
        }
        let mut rgb = Vec::new();
        rgb.try_reserve_exact(expected / 4 * 3)
            .map_err(|_| Error::ResourceExhaustion {
                width: self.width,
                height: self.height,
            })?;
        for px in self.pixels.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100)).write_image(
            &rgb,
            self.width,
            self.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(encoded)
    }
}

/// Suggested file name: `{prefix}_yyyyMMdd_HHmmss_SSS.jpg`.
#[must_use]
pub fn suggested_file_name<Tz>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{}_{}.jpg", prefix, at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Storage collaborator receiving finished exports.
pub trait ImageSink: Send + Sync {
    /// Stores `image` under `file_name` and returns where it landed. On error
    /// nothing is left behind under that name.
    fn store(&self, image: &ExportImage, file_name: &str, mime_type: &str) -> Result<PathBuf>;
}

/// Writes JPEG files into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
    quality: u8,
}

impl DirectorySink {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            directory: directory.into(),
            quality,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let directory = config
            .resolved_directory()
            .ok_or_else(|| Error::Config("no export directory available".to_string()))?;
        Ok(Self::new(directory, config.jpeg_quality))
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ImageSink for DirectorySink {
    fn store(&self, image: &ExportImage, file_name: &str, mime_type: &str) -> Result<PathBuf> {
        if mime_type != EXPORT_MIME_TYPE {
            return Err(Error::Config(format!("unsupported export type {mime_type}")));
        }
        let bytes = image.encode_jpeg(self.quality)?;
        fs::create_dir_all(&self.directory)?;

        let target = self.directory.join(file_name);
        // Hidden until complete so a failed write never shows up as a photo.
        let partial = self.directory.join(format!(".{file_name}.part"));
        let written = fs::write(&partial, &bytes).and_then(|()| fs::rename(&partial, &target));
        if let Err(err) = written {
            log::warn!("export to {} failed: {}", target.display(), err);
            if let Err(cleanup) = fs::remove_file(&partial) {
                log::debug!("could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(err.into());
        }
        log::debug!("exported {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image_rs::{GenericImageView, Rgba};

    fn sample() -> ExportImage {
        ExportImage::from_image(RgbaImage::from_pixel(8, 6, Rgba([200, 100, 50, 255])))
    }

    #[test]
    fn file_name_carries_millisecond_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_milli_opt(14, 7, 9, 26))
            .expect("valid date")
            .and_utc();
        assert_eq!(
            suggested_file_name("LightEdit", &at),
            "LightEdit_20240305_140709_026.jpg"
        );
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let bytes = sample().encode_jpeg(95).expect("encode");
        let decoded = image_rs::load_from_memory(&bytes).expect("decode");
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let image = ExportImage {
            width: 4,
            height: 4,
            pixels: Arc::new(vec![0; 10]),
        };
        assert!(matches!(image.encode_jpeg(95), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn directory_sink_writes_final_file_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path().join("out"), 95);
        let path = sink
            .store(&sample(), "LightEdit_test.jpg", EXPORT_MIME_TYPE)
            .expect("store");
        assert!(path.exists());
        let names: Vec<_> = fs::read_dir(sink.directory())
            .expect("read dir")
            .filter_map(|e| e.ok().map(|e| e.file_name()))
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn failed_store_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path(), 95);
        let result = sink.store(&sample(), "missing/nested.jpg", EXPORT_MIME_TYPE);
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn failed_rename_removes_the_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let occupied = dir.path().join("taken.jpg");
        fs::create_dir(&occupied).expect("mkdir");
        fs::write(occupied.join("keep"), b"x").expect("write");

        let sink = DirectorySink::new(dir.path(), 95);
        let result = sink.store(&sample(), "taken.jpg", EXPORT_MIME_TYPE);
        assert!(matches!(result, Err(Error::Io(_))));
        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken.jpg")]);
    }

    #[test]
    fn unsupported_mime_type_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path(), 95);
        assert!(sink.store(&sample(), "x.png", "image/png").is_err());
    }
}

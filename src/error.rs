// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    Image(String),
    Font(String),

    /// A crop rectangle or overlay bound collapsed to zero/negative size.
    InvalidGeometry(String),

    /// A transform lost its inverse. Scale bounds make this unreachable in
    /// practice; it is reported rather than panicking in release builds.
    SingularTransform,

    /// The requested extraction region does not overlap the source image.
    EmptyIntersection,

    /// A pixel buffer of the given dimensions could not be allocated.
    ResourceExhaustion { width: u32, height: u32 },

    /// A background pixel or persistence job failed or was lost.
    BackgroundTask(String),
}

impl Error {
    /// Returns the message key the UI layer uses for its transient notification.
    pub fn key(&self) -> &'static str {
        match self {
            Error::Io(_) => "error-io",
            Error::Config(_) => "error-config",
            Error::Image(_) => "error-image",
            Error::Font(_) => "error-font",
            Error::InvalidGeometry(_) => "error-invalid-geometry",
            Error::SingularTransform => "error-singular-transform",
            Error::EmptyIntersection => "error-crop-no-valid-region",
            Error::ResourceExhaustion { .. } => "error-out-of-memory",
            Error::BackgroundTask(_) => "error-background-task",
        }
    }

    /// Whether the error is a geometry error that callers recover from locally.
    pub fn is_geometry(&self) -> bool {
        matches!(self, Error::InvalidGeometry(_) | Error::SingularTransform)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Image(e) => write!(f, "Image Error: {}", e),
            Error::Font(e) => write!(f, "Font Error: {}", e),
            Error::InvalidGeometry(e) => write!(f, "Invalid geometry: {}", e),
            Error::SingularTransform => write!(f, "Transform is not invertible"),
            Error::EmptyIntersection => write!(f, "No valid crop region"),
            Error::ResourceExhaustion { width, height } => {
                write!(f, "Cannot allocate a {}x{} pixel buffer", width, height)
            }
            Error::BackgroundTask(e) => write!(f, "Background task failed: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<image_rs::ImageError> for Error {
    fn from(err: image_rs::ImageError) -> Self {
        match err {
            image_rs::ImageError::IoError(io) => Error::Io(io.to_string()),
            image_rs::ImageError::Limits(limits) => Error::Image(limits.to_string()),
            other => Error::Image(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "Config Error: bad field");
    }

    #[test]
    fn resource_exhaustion_reports_dimensions() {
        let err = Error::ResourceExhaustion {
            width: 4000,
            height: 3000,
        };
        assert!(format!("{}", err).contains("4000x3000"));
        assert_eq!(err.key(), "error-out-of-memory");
    }

    #[test]
    fn empty_intersection_uses_crop_key() {
        assert_eq!(Error::EmptyIntersection.key(), "error-crop-no-valid-region");
        assert_eq!(format!("{}", Error::EmptyIntersection), "No valid crop region");
    }

    #[test]
    fn geometry_errors_are_flagged_recoverable() {
        assert!(Error::SingularTransform.is_geometry());
        assert!(Error::InvalidGeometry("zero width".into()).is_geometry());
        assert!(!Error::EmptyIntersection.is_geometry());
    }
}

//! Error types for star masking.

use thiserror::Error;

use crate::aperture::Centroid;

/// Invalid configuration values, reported before any image work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ring width must be positive and finite, got {0}")]
    RingWidth(f32),

    #[error("max radius {max_radius} must be finite and at least the ring width {ring_width}")]
    MaxRadius { max_radius: f32, ring_width: f32 },

    #[error("saturation level must be finite, got {0}")]
    SaturationLevel(f32),

    #[error("critical intensity must be finite, got {0}")]
    CriticalIntensity(f32),
}

/// Errors that abort a masking run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("centroid {centroid} lies outside the {width}x{height} image")]
    CentroidOutOfBounds {
        centroid: Centroid,
        width: usize,
        height: usize,
    },

    #[error("aperture worker {chunk} failed: {source}")]
    Worker {
        chunk: usize,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::RingWidth(0.0).into();
        assert!(matches!(err, Error::InvalidConfig(ConfigError::RingWidth(_))));
        assert_eq!(
            err.to_string(),
            "invalid configuration: ring width must be positive and finite, got 0"
        );
    }

    #[test]
    fn test_worker_error_keeps_source() {
        let inner = Error::CentroidOutOfBounds {
            centroid: Centroid::new(12, 3),
            width: 10,
            height: 10,
        };
        let err = Error::Worker {
            chunk: 2,
            source: Box::new(inner),
        };
        assert_eq!(
            err.to_string(),
            "aperture worker 2 failed: centroid (row 12, col 3) lies outside the 10x10 image"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}

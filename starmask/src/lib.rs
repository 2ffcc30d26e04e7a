//! Starmask - saturated star masking for astronomical images.
//!
//! Saturated stars leave bright cores and extended halos that bias sky
//! estimation and source detection. This crate finds every saturated region,
//! grows a circular aperture around each one until the surrounding annulus
//! falls to a critical intensity, and returns a boolean mask covering the
//! apertures together with a dilated halo around the saturated pixels.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use starmask::{starmask, Buffer2, Config};
//!
//! let image: Buffer2<f32> = load_sky_subtracted_frame();
//! let result = starmask(&image, &Config::new(60000.0, 0.0))?;
//!
//! let cleaned = starmask::apply_mask(&image, &result.mask, f32::NAN)?;
//! ```

pub mod aperture;
pub mod assemble;
pub mod config;
pub mod convolution;
pub mod dilation;
pub mod dispatch;
pub mod error;
pub mod grower;
pub mod labeling;
pub mod pipeline;
pub mod saturation;
pub mod smoothing;

#[cfg(test)]
mod test_utils;

pub use common::Buffer2;

// ============================================================================
// Main API
// ============================================================================

pub use pipeline::{starmask, Diagnostics, StageImages, StarMasker, StarmaskResult};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{Config, Connectivity, Estimator};
pub use error::{ConfigError, Error, Result};

// ============================================================================
// Stages
// ============================================================================

pub use aperture::{Aperture, Centroid};
pub use assemble::{apply_mask, assemble, rasterize_apertures};
pub use convolution::{convolve_large, normalized_tophat_kernel, tophat_kernel};
pub use dilation::dilate;
pub use dispatch::{dispatch_grow, Dispatch};
pub use grower::{grow, grow_with_mask, Growth, GrowthParams, RadiusExhausted};
pub use labeling::{argmax_per_label, label, LabelMap};
pub use saturation::locate;
pub use smoothing::smooth;

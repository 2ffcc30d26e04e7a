//! Star mask pipeline and the [`StarMasker`] entry point.
//!
//! Stages, in order:
//! 1. Locate saturated regions (threshold + connected components).
//! 2. Optionally smooth the image and take each region's peak as its centroid.
//! 3. Optionally dilate the region mask into a halo mask.
//! 4. Replace halo pixels with NaN in a working copy of the image.
//! 5. Grow one aperture per centroid on the working copy, in parallel chunks.
//! 6. Rasterize the apertures and OR them with the halo mask.


use std::time::{Duration, Instant};

use common::Buffer2;

use crate::aperture::Aperture;
use crate::assemble::assemble;
use crate::config::Config;
use crate::dilation::dilate;
use crate::dispatch::dispatch_grow;
use crate::error::{Error, Result};
use crate::grower::{mask_excluded, RadiusExhausted};
use crate::labeling::{argmax_per_label, LabelMap};
use crate::saturation::locate;
use crate::smoothing::smooth;

/// Intermediate images kept when [`Config::diagnostics`] is set.
#[derive(Debug, Clone)]
pub struct StageImages {
    /// Saturated-region labels.
    pub labels: LabelMap,
    /// Smoothed image used for centroids, `None` when smoothing was disabled
    /// or no region was found.
    pub smoothed: Option<Buffer2<f32>>,
    /// Halo mask excluded from ring averages.
    pub dilated: Buffer2<bool>,
}

/// Counts and events collected during one masking run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Number of connected saturated regions.
    pub saturated_regions: usize,
    /// Number of pixels above the saturation level.
    pub saturated_pixels: usize,
    /// Number of pixels in the dilated halo mask.
    pub dilated_pixels: usize,
    /// Number of pixels in the final mask.
    pub masked_pixels: usize,
    /// Apertures clamped to the maximum radius, in centroid order.
    pub radius_exhausted: Vec<RadiusExhausted>,
    /// Number of chunks aperture growth was split into.
    pub worker_count: usize,
    /// Wall time of the whole run.
    pub elapsed: Duration,
    pub stages: Option<StageImages>,
}

/// Final mask with the apertures that produced it.
#[derive(Debug, Clone)]
pub struct StarmaskResult {
    /// Same shape as the input image; `true` marks masked pixels.
    pub mask: Buffer2<bool>,
    /// One aperture per saturated region, in region label order.
    pub apertures: Vec<Aperture>,
    pub diagnostics: Diagnostics,
}

/// Builds saturated-star masks with a fixed configuration.
///
/// # Example
///
/// ```rust,ignore
/// use starmask::{Config, StarMasker};
///
/// let config = Config {
///     ring_width: 10.0,
///     ..Config::new(55000.0, 0.5)
/// };
/// let result = StarMasker::from_config(config).mask(&image)?;
/// println!("masked {} pixels", result.diagnostics.masked_pixels);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StarMasker {
    config: Config,
}

impl StarMasker {
    /// Masker with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mask the saturated stars of `image`.
    pub fn mask(&self, image: &Buffer2<f32>) -> Result<StarmaskResult> {
        let start = Instant::now();
        let config = &self.config;

        let params = config.growth_params()?;
        if image.is_empty() {
            return Err(Error::EmptyImage);
        }

        // Step 1: Saturated regions
        let labels = locate(image, config.saturation_level, config.connectivity);
        let regions = labels.num_labels();
        let blobs = labels.foreground();

        // Step 2: Centroids, optionally from the smoothed image
        let smoothed = if regions > 0 {
            smooth(image, config.smooth_kernel_size)
        } else {
            None
        };
        let centroids = argmax_per_label(smoothed.as_ref().unwrap_or(image), &labels)?;

        // Step 3: Halo mask
        let dilated = dilate(&blobs, config.dilate_kernel_size);

        // Steps 4-5: Aperture growth on the halo-masked working copy
        let workers = config.effective_worker_count();
        let dispatch = if centroids.is_empty() {
            Default::default()
        } else {
            let working = mask_excluded(image, &dilated)?;
            dispatch_grow(&working, &centroids, &params, workers)?
        };

        // Step 6: Final mask
        let mask = assemble(&dispatch.apertures, &dilated);

        let diagnostics = Diagnostics {
            saturated_regions: regions,
            saturated_pixels: blobs.count_set(),
            dilated_pixels: dilated.count_set(),
            masked_pixels: mask.count_set(),
            radius_exhausted: dispatch.exhausted,
            worker_count: workers,
            elapsed: start.elapsed(),
            stages: config.diagnostics.then(|| StageImages {
                labels,
                smoothed,
                dilated,
            }),
        };

        tracing::info!(
            regions = diagnostics.saturated_regions,
            masked_pixels = diagnostics.masked_pixels,
            exhausted = diagnostics.radius_exhausted.len(),
            elapsed_ms = diagnostics.elapsed.as_millis() as u64,
            "star mask complete"
        );

        Ok(StarmaskResult {
            mask,
            apertures: dispatch.apertures,
            diagnostics,
        })
    }
}

/// Mask the saturated stars of `image` with `config`.
pub fn starmask(image: &Buffer2<f32>, config: &Config) -> Result<StarmaskResult> {
    StarMasker::from_config(config.clone()).mask(image)
}

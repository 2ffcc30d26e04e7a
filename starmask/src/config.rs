//! Configuration types for star masking.
//!
//! This module defines the flat [`Config`] struct and associated enums used by
//! the masking pipeline. Parameters are grouped by comments into logical
//! sections.

use crate::error::ConfigError;
use crate::grower::GrowthParams;

// ============================================================================
// Enums
// ============================================================================

/// Pixel connectivity for connected component labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// 4-connectivity: only horizontal and vertical neighbors.
    #[default]
    Four,
    /// 8-connectivity: diagonal neighbors also join regions.
    Eight,
}

/// Reducer turning the pixel values of one annulus into an average flux.
///
/// The slice handed to the reducer is never empty, contains only finite
/// values and may be reordered freely.
#[derive(Debug, Clone, Copy, Default)]
pub enum Estimator {
    /// Median of the ring, robust to neighboring sources inside it.
    #[default]
    Median,
    /// Arithmetic mean.
    Mean,
    /// Caller-provided reducer.
    Custom(fn(&mut [f32]) -> f32),
}

impl Estimator {
    pub fn estimate(&self, values: &mut [f32]) -> f32 {
        debug_assert!(!values.is_empty());
        match self {
            Estimator::Median => median_f32_mut(values),
            Estimator::Mean => mean_f32(values),
            Estimator::Custom(reduce) => reduce(values),
        }
    }
}

/// Median of f32 values via quickselect. Reorders the input.
pub fn median_f32_mut(data: &mut [f32]) -> f32 {
    debug_assert!(!data.is_empty());

    let len = data.len();
    let mid = len / 2;
    let (left_part, median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *median;

    if len & 1 == 1 {
        upper
    } else {
        let lower = left_part.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (lower + upper) * 0.5
    }
}

/// Mean accumulated in f64 so long rings don't lose precision.
pub fn mean_f32(data: &[f32]) -> f32 {
    debug_assert!(!data.is_empty());
    let sum: f64 = data.iter().map(|&v| v as f64).sum();
    (sum / data.len() as f64) as f32
}

// ============================================================================
// Config
// ============================================================================

/// Star mask configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // -- Saturation --
    /// Pixels strictly above this value are saturated (ADU).
    pub saturation_level: f32,
    /// Connectivity used to group saturated pixels into regions.
    pub connectivity: Connectivity,

    // -- Centroid refinement --
    /// Side of the top-hat smoothing kernel used to locate region centers.
    /// 0 disables smoothing and uses the raw image peak.
    pub smooth_kernel_size: usize,

    // -- Halo dilation --
    /// Side of the top-hat kernel the saturated-region mask is dilated with.
    /// 0 disables dilation.
    pub dilate_kernel_size: usize,

    // -- Aperture growth --
    /// Ring average at or below which growth stops (`Icrit`).
    pub critical_intensity: f32,
    /// Annulus width and radius step (`dr`), in pixels.
    pub ring_width: f32,
    /// Largest allowed aperture radius (`Rmax`), in pixels.
    pub max_radius: f32,
    /// Average-flux reducer for each ring.
    pub estimator: Estimator,

    // -- Execution --
    /// Number of contiguous centroid chunks processed in parallel.
    /// 0 uses the rayon thread count.
    pub worker_count: usize,
    /// Keep intermediate stage images in the result.
    pub diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            saturation_level: 60000.0,
            connectivity: Connectivity::default(),
            smooth_kernel_size: 25,
            dilate_kernel_size: 15,
            critical_intensity: 0.0,
            ring_width: 20.0,
            max_radius: 1000.0,
            estimator: Estimator::default(),
            worker_count: 0,
            diagnostics: false,
        }
    }
}

impl Config {
    /// Default configuration for the given saturation level and critical intensity.
    pub fn new(saturation_level: f32, critical_intensity: f32) -> Self {
        Self {
            saturation_level,
            critical_intensity,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.growth_params().map(|_| ())
    }

    /// Validate the configuration and extract the aperture growth parameters.
    pub fn growth_params(&self) -> Result<GrowthParams, ConfigError> {
        if !self.saturation_level.is_finite() {
            return Err(ConfigError::SaturationLevel(self.saturation_level));
        }
        GrowthParams::new(
            self.critical_intensity,
            self.ring_width,
            self.max_radius,
            self.estimator,
        )
    }

    /// Worker count with the automatic default resolved.
    pub fn effective_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            common::parallel::default_worker_count()
        } else {
            self.worker_count
        }
    }
}

//! Adaptive circular aperture growth.
//!
//! Starting from a region's centroid, concentric rings of width `dr` are
//! examined one after another. Growth stops at the first ring whose average
//! flux is at or below the critical intensity, and the aperture radius is
//! that ring's outer edge, capped at `max_radius`. If the ring reaching
//! `max_radius` is still too bright, the aperture is clamped to `max_radius`
//! and a [`RadiusExhausted`] event is reported.
//!
//! Ring `i` holds the pixels whose squared distance `d2` from the center
//! satisfies `(i*dr)^2 <= d2 < ((i+1)*dr)^2`, so rings partition the plane.
//! Excluded pixels (non-finite values, or set in an exclusion mask) and
//! pixels outside the image never enter a ring average. A ring with no
//! eligible pixel has infinite average and never stops growth.

#[cfg(test)]
mod tests;

use common::Buffer2;

use crate::aperture::{Aperture, Centroid};
use crate::config::Estimator;
use crate::error::{ConfigError, Error, Result};

/// Validated parameters of a single aperture growth.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    critical_intensity: f32,
    ring_width: f32,
    max_radius: f32,
    estimator: Estimator,
}

impl GrowthParams {
    pub fn new(
        critical_intensity: f32,
        ring_width: f32,
        max_radius: f32,
        estimator: Estimator,
    ) -> std::result::Result<Self, ConfigError> {
        if !critical_intensity.is_finite() {
            return Err(ConfigError::CriticalIntensity(critical_intensity));
        }
        if !(ring_width.is_finite() && ring_width > 0.0) {
            return Err(ConfigError::RingWidth(ring_width));
        }
        if !(max_radius.is_finite() && max_radius >= ring_width) {
            return Err(ConfigError::MaxRadius {
                max_radius,
                ring_width,
            });
        }
        Ok(Self {
            critical_intensity,
            ring_width,
            max_radius,
            estimator,
        })
    }

    #[inline]
    pub fn critical_intensity(&self) -> f32 {
        self.critical_intensity
    }

    #[inline]
    pub fn ring_width(&self) -> f32 {
        self.ring_width
    }

    #[inline]
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    #[inline]
    pub fn estimator(&self) -> Estimator {
        self.estimator
    }
}

/// An aperture whose growth hit the maximum radius before the ring average
/// dropped to the critical intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusExhausted {
    pub centroid: Centroid,
    /// Radius the aperture was clamped to.
    pub radius: f32,
}

/// Outcome of growing one aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Growth {
    pub aperture: Aperture,
    /// Number of rings evaluated, including the terminating one.
    pub rings: usize,
    pub exhausted: Option<RadiusExhausted>,
}

/// Ring membership test for squared pixel distance `d2`.
#[inline]
pub fn ring_contains(d2: i64, ring: usize, ring_width: f64) -> bool {
    let inner = ring as f64 * ring_width;
    let outer = (ring + 1) as f64 * ring_width;
    let d2 = d2 as f64;
    inner * inner <= d2 && d2 < outer * outer
}

/// Average flux of ring `ring` around `centroid`, `+inf` when no pixel is eligible.
///
/// `scratch` is reused between calls to avoid per-ring allocations.
pub fn annulus_flux(
    image: &Buffer2<f32>,
    exclusion: Option<&Buffer2<bool>>,
    centroid: Centroid,
    ring: usize,
    ring_width: f64,
    estimator: Estimator,
    scratch: &mut Vec<f32>,
) -> f32 {
    let outer = (ring + 1) as f64 * ring_width;
    let reach = outer.ceil() as i64;
    let x0 = centroid.col as i64;
    let y0 = centroid.row as i64;

    // The box [x0 - reach, x0 + reach] covers the whole ring.
    let x_min = (x0 - reach).max(0) as usize;
    let x_max = ((x0 + reach + 1).min(image.width() as i64)).max(0) as usize;
    let y_min = (y0 - reach).max(0) as usize;
    let y_max = ((y0 + reach + 1).min(image.height() as i64)).max(0) as usize;

    scratch.clear();
    for y in y_min..y_max {
        let dy = y as i64 - y0;
        let row = image.row(y);
        let excluded_row = exclusion.map(|mask| mask.row(y));
        for x in x_min..x_max {
            let dx = x as i64 - x0;
            if !ring_contains(dx * dx + dy * dy, ring, ring_width) {
                continue;
            }
            let value = row[x];
            if !value.is_finite() || excluded_row.is_some_and(|m| m[x]) {
                continue;
            }
            scratch.push(value);
        }
    }

    if scratch.is_empty() {
        f32::INFINITY
    } else {
        estimator.estimate(scratch)
    }
}

/// Grow an aperture on an image whose excluded pixels are already non-finite.
pub fn grow(
    image: &Buffer2<f32>,
    centroid: Centroid,
    params: &GrowthParams,
    scratch: &mut Vec<f32>,
) -> Result<Growth> {
    grow_impl(image, None, centroid, params, scratch)
}

/// Grow an aperture, skipping pixels set in `exclusion` as well as non-finite ones.
pub fn grow_with_mask(
    image: &Buffer2<f32>,
    exclusion: &Buffer2<bool>,
    centroid: Centroid,
    params: &GrowthParams,
) -> Result<Growth> {
    if !image.same_shape(exclusion) {
        return Err(Error::ShapeMismatch {
            expected: image.shape(),
            actual: exclusion.shape(),
        });
    }
    grow_impl(image, Some(exclusion), centroid, params, &mut Vec::new())
}

fn grow_impl(
    image: &Buffer2<f32>,
    exclusion: Option<&Buffer2<bool>>,
    centroid: Centroid,
    params: &GrowthParams,
    scratch: &mut Vec<f32>,
) -> Result<Growth> {
    if centroid.col >= image.width() || centroid.row >= image.height() {
        return Err(Error::CentroidOutOfBounds {
            centroid,
            width: image.width(),
            height: image.height(),
        });
    }

    let ring_width = params.ring_width as f64;
    let max_radius = params.max_radius as f64;
    let mut ring = 0usize;

    loop {
        let radius = (ring + 1) as f64 * ring_width;
        let flux = annulus_flux(
            image,
            exclusion,
            centroid,
            ring,
            ring_width,
            params.estimator,
            scratch,
        );

        if flux <= params.critical_intensity {
            // The terminating ring may straddle `max_radius`.
            let radius = radius.min(max_radius) as f32;
            return Ok(Growth {
                aperture: Aperture::circle(centroid, radius),
                rings: ring + 1,
                exhausted: None,
            });
        }

        if radius >= max_radius {
            tracing::warn!(
                row = centroid.row,
                col = centroid.col,
                radius = params.max_radius,
                "aperture reached maximum size"
            );
            return Ok(Growth {
                aperture: Aperture::circle(centroid, params.max_radius),
                rings: ring + 1,
                exhausted: Some(RadiusExhausted {
                    centroid,
                    radius: params.max_radius,
                }),
            });
        }

        ring += 1;
    }
}

/// Working copy of `image` with every pixel set in `exclusion` replaced by NaN.
pub fn mask_excluded(image: &Buffer2<f32>, exclusion: &Buffer2<bool>) -> Result<Buffer2<f32>> {
    if !image.same_shape(exclusion) {
        return Err(Error::ShapeMismatch {
            expected: image.shape(),
            actual: exclusion.shape(),
        });
    }
    let mut masked = image.clone();
    for (v, &excluded) in masked.iter_mut().zip(exclusion.iter()) {
        if excluded {
            *v = f32::NAN;
        }
    }
    Ok(masked)
}

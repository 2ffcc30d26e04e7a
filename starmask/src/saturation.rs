//! Saturated region detection.

use common::Buffer2;

use crate::config::Connectivity;
use crate::labeling::{label, LabelMap};

/// Boolean mask of pixels strictly above `saturation_level`. NaN is never saturated.
pub fn saturation_mask(image: &Buffer2<f32>, saturation_level: f32) -> Buffer2<bool> {
    image.map(|&v| v > saturation_level)
}

/// Find the distinct saturated regions of `image`.
///
/// The region count is [`LabelMap::num_labels`]; zero when no pixel exceeds
/// the threshold.
pub fn locate(image: &Buffer2<f32>, saturation_level: f32, connectivity: Connectivity) -> LabelMap {
    let mask = saturation_mask(image, saturation_level);
    let labels = label(&mask, connectivity);
    tracing::debug!(
        regions = labels.num_labels(),
        saturated_pixels = mask.count_set(),
        saturation_level,
        "located saturated regions"
    );
    labels
}

//! Local-mean smoothing used to refine region centers.

use common::Buffer2;

use crate::convolution::{convolve_large, normalized_tophat_kernel};

/// Mean-filter `image` with a top-hat of side `kernel_size`.
///
/// Returns `None` when `kernel_size` is 0, meaning the raw image should be used.
pub fn smooth(image: &Buffer2<f32>, kernel_size: usize) -> Option<Buffer2<f32>> {
    if kernel_size == 0 {
        return None;
    }
    let kernel = normalized_tophat_kernel(kernel_size);
    tracing::debug!(kernel_size, "smoothing image for centroid refinement");
    Some(convolve_large(image, &kernel))
}

//! Halo dilation of the saturated-region mask.
//!
//! Dilation is expressed as a convolution of the 0/1 mask with a non-negative
//! top-hat followed by a threshold: any overlap with the structuring element
//! gives a strictly positive response.

use common::Buffer2;

use crate::convolution::{convolve_large, tophat_kernel};

/// Convolution responses at or below this value count as "no overlap".
pub const DILATION_TOLERANCE: f32 = 1e-5;

/// Dilate `mask` with a top-hat structuring element of side `kernel_size`.
///
/// `kernel_size == 0` returns the mask unchanged.
pub fn dilate(mask: &Buffer2<bool>, kernel_size: usize) -> Buffer2<bool> {
    if kernel_size == 0 {
        return mask.clone();
    }

    let kernel = tophat_kernel(kernel_size);
    let as_float = mask.map(|&m| if m { 1.0f32 } else { 0.0 });
    let response = convolve_large(&as_float, &kernel);
    let dilated = response.map(|&v| v > DILATION_TOLERANCE);

    tracing::debug!(
        kernel_size,
        input_pixels = mask.count_set(),
        dilated_pixels = dilated.count_set(),
        "dilated saturation mask"
    );
    dilated
}

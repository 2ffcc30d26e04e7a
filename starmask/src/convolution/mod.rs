//! FFT-based convolution with arbitrarily large kernels.
//!
//! Both operands are zero-padded to the full linear-convolution size, so no
//! wrap-around leaks between opposite image edges. Transforms run in f64,
//! which keeps the round-off of a 0/1 mask convolved with a unit top-hat
//! orders of magnitude below the `1e-5` threshold used by dilation.


use std::sync::Arc;

use common::Buffer2;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Multiplier for number of row chunks relative to rayon threads.
const CHUNKS_PER_THREAD: usize = 2;

/// Flat circular top-hat kernel of side `size`: 1 inside the inscribed disk, 0 outside.
///
/// The disk is centered on the middle of the `size` x `size` grid and has
/// radius `size / 2`, so `size = 1` is a single pixel.
pub fn tophat_kernel(size: usize) -> Buffer2<f32> {
    let center = (size as f32 - 1.0) * 0.5;
    let radius = size as f32 * 0.5;
    let r2 = radius * radius;
    Buffer2::from_fn(size, size, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if dx * dx + dy * dy <= r2 {
            1.0
        } else {
            0.0
        }
    })
}

/// Top-hat kernel scaled to unit sum, turning convolution into a local mean.
pub fn normalized_tophat_kernel(size: usize) -> Buffer2<f32> {
    let kernel = tophat_kernel(size);
    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        kernel.map(|&w| w / sum)
    } else {
        kernel
    }
}

/// Convolve `image` with `kernel`, returning an image of the same shape.
///
/// The kernel origin is its center pixel `((kw - 1) / 2, (kh - 1) / 2)`.
/// Pixels outside the image count as 0, and so do non-finite pixels.
pub fn convolve_large(image: &Buffer2<f32>, kernel: &Buffer2<f32>) -> Buffer2<f32> {
    let (width, height) = image.shape();
    let (kw, kh) = kernel.shape();

    if image.is_empty() || kernel.is_empty() {
        return Buffer2::new_filled(width, height, 0.0);
    }

    let pad_w = width + kw - 1;
    let pad_h = height + kh - 1;

    let mut planner = FftPlanner::<f64>::new();
    let row_forward = planner.plan_fft_forward(pad_w);
    let col_forward = planner.plan_fft_forward(pad_h);
    let row_inverse = planner.plan_fft_inverse(pad_w);
    let col_inverse = planner.plan_fft_inverse(pad_h);

    let mut image_spec = pad(image, pad_w, pad_h);
    let mut kernel_spec = pad(kernel, pad_w, pad_h);

    fft_2d(&mut image_spec, pad_w, pad_h, &row_forward, &col_forward);
    fft_2d(&mut kernel_spec, pad_w, pad_h, &row_forward, &col_forward);

    image_spec
        .par_iter_mut()
        .zip(kernel_spec.par_iter())
        .for_each(|(a, &b)| *a *= b);

    fft_2d(&mut image_spec, pad_w, pad_h, &row_inverse, &col_inverse);

    let norm = 1.0 / (pad_w * pad_h) as f64;
    let off_x = (kw - 1) / 2;
    let off_y = (kh - 1) / 2;

    let mut out = vec![0.0f32; width * height];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = (y + off_y) * pad_w + off_x;
            for (x, v) in row.iter_mut().enumerate() {
                *v = (image_spec[src + x].re * norm) as f32;
            }
        });

    Buffer2::new(width, height, out)
}

/// Copy `src` into the top-left corner of a zeroed `pad_w` x `pad_h` complex grid.
fn pad(src: &Buffer2<f32>, pad_w: usize, pad_h: usize) -> Vec<Complex<f64>> {
    let mut data = vec![Complex::new(0.0, 0.0); pad_w * pad_h];
    data.par_chunks_mut(pad_w)
        .take(src.height())
        .enumerate()
        .for_each(|(y, row)| {
            for (dst, &v) in row.iter_mut().zip(src.row(y)) {
                if v.is_finite() {
                    *dst = Complex::new(v as f64, 0.0);
                }
            }
        });
    data
}

/// In-place 2D transform: rows with `row_fft`, then columns with `col_fft`.
fn fft_2d(
    data: &mut Vec<Complex<f64>>,
    width: usize,
    height: usize,
    row_fft: &Arc<dyn Fft<f64>>,
    col_fft: &Arc<dyn Fft<f64>>,
) {
    process_rows(data, width, height, row_fft);
    let mut transposed = transpose(data, width, height);
    process_rows(&mut transposed, height, width, col_fft);
    *data = transpose(&transposed, height, width);
}

/// Run `fft` over each of the `rows` consecutive rows of length `len`.
fn process_rows(data: &mut [Complex<f64>], len: usize, rows: usize, fft: &Arc<dyn Fft<f64>>) {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    let rows_per_chunk = (rows / num_chunks).max(1);
    data.par_chunks_mut(len * rows_per_chunk)
        .for_each(|chunk| fft.process(chunk));
}

/// Out-of-place transpose of a row-major `width` x `height` grid.
fn transpose(src: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut dst = vec![Complex::new(0.0, 0.0); src.len()];
    dst.par_chunks_mut(height)
        .enumerate()
        .for_each(|(x, column)| {
            for (y, v) in column.iter_mut().enumerate() {
                *v = src[y * width + x];
            }
        });
    dst
}

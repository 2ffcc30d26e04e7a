//! Final mask assembly: aperture rasterization, union with the dilated mask,
//! and application of the mask to an image.

use std::ops::Range;

use common::Buffer2;
use rayon::prelude::*;

use crate::aperture::Aperture;
use crate::error::{Error, Result};

/// Boolean canvas of `width` x `height` with every pixel inside any aperture set.
///
/// Each aperture only scans its clipped bounding box. Rows are filled in parallel.
pub fn rasterize_apertures(apertures: &[Aperture], width: usize, height: usize) -> Buffer2<bool> {
    if width == 0 || height == 0 {
        return Buffer2::new_filled(width, height, false);
    }

    let bounded: Vec<(&Aperture, Range<usize>, Range<usize>)> = apertures
        .iter()
        .filter_map(|ap| {
            let (xs, ys) = ap.pixel_bounds(width, height)?;
            Some((ap, xs, ys))
        })
        .collect();

    let mut pixels = vec![false; width * height];
    pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let fy = y as f32;
            for (ap, xs, ys) in &bounded {
                if !ys.contains(&y) {
                    continue;
                }
                for x in xs.clone() {
                    if !row[x] && ap.contains(x as f32, fy) {
                        row[x] = true;
                    }
                }
            }
        });

    Buffer2::new(width, height, pixels)
}

/// Rasterize `apertures` onto the shape of `dilated` and OR the two masks.
pub fn assemble(apertures: &[Aperture], dilated: &Buffer2<bool>) -> Buffer2<bool> {
    let mut mask = rasterize_apertures(apertures, dilated.width(), dilated.height());
    mask.union_with(dilated);
    mask
}

/// Copy of `image` with every pixel set in `mask` replaced by `fill`.
pub fn apply_mask(image: &Buffer2<f32>, mask: &Buffer2<bool>, fill: f32) -> Result<Buffer2<f32>> {
    if !image.same_shape(mask) {
        return Err(Error::ShapeMismatch {
            expected: image.shape(),
            actual: mask.shape(),
        });
    }
    let mut out = image.clone();
    out.pixels_mut()
        .par_iter_mut()
        .zip(mask.pixels().par_iter())
        .for_each(|(v, &masked)| {
            if masked {
                *v = fill;
            }
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aperture::Centroid;

    #[test]
    fn test_no_apertures_gives_empty_canvas() {
        let mask = rasterize_apertures(&[], 12, 7);
        assert_eq!(mask.shape(), (12, 7));
        assert_eq!(mask.count_set(), 0);
    }

    #[test]
    fn test_circle_rasterization_matches_contains() {
        let ap = Aperture::circle(Centroid::new(20, 15), 6.0);
        let mask = rasterize_apertures(&[ap], 40, 40);
        for y in 0..40 {
            for x in 0..40 {
                assert_eq!(mask[(x, y)], ap.contains(x as f32, y as f32), "({x}, {y})");
            }
        }
        // Boundary pixels on the axes are inside.
        assert!(mask[(21, 20)]);
        assert!(mask[(15, 26)]);
        assert!(!mask[(22, 20)]);
    }

    #[test]
    fn test_apertures_clipped_at_edges() {
        let corner = Aperture::circle(Centroid::new(0, 0), 3.0);
        let outside = Aperture {
            x0: -50.0,
            y0: -50.0,
            a: 3.0,
            b: 3.0,
        };
        let mask = rasterize_apertures(&[corner, outside], 10, 10);
        // Quarter disk of radius 3: pixels with x^2 + y^2 <= 9.
        assert_eq!(mask.count_set(), 11);
    }

    #[test]
    fn test_overlapping_apertures_union() {
        let a = Aperture::circle(Centroid::new(10, 10), 4.0);
        let b = Aperture::circle(Centroid::new(10, 13), 4.0);
        let both = rasterize_apertures(&[a, b], 30, 30);
        let only_a = rasterize_apertures(&[a], 30, 30);
        let only_b = rasterize_apertures(&[b], 30, 30);
        for i in 0..both.len() {
            assert_eq!(both[i], only_a[i] || only_b[i]);
        }
    }

    #[test]
    fn test_assemble_ors_dilated_mask() {
        let mut dilated = Buffer2::new_filled(20, 20, false);
        dilated[(1, 1)] = true;
        let ap = Aperture::circle(Centroid::new(10, 10), 2.0);

        let mask = assemble(&[ap], &dilated);

        assert!(mask[(1, 1)]);
        assert!(mask[(10, 10)]);
        assert!(mask[(12, 10)]);
        assert!(!mask[(15, 15)]);
        assert_eq!(mask.count_set(), 1 + 13);
    }

    #[test]
    fn test_apply_mask_fills_masked_pixels() {
        let image = Buffer2::from_fn(4, 2, |x, y| (x + 10 * y) as f32);
        let mask = Buffer2::from_fn(4, 2, |x, _| x == 2);

        let out = apply_mask(&image, &mask, f32::NAN).unwrap();

        assert!(out[(2, 0)].is_nan());
        assert!(out[(2, 1)].is_nan());
        assert_eq!(out[(3, 1)], 13.0);
        assert_eq!(out[(0, 0)], 0.0);
    }

    #[test]
    fn test_apply_mask_shape_mismatch() {
        let image = Buffer2::new_filled(4, 4, 0.0f32);
        let mask = Buffer2::new_filled(4, 3, false);
        assert!(matches!(
            apply_mask(&image, &mask, 0.0),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}

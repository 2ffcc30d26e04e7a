//! Tests for aperture growth.

use super::*;
use crate::test_utils::disk_image;

fn params(icrit: f32, dr: f32, rmax: f32) -> GrowthParams {
    GrowthParams::new(icrit, dr, rmax, Estimator::Median).unwrap()
}

// =============================================================================
// Ring geometry
// =============================================================================

#[test]
fn test_rings_partition_the_plane() {
    for ring_width in [1.0f64, 2.5, 5.0, 20.0] {
        for dy in -60i64..=60 {
            for dx in -60i64..=60 {
                let d2 = dx * dx + dy * dy;
                let hits = (0..200)
                    .filter(|&ring| ring_contains(d2, ring, ring_width))
                    .count();
                assert_eq!(hits, 1, "dr {ring_width}, offset ({dx}, {dy})");
            }
        }
    }
}

#[test]
fn test_ring_zero_is_full_disk() {
    assert!(ring_contains(0, 0, 5.0));
    assert!(ring_contains(24, 0, 5.0));
    assert!(!ring_contains(25, 0, 5.0));
    assert!(ring_contains(25, 1, 5.0));
}

#[test]
fn test_annulus_flux_empty_ring_is_infinite() {
    let image = Buffer2::new_filled(10, 10, f32::NAN);
    let flux = annulus_flux(
        &image,
        None,
        Centroid::new(5, 5),
        0,
        3.0,
        Estimator::Median,
        &mut Vec::new(),
    );
    assert_eq!(flux, f32::INFINITY);
}

#[test]
fn test_annulus_flux_clips_to_image() {
    // Center in the corner: only the in-image quarter of the ring is sampled.
    let image = Buffer2::from_fn(10, 10, |x, y| (x + y) as f32);
    let mut scratch = Vec::new();
    let flux = annulus_flux(
        &image,
        None,
        Centroid::new(0, 0),
        0,
        2.0,
        Estimator::Mean,
        &mut scratch,
    );
    // Pixels with d2 < 4: (0,0), (1,0), (0,1), (1,1).
    assert_eq!(scratch.len(), 4);
    assert_eq!(flux, 1.0);
}

#[test]
fn test_annulus_flux_respects_exclusion_mask() {
    let mut image = Buffer2::new_filled(11, 11, 1.0f32);
    let mut exclusion = Buffer2::new_filled(11, 11, false);
    image[(5, 5)] = 1000.0;
    exclusion[(5, 5)] = true;

    let flux = annulus_flux(
        &image,
        Some(&exclusion),
        Centroid::new(5, 5),
        0,
        2.0,
        Estimator::Mean,
        &mut Vec::new(),
    );
    assert_eq!(flux, 1.0);
}

// =============================================================================
// Growth
// =============================================================================

#[test]
fn test_disk_scenario_stops_after_first_dark_ring() {
    // 100x100, disk of radius 5 at (50, 50) with value 1000, dr = 5.
    // Ring 0 is saturated, ring 1 is mostly background: radius 10.
    let image = disk_image(100, 100, 50, 50, 5.0, 1000.0);
    let growth = grow(&image, Centroid::new(50, 50), &params(1.0, 5.0, 50.0), &mut Vec::new())
        .unwrap();

    assert_eq!(growth.aperture.a, 10.0);
    assert_eq!(growth.aperture.b, 10.0);
    assert_eq!(growth.aperture.x0, 50.0);
    assert_eq!(growth.aperture.y0, 50.0);
    assert_eq!(growth.rings, 2);
    assert!(growth.exhausted.is_none());
}

#[test]
fn test_radius_is_multiple_of_ring_width() {
    let image = disk_image(200, 200, 100, 100, 33.0, 50.0);
    for dr in [3.0f32, 7.0, 10.0] {
        let growth = grow(&image, Centroid::new(100, 100), &params(1.0, dr, 90.0), &mut Vec::new())
            .unwrap();
        let a = growth.aperture.a;
        let steps = a / dr;
        assert!((steps - steps.round()).abs() < 1e-5, "radius {a} for dr {dr}");
        assert!(a >= dr && a <= 90.0);
        // The first ring below threshold must lie beyond the disk edge.
        assert!(a > 33.0);
        assert!(a <= 33.0 + 2.0 * dr);
    }
}

#[test]
fn test_max_radius_clamp_reports_centroid() {
    let image = Buffer2::new_filled(64, 64, 10.0f32);
    let centroid = Centroid::new(20, 30);

    let growth = grow(&image, centroid, &params(1.0, 5.0, 12.0), &mut Vec::new()).unwrap();

    assert_eq!(growth.aperture.a, 12.0);
    assert_eq!(growth.aperture.b, 12.0);
    assert_eq!(growth.rings, 3);
    assert_eq!(
        growth.exhausted,
        Some(RadiusExhausted {
            centroid,
            radius: 12.0
        })
    );
}

#[test]
fn test_dark_ring_beyond_max_radius_is_capped() {
    // dr = 5, Rmax = 12: rings 0 and 1 lie inside the disk, ring 2 ([10, 15))
    // is mostly background and stops growth with its outer edge past Rmax.
    let image = disk_image(64, 64, 32, 32, 11.0, 100.0);
    let centroid = Centroid::new(32, 32);

    let growth = grow(&image, centroid, &params(1.0, 5.0, 12.0), &mut Vec::new()).unwrap();

    assert_eq!(growth.aperture.a, 12.0);
    assert_eq!(growth.aperture.b, 12.0);
    assert_eq!(growth.rings, 3);
    assert!(growth.exhausted.is_none());
}

#[test]
fn test_radius_never_exceeds_max_radius() {
    for disk in [4.0f32, 9.0, 11.0, 14.0, 30.0] {
        let image = disk_image(80, 80, 40, 40, disk, 100.0);
        let growth = grow(&image, Centroid::new(40, 40), &params(1.0, 5.0, 12.0), &mut Vec::new())
            .unwrap();
        let a = growth.aperture.a;
        assert!(a >= 5.0 && a <= 12.0, "disk {disk}: radius {a}");
    }
}

#[test]
fn test_fully_excluded_neighbourhood_grows_to_max() {
    let image = Buffer2::new_filled(32, 32, f32::NAN);
    let growth = grow(&image, Centroid::new(16, 16), &params(1.0, 4.0, 40.0), &mut Vec::new())
        .unwrap();
    assert_eq!(growth.aperture.a, 40.0);
    assert!(growth.exhausted.is_some());
}

#[test]
fn test_threshold_is_inclusive() {
    let image = Buffer2::new_filled(20, 20, 2.0f32);
    let growth = grow(&image, Centroid::new(10, 10), &params(2.0, 4.0, 40.0), &mut Vec::new())
        .unwrap();
    assert_eq!(growth.aperture.a, 4.0);
    assert!(growth.exhausted.is_none());
}

#[test]
fn test_estimator_changes_growth() {
    // Ring 1 holds a few disk-edge pixels at 1000 and many background zeros:
    // the median sees background, the mean does not.
    let image = disk_image(100, 100, 50, 50, 5.0, 1000.0);
    let centroid = Centroid::new(50, 50);

    let median = grow(&image, centroid, &params(1.0, 5.0, 50.0), &mut Vec::new()).unwrap();
    let mean_params = GrowthParams::new(1.0, 5.0, 50.0, Estimator::Mean).unwrap();
    let mean = grow(&image, centroid, &mean_params, &mut Vec::new()).unwrap();

    assert_eq!(median.aperture.a, 10.0);
    assert_eq!(mean.aperture.a, 15.0);
}

#[test]
fn test_grow_with_mask_matches_nan_masked_grow() {
    let mut image = disk_image(80, 80, 40, 40, 6.0, 1000.0);
    // A bright neighbour inside ring 1 that would keep the aperture growing.
    for y in 45..52 {
        for x in 30..50 {
            image[(x, y)] = 800.0;
        }
    }
    let exclusion = Buffer2::from_fn(80, 80, |x, y| (30..50).contains(&x) && (45..52).contains(&y));
    let centroid = Centroid::new(40, 40);
    let p = params(1.0, 8.0, 64.0);

    let with_mask = grow_with_mask(&image, &exclusion, centroid, &p).unwrap();
    let masked = mask_excluded(&image, &exclusion).unwrap();
    let with_nan = grow(&masked, centroid, &p, &mut Vec::new()).unwrap();

    assert_eq!(with_mask, with_nan);
    let unmasked = grow(&image, centroid, &p, &mut Vec::new()).unwrap();
    assert!(unmasked.aperture.a >= with_mask.aperture.a);
}

#[test]
fn test_out_of_bounds_centroid_fails() {
    let image = Buffer2::new_filled(10, 10, 0.0f32);
    let err = grow(&image, Centroid::new(10, 2), &params(1.0, 2.0, 10.0), &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, Error::CentroidOutOfBounds { .. }));
}

#[test]
fn test_shape_mismatch_rejected() {
    let image = Buffer2::new_filled(10, 10, 0.0f32);
    let mask = Buffer2::new_filled(10, 9, false);
    assert!(matches!(
        mask_excluded(&image, &mask),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        grow_with_mask(&image, &mask, Centroid::new(1, 1), &params(1.0, 2.0, 4.0)),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_invalid_params_rejected() {
    assert!(matches!(
        GrowthParams::new(1.0, 0.0, 10.0, Estimator::Median),
        Err(ConfigError::RingWidth(_))
    ));
    assert!(matches!(
        GrowthParams::new(1.0, 5.0, 4.0, Estimator::Median),
        Err(ConfigError::MaxRadius { .. })
    ));
}

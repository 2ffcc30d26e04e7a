//! Parallel aperture growth over contiguous centroid chunks.
//!
//! Centroids are split with [`chunk_ranges`] and every chunk runs as one
//! rayon task against the shared image. Chunk results are concatenated in
//! chunk order, so the output order always equals the input order no matter
//! how many workers ran.


use common::parallel::chunk_ranges;
use common::Buffer2;
use rayon::prelude::*;

use crate::aperture::{Aperture, Centroid};
use crate::error::{Error, Result};
use crate::grower::{grow, Growth, GrowthParams, RadiusExhausted};

/// Apertures grown by [`dispatch_grow`], in centroid order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub apertures: Vec<Aperture>,
    /// Apertures clamped to the maximum radius, in centroid order.
    pub exhausted: Vec<RadiusExhausted>,
    /// Number of chunks the centroids were split into.
    pub chunks: usize,
}

/// Grow one aperture per centroid on `image` using `worker_count` chunks.
///
/// `image` must already carry NaN at every excluded pixel. A failure in any
/// chunk fails the whole call with [`Error::Worker`]; when several chunks
/// fail, the lowest chunk index is reported.
pub fn dispatch_grow(
    image: &Buffer2<f32>,
    centroids: &[Centroid],
    params: &GrowthParams,
    worker_count: usize,
) -> Result<Dispatch> {
    let ranges = chunk_ranges(centroids.len(), worker_count);
    let chunks = ranges.len();

    let results: Vec<Result<Vec<Growth>>> = ranges
        .into_par_iter()
        .enumerate()
        .map(|(chunk, range)| {
            grow_chunk(image, &centroids[range], params).map_err(|source| Error::Worker {
                chunk,
                source: Box::new(source),
            })
        })
        .collect();

    let mut dispatch = Dispatch {
        apertures: Vec::with_capacity(centroids.len()),
        exhausted: Vec::new(),
        chunks,
    };
    for result in results {
        for growth in result? {
            dispatch.apertures.push(growth.aperture);
            dispatch.exhausted.extend(growth.exhausted);
        }
    }

    tracing::debug!(
        apertures = dispatch.apertures.len(),
        exhausted = dispatch.exhausted.len(),
        chunks,
        "grew apertures"
    );
    Ok(dispatch)
}

/// Sequentially grow the centroids of one chunk, sharing a scratch buffer.
fn grow_chunk(
    image: &Buffer2<f32>,
    centroids: &[Centroid],
    params: &GrowthParams,
) -> Result<Vec<Growth>> {
    let mut scratch = Vec::new();
    centroids
        .iter()
        .map(|&centroid| grow(image, centroid, params, &mut scratch))
        .collect()
}

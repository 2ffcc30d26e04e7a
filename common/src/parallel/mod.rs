//! Parallel processing utilities.

use std::ops::Range;


/// Number of workers to use when the caller does not pick one.
#[inline]
pub fn default_worker_count() -> usize {
    rayon::current_num_threads().max(1)
}

/// Split `0..len` into `num_chunks` contiguous ranges of `len / num_chunks` items.
///
/// The last range absorbs the remainder. When `len < num_chunks` every range
/// but the last is empty. Always returns exactly `num_chunks.max(1)` ranges
/// that cover `0..len` in order without overlap.
pub fn chunk_ranges(len: usize, num_chunks: usize) -> Vec<Range<usize>> {
    let num_chunks = num_chunks.max(1);
    let chunk_len = len / num_chunks;

    (0..num_chunks)
        .map(|chunk_idx| {
            let start = chunk_idx * chunk_len;
            let end = if chunk_idx == num_chunks - 1 {
                len
            } else {
                start + chunk_len
            };
            start..end
        })
        .collect()
}

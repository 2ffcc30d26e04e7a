//! Connected component labeling and per-label peak location.
//!
//! Labeling is run-length based: each row is split into runs of foreground
//! pixels, runs overlapping the previous row are merged through a union-find,
//! and provisional labels are finally flattened to `1..=N` in raster order of
//! each component's first pixel.


use common::Buffer2;

use crate::aperture::Centroid;
use crate::config::Connectivity;
use crate::error::{Error, Result};

// ============================================================================
// Run-Length Encoding
// ============================================================================

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32, // Starting x coordinate (inclusive)
    end: u32,   // Ending x coordinate (exclusive)
    label: u32, // Provisional label
}

impl Run {
    /// Get the search window for finding overlapping runs in the previous row.
    /// Returns (start, end) where end is exclusive.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

/// Check if two runs from adjacent rows are connected.
#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

fn extract_runs(row: &[bool], runs: &mut Vec<Run>) {
    let mut x = 0;
    while x < row.len() {
        if !row[x] {
            x += 1;
            continue;
        }
        let start = x;
        while x < row.len() && row[x] {
            x += 1;
        }
        runs.push(Run {
            start: start as u32,
            end: x as u32,
            label: 0,
        });
    }
}

// ============================================================================
// LabelMap
// ============================================================================

/// A 2D label map from connected component analysis.
///
/// 0 is background; labels `1..=num_labels` each cover at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Buffer2<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Label the foreground pixels of `mask`.
    pub fn from_mask(mask: &Buffer2<bool>, connectivity: Connectivity) -> Self {
        let mut labels = Buffer2::new_filled(mask.width(), mask.height(), 0u32);
        let num_labels = label_into(mask, &mut labels, connectivity);
        Self { labels, num_labels }
    }

    /// Number of connected components (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn labels(&self) -> &Buffer2<u32> {
        &self.labels
    }

    /// Foreground (any label) as a boolean mask.
    pub fn foreground(&self) -> Buffer2<bool> {
        self.labels.map(|&l| l != 0)
    }

    /// Pixel count of every label, indexed by `label - 1`.
    pub fn areas(&self) -> Vec<usize> {
        let mut areas = vec![0usize; self.num_labels];
        for &l in self.labels.iter() {
            if l != 0 {
                areas[l as usize - 1] += 1;
            }
        }
        areas
    }
}

impl std::ops::Index<usize> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

/// Label `mask`. The region count is [`LabelMap::num_labels`].
pub fn label(mask: &Buffer2<bool>, connectivity: Connectivity) -> LabelMap {
    LabelMap::from_mask(mask, connectivity)
}

/// Merge current row's runs with previous row's runs via union-find.
///
/// For each run in `curr_runs`, finds overlapping runs in `prev_runs` and merges
/// their labels. Runs without overlap get a new label via `uf.make_set()`.
#[inline]
fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned_label = None;
        let mut check_idx = prev_idx;
        while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
            let prev_run = &prev_runs[check_idx];
            if runs_connected(prev_run, run, connectivity) {
                match assigned_label {
                    Some(label) if label != prev_run.label => uf.union(label, prev_run.label),
                    None => assigned_label = Some(prev_run.label),
                    _ => {}
                }
            }
            check_idx += 1;
        }

        run.label = assigned_label.unwrap_or_else(|| uf.make_set());
    }
}

fn label_into(mask: &Buffer2<bool>, labels: &mut Buffer2<u32>, connectivity: Connectivity) -> usize {
    let width = mask.width();
    if width == 0 || mask.height() == 0 {
        return 0;
    }

    let mut uf = UnionFind::new();
    let mut prev_runs: Vec<Run> = Vec::with_capacity(width / 4);
    let mut curr_runs: Vec<Run> = Vec::with_capacity(width / 4);

    for y in 0..mask.height() {
        curr_runs.clear();
        extract_runs(mask.row(y), &mut curr_runs);

        if curr_runs.is_empty() {
            prev_runs.clear();
            continue;
        }

        merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);

        let row_start = y * width;
        for run in &curr_runs {
            labels.pixels_mut()[row_start + run.start as usize..row_start + run.end as usize]
                .fill(run.label);
        }

        std::mem::swap(&mut prev_runs, &mut curr_runs);
    }

    uf.flatten_labels(labels.pixels_mut())
}

// ============================================================================
// Union-Find
// ============================================================================

#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    /// Find root with two-pass path compression.
    #[inline]
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        loop {
            let parent = self.parent[(root - 1) as usize];
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = label;
        while current != root {
            let idx = (current - 1) as usize;
            let parent = self.parent[idx];
            self.parent[idx] = root;
            current = parent;
        }

        root
    }

    /// Smaller label always becomes the root, keeping raster order stable.
    #[inline]
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Relabel provisional labels to sequential `1..=n`.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        let len = self.parent.len();
        if len == 0 {
            return 0;
        }

        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }

        for l in labels.iter_mut() {
            if *l != 0 {
                *l = label_map[*l as usize];
            }
        }

        num_labels as usize
    }
}

// ============================================================================
// Peak location
// ============================================================================

/// Position of the maximum of `image` inside every label, in label order.
///
/// Ties resolve to the first pixel in raster order. Non-finite pixels never
/// win over finite ones; a label with no finite pixel reports its first pixel.
pub fn argmax_per_label(image: &Buffer2<f32>, labels: &LabelMap) -> Result<Vec<Centroid>> {
    if !image.same_shape(labels.labels()) {
        return Err(Error::ShapeMismatch {
            expected: labels.labels().shape(),
            actual: image.shape(),
        });
    }

    let n = labels.num_labels();
    let mut best: Vec<Option<(usize, f32)>> = vec![None; n];

    for (idx, (&label, &value)) in labels.labels().iter().zip(image.iter()).enumerate() {
        if label == 0 {
            continue;
        }
        let slot = &mut best[label as usize - 1];
        match slot {
            None => *slot = Some((idx, value)),
            Some((_, current)) => {
                let better = value.is_finite() && (!current.is_finite() || value > *current);
                if better {
                    *slot = Some((idx, value));
                }
            }
        }
    }

    let width = image.width();
    Ok(best
        .into_iter()
        .map(|slot| {
            let (idx, _) = slot.expect("every label covers at least one pixel");
            Centroid::new(idx / width, idx % width)
        })
        .collect())
}

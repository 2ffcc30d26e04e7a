//! Centroid and aperture value types.

use std::fmt;
use std::ops::Range;

/// Integer pixel position of a saturated region's peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Centroid {
    pub row: usize,
    pub col: usize,
}

impl Centroid {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// Axis-aligned ellipse in pixel coordinates.
///
/// Apertures fitted around saturated stars are always circles (`a == b`),
/// but rasterization handles the general axis-aligned case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    /// Center column.
    pub x0: f32,
    /// Center row.
    pub y0: f32,
    /// Semi-axis along x.
    pub a: f32,
    /// Semi-axis along y.
    pub b: f32,
}

impl Aperture {
    #[inline]
    pub fn circle(centroid: Centroid, radius: f32) -> Self {
        Self {
            x0: centroid.col as f32,
            y0: centroid.row as f32,
            a: radius,
            b: radius,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.a.max(self.b)
    }

    #[inline]
    pub fn is_circle(&self) -> bool {
        self.a == self.b
    }

    /// Centroid the aperture was grown from (center rounded to the nearest pixel).
    #[inline]
    pub fn centroid(&self) -> Centroid {
        Centroid::new(self.y0.round() as usize, self.x0.round() as usize)
    }

    /// Whether pixel `(x, y)` lies inside or on the ellipse boundary.
    ///
    /// Evaluated as `dx^2 b^2 + dy^2 a^2 <= a^2 b^2` in f64, which is exact for
    /// integer offsets and semi-axes.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if !(self.a > 0.0 && self.b > 0.0) {
            return false;
        }
        let dx = x as f64 - self.x0 as f64;
        let dy = y as f64 - self.y0 as f64;
        let a2 = self.a as f64 * self.a as f64;
        let b2 = self.b as f64 * self.b as f64;
        dx * dx * b2 + dy * dy * a2 <= a2 * b2
    }

    /// Column and row ranges covering the ellipse, clipped to a `width` x `height` image.
    ///
    /// Returns `None` when the ellipse lies entirely outside the image.
    pub fn pixel_bounds(&self, width: usize, height: usize) -> Option<(Range<usize>, Range<usize>)> {
        let xs = clipped_range(self.x0 - self.a, self.x0 + self.a, width)?;
        let ys = clipped_range(self.y0 - self.b, self.y0 + self.b, height)?;
        Some((xs, ys))
    }
}

fn clipped_range(lo: f32, hi: f32, len: usize) -> Option<Range<usize>> {
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let start = lo.floor().max(0.0);
    let end = (hi.ceil() + 1.0).min(len as f32);
    if end <= start {
        return None;
    }
    Some(start as usize..end as usize)
}

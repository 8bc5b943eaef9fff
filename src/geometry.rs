use serde::{Deserialize, Serialize};

/// Tolerance for border comparisons on accumulated float offsets.
pub const EPS: f64 = 1e-6;

/// Axis-aligned rectangle in roof-plane millimetres. `x` runs along the roof
/// length, `y` away from the ridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Half-open overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Grows the rectangle outward by `dx` on the left and right and `dy` on
    /// the top and bottom.
    pub fn inflated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x - dx,
            y: self.y - dy,
            w: self.w + 2.0 * dx,
            h: self.h + 2.0 * dy,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// True if the rectangle lies inside `[min_x, max_x] x [min_y, max_y]`.
    pub fn within(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        self.x >= min_x - EPS
            && self.y >= min_y - EPS
            && self.right() <= max_x + EPS
            && self.bottom() <= max_y + EPS
    }

    /// True if the vertical span `[y0, y1]` intersects this rectangle's.
    pub fn spans_rows(&self, y0: f64, y1: f64) -> bool {
        !(y1 <= self.y || self.bottom() <= y0)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} @ ({}, {})", self.w, self.h, self.x, self.y)
    }
}

pub fn any_overlap(rect: &Rect, masks: &[Rect]) -> bool {
    masks.iter().any(|m| rect.overlaps(m))
}

/// Sorts and merges intervals that overlap or touch.
pub fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (a, b) in intervals {
        match merged.last_mut() {
            Some(last) if a <= last.1 => last.1 = last.1.max(b),
            _ => merged.push((a, b)),
        }
    }
    merged
}

/// Complement of `blocks` inside `base`. Blocks are clipped to `base` first;
/// empty or disjoint blocks are ignored.
pub fn free_intervals(base: (f64, f64), blocks: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let (a0, b0) = base;
    let clipped: Vec<(f64, f64)> = blocks
        .iter()
        .filter(|(a, b)| b > a && !(*b <= a0 || *a >= b0))
        .map(|&(a, b)| (a.max(a0), b.min(b0)))
        .collect();

    let mut free = Vec::new();
    let mut cur = a0;
    for (a, b) in merge_intervals(clipped) {
        if a > cur {
            free.push((cur, a));
        }
        cur = cur.max(b);
    }
    if cur < b0 {
        free.push((cur, b0));
    }
    free
}

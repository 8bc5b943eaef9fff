use crate::geometry::any_overlap;
use crate::types::{LayoutResult, Obstacle, inflated_all};

/// Drops every lattice cell that overlaps an inflated obstacle. The result
/// lists the surviving cells; `rows`/`cols` stay as the nominal grid.
pub fn mask(layout: &LayoutResult, obstacles: &[Obstacle]) -> LayoutResult {
    let masks = inflated_all(obstacles);
    let kept = layout
        .grid_cells()
        .filter(|cell| !any_overlap(cell, &masks))
        .collect();
    layout.with_placed(kept)
}

//! Gap filling after obstacle masking.
//!
//! Masking leaves irregular holes a regular lattice cannot reach. This pass
//! scans horizontal strips one panel high, computes the free x-intervals of
//! each strip and packs panels left-aligned into them. Two vertical phases
//! are tried (0 and half a pitch) and the one adding more panels wins.

use tracing::debug;

use crate::geometry::{EPS, Rect, any_overlap, free_intervals};
use crate::types::{LayoutResult, Obstacle, PanelSpec, RoofPlane, inflated_all};

/// Packs additional `panel.width` x `panel.height` footprints into the space
/// left free by `layout`. Returns `layout` unchanged if nothing fits.
pub fn augment(
    roof: &RoofPlane,
    panel: &PanelSpec,
    layout: &LayoutResult,
    obstacles: &[Obstacle],
) -> LayoutResult {
    let mut base_masks = inflated_all(obstacles);
    base_masks.extend(
        layout
            .placed_rects
            .iter()
            .map(|r| r.inflated(panel.gap_x, panel.gap_y)),
    );

    let phases = [0.0, (panel.height + panel.gap_y) / 2.0];
    let mut best: Vec<Rect> = Vec::new();
    for y_off in phases {
        let added = scan_phase(roof, panel, layout, &base_masks, y_off);
        debug!(y_off, added = added.len(), "gap-fill phase");
        if added.len() > best.len() {
            best = added;
        }
    }

    if best.is_empty() {
        return layout.clone();
    }

    let added = best.len();
    let mut placed = layout.placed_rects.clone();
    placed.extend(best);
    layout
        .with_placed(placed)
        .with_note(format!("gap-fill +{added}"))
}

fn scan_phase(
    roof: &RoofPlane,
    panel: &PanelSpec,
    layout: &LayoutResult,
    base_masks: &[Rect],
    y_off: f64,
) -> Vec<Rect> {
    let (bx, by) = (layout.border_x, layout.border_y);
    let (pw, ph) = (panel.width, panel.height);
    let pitch_x = pw + panel.gap_x;
    let pitch_y = ph + panel.gap_y;
    if pw <= 0.0 || ph <= 0.0 || pitch_y <= 0.0 {
        return Vec::new();
    }

    let mut masks = base_masks.to_vec();
    let mut added = Vec::new();
    let mut y = by + y_off;
    while y + ph <= roof.width - by + EPS {
        let blocks: Vec<(f64, f64)> = masks
            .iter()
            .filter(|m| m.spans_rows(y, y + ph))
            .map(|m| (m.x, m.right()))
            .collect();

        for (a, b) in free_intervals((bx, roof.length - bx), &blocks) {
            let fit = ((b - a + panel.gap_x) / pitch_x).floor();
            if fit < 1.0 {
                continue;
            }
            for i in 0..fit as usize {
                let candidate = Rect::new(a + i as f64 * pitch_x, y, pw, ph);
                if !any_overlap(&candidate, &masks) {
                    added.push(candidate);
                    masks.push(candidate.inflated(panel.gap_x, panel.gap_y));
                }
            }
        }
        y += pitch_y;
    }
    added
}

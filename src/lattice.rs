//! Regular grid placement and portrait/landscape selection.

use crate::types::{
    AlignX, AlignY, Alignment, Border, LayoutResult, Orientation, OrientationMode, PanelSpec,
    RoofPlane,
};

/// Maximal regular grid for one footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub cols: usize,
    pub rows: usize,
    pub total: usize,
    pub coverage_eff: f64,
    pub start_x: f64,
    pub start_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Center,
    End,
}

impl From<AlignX> for Anchor {
    fn from(a: AlignX) -> Self {
        match a {
            AlignX::Left => Anchor::Start,
            AlignX::Center => Anchor::Center,
            AlignX::Right => Anchor::End,
        }
    }
}

impl From<AlignY> for Anchor {
    fn from(a: AlignY) -> Self {
        match a {
            AlignY::Top => Anchor::Start,
            AlignY::Center => Anchor::Center,
            AlignY::Bottom => Anchor::End,
        }
    }
}

/// Panels along one axis; the last panel needs no trailing gap.
fn count_along(span: f64, dim: f64, gap: f64) -> usize {
    let pitch = dim + gap;
    if pitch <= 0.0 || dim <= 0.0 {
        return 0;
    }
    ((span + gap) / pitch).floor().max(0.0) as usize
}

fn used_span(n: usize, dim: f64, gap: f64) -> f64 {
    n as f64 * dim + n.saturating_sub(1) as f64 * gap
}

fn offset(margin: f64, slack: f64, anchor: Anchor) -> f64 {
    match anchor {
        Anchor::Start => margin,
        Anchor::Center => margin + 0.5 * slack,
        Anchor::End => margin + slack,
    }
}

/// Fits the largest `cols` x `rows` grid of `panel.width` x `panel.height`
/// footprints into the roof minus its border.
pub fn lattice(roof: &RoofPlane, border: Border, panel: &PanelSpec, align: Alignment) -> Lattice {
    let span_x = roof.length - 2.0 * border.x;
    let span_y = roof.width - 2.0 * border.y;
    if span_x <= 0.0 || span_y <= 0.0 {
        return Lattice {
            cols: 0,
            rows: 0,
            total: 0,
            coverage_eff: 0.0,
            start_x: border.x,
            start_y: border.y,
        };
    }

    let cols = count_along(span_x, panel.width, panel.gap_x);
    let rows = count_along(span_y, panel.height, panel.gap_y);
    let total = cols * rows;

    let slack_x = span_x - used_span(cols, panel.width, panel.gap_x);
    let slack_y = span_y - used_span(rows, panel.height, panel.gap_y);

    Lattice {
        cols,
        rows,
        total,
        coverage_eff: total as f64 * panel.width * panel.height / (span_x * span_y),
        start_x: offset(border.x, slack_x, align.x.into()),
        start_y: offset(border.y, slack_y, align.y.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationChoice {
    pub orientation: Orientation,
    /// Panel spec with width/height already swapped for the orientation.
    pub panel: PanelSpec,
    pub lattice: Lattice,
}

/// Compares centred portrait and landscape grids. Landscape wins only with
/// strictly more panels.
pub fn best_orientation(roof: &RoofPlane, border: Border, panel: &PanelSpec) -> OrientationChoice {
    let centred = Alignment::default();
    let portrait = panel.oriented(Orientation::Portrait);
    let landscape = panel.oriented(Orientation::Landscape);
    let lat_p = lattice(roof, border, &portrait, centred);
    let lat_l = lattice(roof, border, &landscape, centred);

    if lat_l.total > lat_p.total {
        OrientationChoice {
            orientation: Orientation::Landscape,
            panel: landscape,
            lattice: lat_l,
        }
    } else {
        OrientationChoice {
            orientation: Orientation::Portrait,
            panel: portrait,
            lattice: lat_p,
        }
    }
}

pub fn resolve_orientation(
    roof: &RoofPlane,
    border: Border,
    panel: &PanelSpec,
    mode: OrientationMode,
) -> Orientation {
    match mode {
        OrientationMode::Auto => best_orientation(roof, border, panel).orientation,
        OrientationMode::Portrait => Orientation::Portrait,
        OrientationMode::Landscape => Orientation::Landscape,
    }
}

/// Dense grid layout for one roof side with every lattice cell placed.
pub fn fill_roof(
    roof: &RoofPlane,
    border: Border,
    panel: &PanelSpec,
    mode: OrientationMode,
    align: Alignment,
) -> LayoutResult {
    let orientation = resolve_orientation(roof, border, panel, mode);
    let oriented = panel.oriented(orientation);
    let lat = lattice(roof, border, &oriented, align);

    let layout = LayoutResult {
        roof: *roof,
        rows: lat.rows,
        cols: lat.cols,
        total_panels: 0,
        coverage_eff: 0.0,
        border_x: border.x,
        border_y: border.y,
        start_x: lat.start_x,
        start_y: lat.start_y,
        panel_w: oriented.width,
        panel_h: oriented.height,
        gap_x: oriented.gap_x,
        gap_y: oriented.gap_y,
        orientation,
        placed_rects: Vec::new(),
        note: None,
    };
    let cells = layout.grid_cells().collect();
    layout.with_placed(cells)
}

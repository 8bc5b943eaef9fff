use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::Rect;

/// One rectangular roof slope. `length` runs along the ridge (x axis),
/// `width` is measured away from the ridge (y axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofPlane {
    pub width: f64,
    pub length: f64,
}

impl RoofPlane {
    pub fn new(width: f64, length: f64) -> Self {
        Self { width, length }
    }

    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

impl std::fmt::Display for RoofPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.length, self.width)
    }
}

/// Panel footprint and spacing. `width`/`height` describe portrait
/// orientation; [`PanelSpec::oriented`] swaps them for landscape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub gap_x: f64,
    #[serde(default)]
    pub gap_y: f64,
    #[serde(default = "default_clamp_margin")]
    pub clamp_margin: f64,
}

fn default_clamp_margin() -> f64 {
    30.0
}

impl PanelSpec {
    pub fn new(width: f64, height: f64, gap_x: f64, gap_y: f64) -> Self {
        Self {
            width,
            height,
            gap_x,
            gap_y,
            clamp_margin: default_clamp_margin(),
        }
    }

    pub fn with_clamp_margin(mut self, clamp_margin: f64) -> Self {
        self.clamp_margin = clamp_margin;
        self
    }

    pub fn oriented(&self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => *self,
            Orientation::Landscape => Self {
                width: self.height,
                height: self.width,
                ..*self
            },
        }
    }
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self::new(1000.0, 1700.0, 100.0, 100.0)
    }
}

/// Mandatory empty perimeter strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub x: f64,
    pub y: f64,
}

impl Border {
    pub fn uniform(margin: f64) -> Self {
        Self {
            x: margin,
            y: margin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L", alias = "left")]
    Left,
    #[serde(rename = "R", alias = "right")]
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "L"),
            Side::Right => write!(f, "R"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// One-letter tag used on genetic slots.
    pub fn tag(&self) -> char {
        match self {
            Orientation::Portrait => 'P',
            Orientation::Landscape => 'L',
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Requested orientation; `Auto` defers to the orientation selector.
/// Deserialized through [`FromStr`] so unknown names report
/// [`Error::InvalidOrientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OrientationMode {
    #[default]
    Auto,
    Portrait,
    Landscape,
}

impl From<Orientation> for OrientationMode {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Portrait => OrientationMode::Portrait,
            Orientation::Landscape => OrientationMode::Landscape,
        }
    }
}

impl FromStr for OrientationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OrientationMode::Auto),
            "portrait" => Ok(OrientationMode::Portrait),
            "landscape" => Ok(OrientationMode::Landscape),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl TryFrom<String> for OrientationMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignX {
    Left,
    #[default]
    Center,
    Right,
}

impl AlignX {
    pub const ALL: [AlignX; 3] = [AlignX::Left, AlignX::Center, AlignX::Right];
}

/// Vertical alignment; `Top` hugs the ridge side of the roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignY {
    Top,
    #[default]
    Center,
    Bottom,
}

impl AlignY {
    pub const ALL: [AlignY; 3] = [AlignY::Top, AlignY::Center, AlignY::Bottom];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alignment {
    pub x: AlignX,
    pub y: AlignY,
}

impl Alignment {
    pub fn new(x: AlignX, y: AlignY) -> Self {
        Self { x, y }
    }

    /// All nine combinations, x-major.
    pub fn all() -> impl Iterator<Item = Alignment> {
        AlignX::ALL
            .into_iter()
            .flat_map(|x| AlignY::ALL.into_iter().map(move |y| Alignment::new(x, y)))
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let x = match self.x {
            AlignX::Left => "left",
            AlignX::Center => "center",
            AlignX::Right => "right",
        };
        let y = match self.y {
            AlignY::Top => "top",
            AlignY::Center => "center",
            AlignY::Bottom => "bottom",
        };
        write!(f, "{x}/{y}")
    }
}

/// Decoration parameters per obstacle type, carried for display only;
/// packing sees the clearance-inflated footprint alone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObstacleKind {
    Window {
        #[serde(default = "default_frame_t")]
        frame_t: f64,
        #[serde(default = "default_grid_cols")]
        grid_cols: u32,
        #[serde(default = "default_grid_rows")]
        grid_rows: u32,
    },
    Chimney {
        #[serde(default = "default_cap_over")]
        cap_over: f64,
    },
    #[default]
    Generic,
}

fn default_frame_t() -> f64 {
    80.0
}

fn default_grid_cols() -> u32 {
    2
}

fn default_grid_rows() -> u32 {
    3
}

fn default_cap_over() -> f64 {
    80.0
}

impl ObstacleKind {
    pub fn window() -> Self {
        ObstacleKind::Window {
            frame_t: default_frame_t(),
            grid_cols: default_grid_cols(),
            grid_rows: default_grid_rows(),
        }
    }

    pub fn chimney() -> Self {
        ObstacleKind::Chimney {
            cap_over: default_cap_over(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObstacleKind::Window { .. } => "window",
            ObstacleKind::Chimney { .. } => "chimney",
            ObstacleKind::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub side: Side,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub clearance: f64,
    #[serde(default, alias = "elev")]
    pub elevation: f64,
    #[serde(default)]
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(side: Side, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            side,
            x,
            y,
            w,
            h,
            clearance: 0.0,
            elevation: 0.0,
            kind: ObstacleKind::Generic,
        }
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_kind(mut self, kind: ObstacleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Footprint grown by the clearance on every side; the exclusion zone
    /// used for collision checks.
    pub fn inflated(&self) -> Rect {
        self.footprint().inflated(self.clearance, self.clearance)
    }
}

pub fn inflated_all(obstacles: &[Obstacle]) -> Vec<Rect> {
    obstacles.iter().map(Obstacle::inflated).collect()
}

/// Layout of one roof side. Every pipeline stage returns a fresh value;
/// `rows`/`cols` describe the underlying lattice and become nominal once
/// cells were masked out or panels were added outside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub roof: RoofPlane,
    pub rows: usize,
    pub cols: usize,
    pub total_panels: usize,
    pub coverage_eff: f64,
    pub border_x: f64,
    pub border_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub panel_w: f64,
    pub panel_h: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    pub orientation: Orientation,
    pub placed_rects: Vec<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LayoutResult {
    /// Cells of the dense lattice described by `start`, `rows` x `cols`.
    pub fn grid_cells(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.rows).flat_map(move |r| {
            let y = self.start_y + r as f64 * (self.panel_h + self.gap_y);
            (0..self.cols).map(move |c| {
                let x = self.start_x + c as f64 * (self.panel_w + self.gap_x);
                Rect::new(x, y, self.panel_w, self.panel_h)
            })
        })
    }

    pub fn usable_area(&self) -> f64 {
        let l = self.roof.length - 2.0 * self.border_x;
        let w = self.roof.width - 2.0 * self.border_y;
        if l > 0.0 && w > 0.0 { l * w } else { 0.0 }
    }

    /// Panel footprint area in square metres.
    pub fn panel_area_m2(&self) -> f64 {
        self.placed_rects.iter().map(Rect::area).sum::<f64>() / 1e6
    }

    /// Functional update: same lattice metadata, new placement set.
    pub fn with_placed(&self, placed_rects: Vec<Rect>) -> Self {
        let usable = self.usable_area();
        let covered: f64 = placed_rects.iter().map(Rect::area).sum();
        Self {
            total_panels: placed_rects.len(),
            coverage_eff: if usable > 0.0 { covered / usable } else { 0.0 },
            placed_rects,
            ..self.clone()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Power and cost estimate inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    #[serde(default = "default_panel_power")]
    pub panel_power_w: f64,
    #[serde(default = "default_cost_per_panel")]
    pub cost_per_panel: f64,
}

fn default_panel_power() -> f64 {
    400.0
}

fn default_cost_per_panel() -> f64 {
    800.0
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            panel_power_w: default_panel_power(),
            cost_per_panel: default_cost_per_panel(),
        }
    }
}

impl Economics {
    pub fn power_kw(&self, panels: usize) -> f64 {
        self.panel_power_w * panels as f64 / 1000.0
    }

    pub fn cost(&self, panels: usize) -> f64 {
        self.cost_per_panel * panels as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roof_area() {
        assert_eq!(RoofPlane::new(5500.0, 20000.0).area(), 110_000_000.0);
    }

    #[test]
    fn test_oriented_swaps_dimensions() {
        let p = PanelSpec::new(1000.0, 1700.0, 100.0, 50.0);
        let l = p.oriented(Orientation::Landscape);
        assert_eq!((l.width, l.height), (1700.0, 1000.0));
        assert_eq!((l.gap_x, l.gap_y), (100.0, 50.0));
        assert_eq!(p.oriented(Orientation::Portrait), p);
    }

    #[test]
    fn test_orientation_mode_parse() {
        assert_eq!("auto".parse::<OrientationMode>().unwrap(), OrientationMode::Auto);
        assert_eq!(
            "landscape".parse::<OrientationMode>().unwrap(),
            OrientationMode::Landscape
        );
        assert!(matches!(
            "diagonal".parse::<OrientationMode>(),
            Err(Error::InvalidOrientation(s)) if s == "diagonal"
        ));
    }

    #[test]
    fn test_obstacle_inflated_keeps_original() {
        let ob = Obstacle::new(Side::Left, 5000.0, 2870.0, 780.0, 1180.0).with_clearance(100.0);
        assert_eq!(ob.inflated(), Rect::new(4900.0, 2770.0, 980.0, 1380.0));
        assert_eq!(ob.footprint(), Rect::new(5000.0, 2870.0, 780.0, 1180.0));
    }

    #[test]
    fn test_builders_keep_geometry() {
        let panel = PanelSpec::default().with_clamp_margin(45.0);
        assert_eq!(panel.clamp_margin, 45.0);
        assert_eq!(panel.oriented(Orientation::Landscape).clamp_margin, 45.0);

        let ob = Obstacle::new(Side::Right, 12000.0, 1500.0, 600.0, 600.0)
            .with_clearance(150.0)
            .with_elevation(900.0)
            .with_kind(ObstacleKind::chimney());
        assert_eq!(ob.elevation, 900.0);
        assert_eq!(ob.kind, ObstacleKind::Chimney { cap_over: 80.0 });
        assert_eq!(ob.kind.name(), "chimney");
        // decoration never changes the exclusion zone
        assert_eq!(ob.inflated(), Rect::new(11850.0, 1350.0, 900.0, 900.0));
    }

    #[test]
    fn test_obstacle_deserialize_kinds() {
        let json = r#"[
            {"side": "L", "x": 1, "y": 2, "w": 3, "h": 4, "clearance": 5,
             "kind": {"type": "window", "grid_cols": 4}},
            {"side": "right", "x": 1, "y": 2, "w": 3, "h": 4, "elev": 900,
             "kind": {"type": "chimney"}},
            {"side": "R", "x": 1, "y": 2, "w": 3, "h": 4}
        ]"#;
        let obs: Vec<Obstacle> = serde_json::from_str(json).unwrap();
        assert_eq!(
            obs[0].kind,
            ObstacleKind::Window {
                frame_t: 80.0,
                grid_cols: 4,
                grid_rows: 3
            }
        );
        assert_eq!(obs[1].side, Side::Right);
        assert_eq!(obs[1].elevation, 900.0);
        assert_eq!(obs[1].kind.name(), "chimney");
        assert_eq!(obs[2].kind, ObstacleKind::Generic);
        assert_eq!(obs[2].clearance, 0.0);
    }

    #[test]
    fn test_alignment_all_covers_nine() {
        let all: Vec<Alignment> = Alignment::all().collect();
        assert_eq!(all.len(), 9);
        assert_eq!(all[0].to_string(), "left/top");
        assert_eq!(all[8].to_string(), "right/bottom");
    }

    #[test]
    fn test_economics() {
        let e = Economics::default();
        assert!((e.power_kw(34) - 13.6).abs() < 1e-9);
        assert_eq!(e.cost(34), 27200.0);
    }
}

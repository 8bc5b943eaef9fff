use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::augment::augment;
use crate::config::{Config, Strategy};
use crate::error::{Error, Result};
use crate::genetic::GeneticPlacer;
use crate::lattice::{fill_roof, lattice};
use crate::mask::mask;
use crate::types::{
    Alignment, Border, Economics, LayoutResult, Obstacle, Orientation, OrientationMode, PanelSpec,
    RoofPlane, Side,
};
use crate::validate::validate;

/// Number of ranked variants kept by the alignment search.
pub const TOP_VARIANTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SideLayout {
    pub side: Side,
    pub layout: LayoutResult,
    /// Best-so-far fitness per generation; empty for grid layouts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub rank: usize,
    /// `None` for the genetic strategy, which has no grid alignment.
    pub alignment: Option<Alignment>,
    pub total_panels: usize,
    pub sides: Vec<SideLayout>,
}

impl Variant {
    pub fn side(&self, side: Side) -> Option<&LayoutResult> {
        self.sides
            .iter()
            .find(|s| s.side == side)
            .map(|s| &s.layout)
    }

    pub fn panel_area_m2(&self) -> f64 {
        self.sides.iter().map(|s| s.layout.panel_area_m2()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub strategy: Strategy,
    /// Base orientation of the grid search; `None` when orientations mix.
    pub orientation: Option<Orientation>,
    /// Best first.
    pub variants: Vec<Variant>,
    pub economics: Economics,
}

impl Solution {
    pub fn best(&self) -> Option<&Variant> {
        self.variants.first()
    }

    pub fn total_panels(&self) -> usize {
        self.best().map_or(0, |v| v.total_panels)
    }

    pub fn power_kw(&self) -> f64 {
        self.economics.power_kw(self.total_panels())
    }

    pub fn cost(&self) -> f64 {
        self.economics.cost(self.total_panels())
    }

    /// Pretty JSON of the whole solution. Serialization failures are output
    /// errors, reported as [`Error::Io`].
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Io(e.into()))
    }
}

/// Lattice, obstacle mask, then gap fill for one roof side.
pub fn run_pipeline(
    roof: &RoofPlane,
    border: Border,
    panel: &PanelSpec,
    orientation: Orientation,
    alignment: Alignment,
    obstacles: &[Obstacle],
) -> LayoutResult {
    let grid = fill_roof(roof, border, panel, orientation.into(), alignment);
    let masked = mask(&grid, obstacles);
    augment(roof, panel, &masked, obstacles)
}

pub struct Solver {
    config: Config,
}

impl Solver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn solve(&self) -> Result<Solution> {
        match self.config.strategy {
            Strategy::Grid => self.search_alignments(),
            Strategy::Genetic => {
                let mut rng = match self.config.genetic.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                self.solve_genetic(&mut rng)
            }
        }
    }

    /// One orientation for every side. `Auto` compares centred portrait and
    /// landscape grids summed over all sides; landscape needs strictly more.
    pub fn choose_orientation(&self) -> Orientation {
        match self.config.orientation {
            OrientationMode::Portrait => Orientation::Portrait,
            OrientationMode::Landscape => Orientation::Landscape,
            OrientationMode::Auto => {
                let border = self.config.border();
                let count = |o: Orientation| -> usize {
                    let panel = self.config.panel.oriented(o);
                    self.config
                        .sides()
                        .iter()
                        .map(|(_, roof)| lattice(roof, border, &panel, Alignment::default()).total)
                        .sum()
                };
                if count(Orientation::Landscape) > count(Orientation::Portrait) {
                    Orientation::Landscape
                } else {
                    Orientation::Portrait
                }
            }
        }
    }

    /// Runs the pipeline for all nine alignments and keeps the best
    /// [`TOP_VARIANTS`] by total panel count. Ties keep enumeration order.
    pub fn search_alignments(&self) -> Result<Solution> {
        let orientation = self.choose_orientation();
        info!(%orientation, "base orientation");

        let mut top: Vec<Variant> = Vec::with_capacity(TOP_VARIANTS + 1);
        for alignment in Alignment::all() {
            let sides = self.layout_sides(orientation, alignment)?;
            let total_panels = sides.iter().map(|s| s.layout.total_panels).sum();
            debug!(%alignment, total_panels, "alignment evaluated");

            top.push(Variant {
                rank: 0,
                alignment: Some(alignment),
                total_panels,
                sides,
            });
            top.sort_by(|a, b| b.total_panels.cmp(&a.total_panels));
            top.truncate(TOP_VARIANTS);
        }

        for (i, v) in top.iter_mut().enumerate() {
            v.rank = i + 1;
        }
        if let Some(best) = top.first() {
            info!(
                total_panels = best.total_panels,
                alignment = %best.alignment.unwrap_or_default(),
                "best variant"
            );
        }

        Ok(Solution {
            strategy: Strategy::Grid,
            orientation: Some(orientation),
            variants: top,
            economics: self.config.economics,
        })
    }

    fn layout_sides(&self, orientation: Orientation, alignment: Alignment) -> Result<Vec<SideLayout>> {
        let border = self.config.border();
        let mut sides = Vec::new();
        for (side, roof) in self.config.sides() {
            let obstacles = self.config.obstacles_for(side);
            let layout = run_pipeline(
                &roof,
                border,
                &self.config.panel,
                orientation,
                alignment,
                &obstacles,
            );
            validate(&roof, border, &layout, &obstacles)?;
            if layout.total_panels == 0 {
                warn!(%side, %alignment, "no panel fits on this side");
            }
            sides.push(SideLayout {
                side,
                layout,
                history: Vec::new(),
            });
        }
        Ok(sides)
    }

    /// Genetic slot placement per side with an injected random source.
    pub fn solve_genetic<R: Rng>(&self, rng: &mut R) -> Result<Solution> {
        let border = self.config.border();
        let mut sides = Vec::new();
        for (side, roof) in self.config.sides() {
            let obstacles = self.config.obstacles_for(side);
            let outcome = GeneticPlacer::new(
                side,
                &roof,
                &self.config.panel,
                border,
                &obstacles,
                &self.config.genetic,
            )
            .run(rng)?;
            validate(&roof, border, &outcome.layout, &obstacles)?;
            sides.push(SideLayout {
                side,
                layout: outcome.layout,
                history: outcome.history,
            });
        }

        let total_panels = sides.iter().map(|s| s.layout.total_panels).sum();
        info!(total_panels, "genetic layout");

        Ok(Solution {
            strategy: Strategy::Genetic,
            orientation: None,
            variants: vec![Variant {
                rank: 1,
                alignment: None,
                total_panels,
                sides,
            }],
            economics: self.config.economics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::types::{AlignX, AlignY};

    fn window() -> Obstacle {
        Obstacle::new(Side::Left, 5000.0, 2870.0, 780.0, 1180.0).with_clearance(100.0)
    }

    fn assert_variant_valid(config: &Config, variant: &Variant) {
        let border = config.border();
        let mut sum = 0;
        for s in &variant.sides {
            let roof = if s.side == Side::Left {
                config.roof_left
            } else {
                config.roof_right.unwrap()
            };
            let obstacles = config.obstacles_for(s.side);
            assert!(validate(&roof, border, &s.layout, &obstacles).is_ok());
            assert_eq!(s.layout.total_panels, s.layout.placed_rects.len());
            assert!(s.layout.coverage_eff <= 1.0);
            let rects = &s.layout.placed_rects;
            for i in 0..rects.len() {
                for j in (i + 1)..rects.len() {
                    assert!(!rects[i].overlaps(&rects[j]), "{} overlaps {}", rects[i], rects[j]);
                }
            }
            sum += s.layout.total_panels;
        }
        assert_eq!(sum, variant.total_panels);
    }

    #[test]
    fn test_pipeline_with_window() {
        let layout = run_pipeline(
            &RoofPlane::new(5500.0, 20000.0),
            Border::uniform(300.0),
            &PanelSpec::default(),
            Orientation::Portrait,
            Alignment::default(),
            &[window()],
        );
        assert_eq!(layout.total_panels, 32);
        assert!(layout.placed_rects.iter().all(|r| !r.overlaps(&window().inflated())));
    }

    #[test]
    fn test_auto_orientation_sums_sides() {
        let solver = Solver::new(Config::default());
        assert_eq!(solver.choose_orientation(), Orientation::Landscape);

        let mut config = Config::default();
        config.panel = PanelSpec::new(1000.0, 1000.0, 100.0, 100.0);
        assert_eq!(Solver::new(config).choose_orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_search_keeps_top_three_sorted() {
        let mut config = Config::default();
        config.obstacles = vec![
            window(),
            Obstacle::new(Side::Right, 12000.0, 1500.0, 600.0, 600.0).with_clearance(150.0),
        ];
        let solution = Solver::new(config.clone()).solve().unwrap();
        assert_eq!(solution.strategy, Strategy::Grid);
        assert_eq!(solution.orientation, Some(Orientation::Landscape));
        assert_eq!(solution.variants.len(), TOP_VARIANTS);
        for (i, v) in solution.variants.iter().enumerate() {
            assert_eq!(v.rank, i + 1);
            assert!(v.alignment.is_some());
            assert_variant_valid(&config, v);
        }
        assert!(
            solution
                .variants
                .windows(2)
                .all(|w| w[0].total_panels >= w[1].total_panels)
        );
        assert_eq!(solution.total_panels(), solution.variants[0].total_panels);
    }

    #[test]
    fn test_search_without_obstacles_fills_slack() {
        let solution = Solver::new(Config::default()).solve().unwrap();
        // 10 x 4 landscape per side, plus a portrait column of two in the
        // 1400 mm slack left by a left- or right-aligned grid
        assert_eq!(solution.total_panels(), 84);
        let best = solution.best().unwrap();
        assert_eq!(best.alignment, Some(Alignment::new(AlignX::Left, AlignY::Top)));
        let left = best.side(Side::Left).unwrap();
        assert_eq!(left.note.as_deref(), Some("gap-fill +2"));
        assert!(left.placed_rects.contains(&Rect::new(18300.0, 300.0, 1000.0, 1700.0)));
        assert!((solution.power_kw() - 33.6).abs() < 1e-9);
        assert_eq!(solution.cost(), 67200.0);
        assert!((best.panel_area_m2() - 142.8).abs() < 1e-9);
    }

    #[test]
    fn test_solution_json() {
        let mut config = Config::default();
        config.roof_right = None;
        let solver = Solver::new(config);
        assert_eq!(solver.config().strategy, Strategy::Grid);
        let solution = solver.solve().unwrap();

        let json = solution.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strategy"], "grid");
        assert_eq!(value["variants"].as_array().map(Vec::len), Some(TOP_VARIANTS));
        assert_eq!(value["variants"][0]["total_panels"], 42);
        // grid layouts carry no generation history
        assert!(value["variants"][0]["sides"][0].get("history").is_none());
    }

    #[test]
    fn test_single_roof() {
        let mut config = Config::default();
        config.roof_right = None;
        let solution = Solver::new(config).solve().unwrap();
        let best = solution.best().unwrap();
        assert_eq!(best.sides.len(), 1);
        assert!(best.side(Side::Right).is_none());
        assert_eq!(best.side(Side::Left).unwrap().total_panels, 42);
    }

    #[test]
    fn test_border_too_wide_yields_zero() {
        let mut config = Config::default();
        config.border = 2750.0;
        let solution = Solver::new(config).solve().unwrap();
        assert_eq!(solution.total_panels(), 0);
        assert!(
            solution.variants[0]
                .sides
                .iter()
                .all(|s| s.layout.placed_rects.is_empty())
        );
    }

    #[test]
    fn test_genetic_strategy_is_seeded() {
        let mut config = Config::default();
        config.roof_left = RoofPlane::new(1900.0, 4300.0);
        config.roof_right = Some(RoofPlane::new(1900.0, 4300.0));
        config.border = 100.0;
        config.strategy = Strategy::Genetic;
        config.genetic = config.genetic.clone().with_seed(5).with_population_size(12);

        let a = Solver::new(config.clone()).solve().unwrap();
        let b = Solver::new(config.clone()).solve().unwrap();
        assert_eq!(a.strategy, Strategy::Genetic);
        assert_eq!(a.variants.len(), 1);
        assert_eq!(a.orientation, None);
        assert_eq!(a.total_panels(), b.total_panels());
        let rects_a: Vec<Rect> = a.variants[0].sides[0].layout.placed_rects.clone();
        let rects_b: Vec<Rect> = b.variants[0].sides[0].layout.placed_rects.clone();
        assert_eq!(rects_a, rects_b);
        let history = &a.variants[0].sides[0].history;
        assert_eq!(history.len(), config.genetic.generations as usize);
        assert_eq!(history.last().copied(), Some(a.variants[0].sides[0].layout.total_panels));
        assert_variant_valid(&config, &a.variants[0]);
    }

    #[test]
    fn test_genetic_without_slots_fails() {
        let mut config = Config::default();
        config.border = 2750.0;
        config.strategy = Strategy::Genetic;
        config.genetic.seed = Some(1);
        assert!(matches!(
            Solver::new(config).solve(),
            Err(Error::NoSlots { side: Side::Left })
        ));
    }
}

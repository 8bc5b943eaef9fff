//! Slot-based genetic placement.
//!
//! Every legal lattice cell of both orientations becomes a candidate slot.
//! An individual is a permutation of the slot pool; a greedy decoder walks
//! the permutation and accepts each slot that stays inside the border and
//! collides with nothing accepted so far. Fitness is the accepted count.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::{Rect, any_overlap};
use crate::lattice::fill_roof;
use crate::types::{
    Alignment, Border, LayoutResult, Obstacle, Orientation, PanelSpec, RoofPlane, Side,
    inflated_all,
};

/// Candidate panel position. Portrait and landscape slots may cover the same
/// area; the decoder resolves the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slot {
    pub side: Side,
    pub rect: Rect,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_generations")]
    pub generations: u32,
    /// Probability of one swap mutation per child (0.0 - 1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Individuals carried over unchanged each generation.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Seed for reproducible runs; `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_population_size() -> usize {
    30
}

fn default_generations() -> u32 {
    10
}

fn default_mutation_rate() -> f64 {
    0.2
}

fn default_elite_count() -> usize {
    2
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            generations: default_generations(),
            mutation_rate: default_mutation_rate(),
            elite_count: default_elite_count(),
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects parameters the search cannot run with. Builders store values
    /// as given; this is the single check.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(Error::Config(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.generations == 0 {
            return Err(Error::Config("at least one generation is required".to_string()));
        }
        if self.elite_count > self.population_size {
            return Err(Error::Config(format!(
                "elite count {} exceeds population size {}",
                self.elite_count, self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::Config(format!(
                "mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

/// All centred lattice cells of both orientations that clear every inflated
/// obstacle, portrait first.
pub fn generate_slots(
    side: Side,
    roof: &RoofPlane,
    panel: &PanelSpec,
    border: Border,
    obstacles: &[Obstacle],
) -> Result<Vec<Slot>> {
    let zones = inflated_all(obstacles);
    let mut slots = Vec::new();
    for orientation in [Orientation::Portrait, Orientation::Landscape] {
        let grid = fill_roof(roof, border, panel, orientation.into(), Alignment::default());
        slots.extend(
            grid.grid_cells()
                .filter(|cell| !any_overlap(cell, &zones))
                .map(|rect| Slot {
                    side,
                    rect,
                    orientation,
                }),
        );
    }

    if slots.is_empty() {
        return Err(Error::NoSlots { side });
    }
    Ok(slots)
}

/// Greedy decoding of a slot permutation. No backtracking: a rejected slot is
/// skipped for good.
pub fn decode(
    order: &[usize],
    slots: &[Slot],
    roof: &RoofPlane,
    border: Border,
    obstacles: &[Obstacle],
) -> Vec<Rect> {
    Decoder::new(slots, roof, border, obstacles).decode(order)
}

struct Decoder<'a> {
    slots: &'a [Slot],
    bounds: (f64, f64, f64, f64),
    zones: Vec<Rect>,
}

impl<'a> Decoder<'a> {
    fn new(slots: &'a [Slot], roof: &RoofPlane, border: Border, obstacles: &[Obstacle]) -> Self {
        Self {
            slots,
            bounds: (
                border.x,
                border.y,
                roof.length - border.x,
                roof.width - border.y,
            ),
            zones: inflated_all(obstacles),
        }
    }

    fn decode(&self, order: &[usize]) -> Vec<Rect> {
        let (min_x, min_y, max_x, max_y) = self.bounds;
        let mut placed: Vec<Rect> = Vec::new();
        for &idx in order {
            let rect = self.slots[idx].rect;
            if !rect.within(min_x, min_y, max_x, max_y) {
                continue;
            }
            if any_overlap(&rect, &placed) || any_overlap(&rect, &self.zones) {
                continue;
            }
            placed.push(rect);
        }
        placed
    }
}

/// Order crossover (OX): keeps `parent1[a..b]` in place and fills the other
/// positions, starting at `b` and wrapping, in `parent2`'s relative order.
pub fn order_crossover<R: Rng>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent1.len();
    if n < 2 {
        return parent1.to_vec();
    }

    let picks = rand::seq::index::sample(rng, n, 2);
    let (a, b) = {
        let (p, q) = (picks.index(0), picks.index(1));
        (p.min(q), p.max(q))
    };

    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];
    for i in a..b {
        child[i] = parent1[i];
        used[parent1[i]] = true;
    }

    let mut j = b;
    for &gene in parent2 {
        if used[gene] {
            continue;
        }
        if j >= n {
            j = 0;
        }
        child[j] = gene;
        j += 1;
    }
    child
}

/// Swaps two distinct positions with probability `rate`.
pub fn swap_mutate<R: Rng>(genes: &mut [usize], rate: f64, rng: &mut R) {
    if genes.len() < 2 || !rng.gen_bool(rate.clamp(0.0, 1.0)) {
        return;
    }
    let picks = rand::seq::index::sample(rng, genes.len(), 2);
    genes.swap(picks.index(0), picks.index(1));
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneticOutcome {
    pub layout: LayoutResult,
    pub slot_count: usize,
    /// Global best fitness after each generation.
    pub history: Vec<usize>,
}

impl GeneticOutcome {
    pub fn best_fitness(&self) -> usize {
        self.layout.total_panels
    }
}

pub struct GeneticPlacer<'a> {
    side: Side,
    roof: &'a RoofPlane,
    panel: &'a PanelSpec,
    border: Border,
    obstacles: &'a [Obstacle],
    config: &'a GeneticConfig,
}

impl<'a> GeneticPlacer<'a> {
    pub fn new(
        side: Side,
        roof: &'a RoofPlane,
        panel: &'a PanelSpec,
        border: Border,
        obstacles: &'a [Obstacle],
        config: &'a GeneticConfig,
    ) -> Self {
        Self {
            side,
            roof,
            panel,
            border,
            obstacles,
            config,
        }
    }

    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<GeneticOutcome> {
        self.config.validate()?;
        let side = self.side;
        let slots = generate_slots(side, self.roof, self.panel, self.border, self.obstacles)?;
        info!(%side, slots = slots.len(), "available slots");

        let decoder = Decoder::new(&slots, self.roof, self.border, self.obstacles);
        let pop_size = self.config.population_size;
        let generations = self.config.generations;

        let mut population: Vec<Vec<usize>> = (0..pop_size)
            .map(|_| {
                let mut genes: Vec<usize> = (0..slots.len()).collect();
                genes.shuffle(rng);
                genes
            })
            .collect();

        let mut best: Vec<Rect> = Vec::new();
        let mut best_fit: Option<usize> = None;
        let mut history = Vec::with_capacity(generations as usize);

        for generation in 0..generations {
            let mut scored: Vec<(usize, Vec<usize>)> = Vec::with_capacity(pop_size);
            for genes in population {
                let placed = decoder.decode(&genes);
                let fit = placed.len();
                if best_fit.is_none_or(|b| fit > b) {
                    best_fit = Some(fit);
                    best = placed;
                }
                scored.push((fit, genes));
            }

            scored.sort_by(|a, b| b.0.cmp(&a.0));
            let global = best_fit.unwrap_or(0);
            debug!(
                %side,
                generation = generation + 1,
                best = scored[0].0,
                global_best = global,
                "generation done"
            );
            history.push(global);

            let mut next: Vec<Vec<usize>> = scored
                .iter()
                .take(self.config.elite_count)
                .map(|(_, genes)| genes.clone())
                .collect();

            let pool = &scored[..(pop_size / 3).max(3).min(scored.len())];
            while next.len() < pop_size {
                let (_, p1) = &pool[rng.gen_range(0..pool.len())];
                let (_, p2) = &pool[rng.gen_range(0..pool.len())];
                let mut child = order_crossover(p1, p2, rng);
                swap_mutate(&mut child, self.config.mutation_rate, rng);
                next.push(child);
            }
            population = next;
        }

        info!(
            %side,
            panels = best.len(),
            generations,
            "genetic search finished"
        );

        let layout = LayoutResult {
            roof: *self.roof,
            rows: 0,
            cols: 0,
            total_panels: 0,
            coverage_eff: 0.0,
            border_x: self.border.x,
            border_y: self.border.y,
            start_x: self.border.x,
            start_y: self.border.y,
            panel_w: self.panel.width,
            panel_h: self.panel.height,
            gap_x: self.panel.gap_x,
            gap_y: self.panel.gap_y,
            orientation: Orientation::Portrait,
            placed_rects: Vec::new(),
            note: None,
        }
        .with_placed(best)
        .with_note(format!("genetic: {generations} generations"));

        Ok(GeneticOutcome {
            layout,
            slot_count: slots.len(),
            history,
        })
    }
}

use std::path::{Path, PathBuf};

use clap::Parser;
use panel_layout::config::{Config, Strategy};
use panel_layout::export::export_csv;
use panel_layout::solver::{Solution, Solver};
use panel_layout::types::{OrientationMode, Side};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_layout",
    about = "Solar panel layout optimizer for gable roofs"
)]
struct Cli {
    /// JSON configuration file (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Placement strategy: grid or genetic
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<Strategy>,

    /// Panel orientation: auto, portrait, or landscape
    #[arg(long, value_parser = parse_orientation)]
    orientation: Option<OrientationMode>,

    /// Genetic generations
    #[arg(long)]
    generations: Option<u32>,

    /// Genetic population size
    #[arg(long)]
    population: Option<usize>,

    /// Seed for the genetic strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Write panels_left.csv / panels_right.csv for the best variant here
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Print the full solution as JSON
    #[arg(long)]
    json: bool,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    match s {
        "grid" => Ok(Strategy::Grid),
        "genetic" => Ok(Strategy::Genetic),
        _ => Err(format!("invalid strategy '{}', expected: grid or genetic", s)),
    }
}

fn parse_orientation(s: &str) -> Result<OrientationMode, String> {
    s.parse::<OrientationMode>().map_err(|e| e.to_string())
}

fn build_config(cli: &Cli) -> panel_layout::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if let Some(orientation) = cli.orientation {
        config.orientation = orientation;
    }
    if let Some(generations) = cli.generations {
        config.genetic.generations = generations;
    }
    if let Some(population) = cli.population {
        config.genetic.population_size = population;
    }
    if let Some(seed) = cli.seed {
        config.genetic.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

fn write_csvs(dir: &Path, solution: &Solution) -> panel_layout::Result<()> {
    std::fs::create_dir_all(dir)?;
    if let Some(best) = solution.best() {
        for s in &best.sides {
            let name = match s.side {
                Side::Left => "panels_left.csv",
                Side::Right => "panels_right.csv",
            };
            export_csv(dir.join(name), s.side, &s.layout)?;
        }
    }
    Ok(())
}

fn print_report(solution: &Solution) {
    match solution.orientation {
        Some(o) => println!("Strategy: {:?}, orientation {}", solution.strategy, o),
        None => println!("Strategy: {:?}", solution.strategy),
    }
    for v in &solution.variants {
        match v.alignment {
            Some(a) => println!("#{} {} panels ({})", v.rank, v.total_panels, a),
            None => println!("#{} {} panels", v.rank, v.total_panels),
        }
        for s in &v.sides {
            let l = &s.layout;
            let note = l.note.as_deref().map(|n| format!(" [{n}]")).unwrap_or_default();
            println!(
                "  {}: {} panels, {:.1}% coverage, {:.2} m2{}",
                s.side,
                l.total_panels,
                l.coverage_eff * 100.0,
                l.panel_area_m2(),
                note
            );
        }
    }
    println!();
    println!(
        "Summary: {} panel{}, {:.1} kW, cost {:.0}",
        solution.total_panels(),
        if solution.total_panels() == 1 { "" } else { "s" },
        solution.power_kw(),
        solution.cost(),
    );
}

fn run(cli: &Cli) -> panel_layout::Result<()> {
    let config = build_config(cli)?;
    let solution = Solver::new(config).solve()?;

    if cli.json {
        println!("{}", solution.to_json()?);
    } else {
        print_report(&solution);
    }
    if let Some(dir) = &cli.csv_dir {
        write_csvs(dir, &solution)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

//! Headless simulation runner.
//!
//! Runs the simulation core without graphics for CI verification,
//! determinism checks, and benchmarking.
//!
//! # Usage
//!
//! ```bash
//! # Run a scripted skirmish for 1200 ticks
//! cargo run -p bulwark_headless -- run --ticks 1200
//!
//! # Verify determinism across repeated runs
//! cargo run -p bulwark_headless -- verify --runs 5 --ticks 2000
//!
//! # Print the planned system batches
//! cargo run -p bulwark_headless -- plan
//! ```
//!
//! Logs go to stderr; results go to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulwark_core::components::{FactionId, UnitTag};
use bulwark_core::data::StatTable;
use bulwark_core::math::{Fixed, Vec3Fixed};
use bulwark_core::simulation::{Collaborators, SimConfig, Simulation};
use bulwark_core::visibility::FogProvider;

#[derive(Parser)]
#[command(name = "bulwark_headless")]
#[command(about = "Headless simulation runner for CI and benchmarking")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted two-faction skirmish
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "1200")]
        ticks: u64,

        /// Archers per side
        #[arg(long, default_value = "4")]
        per_side: u32,

        /// Starting gap between the battle lines, world units
        #[arg(long, default_value = "14.0")]
        gap: f64,

        /// Unit stat table (JSON); defaults baked in when omitted
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Enable friendly fire
        #[arg(long)]
        friendly_fire: bool,
    },

    /// Verify determinism by repeating the same run
    Verify {
        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "2000")]
        ticks: u64,
    },

    /// Print the planned system batches per stage
    Plan,
}

/// Headless runs have no fog grid; everything is considered seen.
struct OmniscientFog;

impl FogProvider for OmniscientFog {
    fn is_visible(&self, _faction: FactionId, _position: Vec3Fixed) -> bool {
        true
    }

    fn is_revealed(&self, _faction: FactionId, _position: Vec3Fixed) -> bool {
        true
    }
}

fn ground(x: f64, z: f64) -> Vec3Fixed {
    Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::from_num(z))
}

fn load_stats(path: &PathBuf) -> Result<StatTable, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    StatTable::from_json_str(&json).map_err(|e| e.to_string())
}

fn build_skirmish(
    per_side: u32,
    gap: f64,
    stats: Option<StatTable>,
    friendly_fire: bool,
) -> Result<Simulation, String> {
    let mut sim = Simulation::new(SimConfig {
        friendly_fire,
        ..SimConfig::default()
    })
    .map_err(|e| e.to_string())?;
    if let Some(table) = stats {
        sim = sim.with_stats(table);
    }

    for i in 0..per_side {
        let z = f64::from(i) * 2.0;
        sim.spawn_unit("archer", FactionId(1), ground(0.0, z));
        sim.spawn_unit("archer", FactionId(2), ground(gap, z));
    }
    sim.spawn_healer(FactionId(1), ground(-3.0, 0.0));
    sim.spawn_hall(FactionId(1), ground(-12.0, 0.0));
    sim.spawn_hall(FactionId(2), ground(gap + 12.0, 0.0));
    Ok(sim)
}

fn live_units(sim: &Simulation, faction: FactionId) -> usize {
    sim.world()
        .entities_with::<UnitTag>()
        .into_iter()
        .filter(|&e| sim.world().get::<FactionId>(e) == Some(&faction))
        .count()
}

fn run_skirmish(
    ticks: u64,
    per_side: u32,
    gap: f64,
    stats: Option<StatTable>,
    friendly_fire: bool,
) -> Result<(), String> {
    let fog = OmniscientFog;
    let mut sim = build_skirmish(per_side, gap, stats, friendly_fire)?;

    let mut faults = 0usize;
    for _ in 0..ticks {
        let outcome = sim.tick(Collaborators {
            fog: Some(&fog),
            binder: None,
            observer: FactionId(1),
        });
        faults += outcome.report.faults.len();

        let a = live_units(&sim, FactionId(1));
        let b = live_units(&sim, FactionId(2));
        if a == 0 || b == 0 {
            break;
        }
    }

    let census = sim.census();
    println!("ticks:        {}", sim.current_tick());
    println!("sim time:     {:.2}s", sim.time().to_num::<f64>());
    println!("faction 1:    {} units", live_units(&sim, FactionId(1)));
    println!("faction 2:    {} units", live_units(&sim, FactionId(2)));
    println!(
        "census:       {} units, {} buildings, {} halls",
        census.units, census.buildings, census.halls
    );
    println!("state hash:   {:#018x}", sim.state_hash());
    println!("faults:       {faults}");
    Ok(())
}

fn verify(runs: u32, ticks: u64) -> Result<(), String> {
    let fog = OmniscientFog;
    let mut hashes = Vec::new();
    for _ in 0..runs {
        let mut sim = build_skirmish(4, 14.0, None, false)?;
        for _ in 0..ticks {
            sim.tick(Collaborators {
                fog: Some(&fog),
                binder: None,
                observer: FactionId(1),
            });
        }
        hashes.push(sim.state_hash());
    }

    let consistent = hashes.windows(2).all(|w| w[0] == w[1]);
    for (i, h) in hashes.iter().enumerate() {
        println!("run {i}: {h:#018x}");
    }
    if consistent {
        println!("deterministic across {runs} runs of {ticks} ticks");
        Ok(())
    } else {
        Err(format!("runs diverged: {hashes:?}"))
    }
}

fn print_plan() -> Result<(), String> {
    let sim = Simulation::new(SimConfig::default()).map_err(|e| e.to_string())?;
    for (stage, batches) in sim.plan() {
        println!("{stage:?}:");
        for (i, batch) in batches.iter().enumerate() {
            println!("  batch {i}: {}", batch.join(", "));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    let result = match cli.command {
        Commands::Run {
            ticks,
            per_side,
            gap,
            stats,
            friendly_fire,
        } => {
            let table = match stats.as_ref().map(load_stats) {
                Some(Ok(t)) => Some(t),
                Some(Err(e)) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
                None => None,
            };
            run_skirmish(ticks, per_side, gap, table, friendly_fire)
        }
        Commands::Verify { runs, ticks } => verify(runs, ticks),
        Commands::Plan => print_plan(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

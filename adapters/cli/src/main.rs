#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that simulates and inspects Torus Tactics matches.

mod simulation;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use torus_core::{ChangeKind, Team};
use torus_system_turn::GameConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "torus")]
#[command(about = "Simulate and inspect Torus Tactics matches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a match between two synchronized clients driven by random agents.
    Simulate(SimulateArgs),
    /// Prints a summary of a persisted snapshot.
    Inspect {
        /// Snapshot file to decode.
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// TOML file with board dimensions, roster size and seed.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of turns to play.
    #[arg(long, default_value_t = 200)]
    turns: u32,

    /// Writes the last committed snapshot to this file.
    #[arg(long)]
    export: Option<PathBuf>,
}

/// Entry point for the Torus command-line interface.
fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        CliCommand::Simulate(args) => simulate(&args),
        CliCommand::Inspect { file } => inspect(&file),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(args: &SimulateArgs) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate().context("invalid game configuration")?;
    Ok(config)
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let config = load_config(args)?;
    let report = simulation::run(config, args.turns)?;

    match report.winner {
        Some(winner) => println!("{winner} won after {} turns", report.turns),
        None => println!("no winner after {} turns", report.turns),
    }
    for team in Team::ALL {
        println!("{team}: score {}", report.scores[team.index()]);
    }

    if let Some(path) = &args.export {
        let payload = report
            .last_payload
            .context("no turn was committed, nothing to export")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = torus_persistence::decode_or_default(&bytes);
    if snapshot.is_fresh() {
        println!("{} holds no match", path.display());
        return Ok(());
    }

    println!("turn {}", snapshot.turn);
    println!("next team: {}", snapshot.current_team);
    if let Some(winner) = snapshot.winner {
        println!("winner: {winner}");
    }
    let board = &snapshot.post_turn;
    println!("board: {}x{}", board.columns, board.rows);
    for team in Team::ALL {
        let player = match team {
            Team::One => snapshot.player_one.as_deref(),
            Team::Two => snapshot.player_two.as_deref(),
        };
        println!(
            "{team} ({}): {} pieces, score {}",
            player.unwrap_or("unknown"),
            board.team(team).pieces.len(),
            snapshot.score(team)
        );
    }

    let mut tally = [0_usize; 4];
    for change in &snapshot.changes {
        let slot = match change.kind() {
            ChangeKind::Move { .. } => 0,
            ChangeKind::Power { .. } => 1,
            ChangeKind::PlaceOrbs { .. } => 2,
            ChangeKind::GrantPower { .. } => 3,
        };
        tally[slot] += 1;
    }
    println!(
        "changes: {} moves, {} powers, {} orb spawns, {} grants",
        tally[0], tally[1], tally[2], tally[3]
    );
    Ok(())
}

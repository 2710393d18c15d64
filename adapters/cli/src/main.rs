#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Voxel Rover simulation from a script.
//!
//! Instructions are read one per line from a file or standard input. Every
//! status report is printed to standard output as a single JSON line.

mod script;
mod settings;

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voxel_rover_core::{Command, Event};
use voxel_rover_system_autonomy::{Autonomy, Config as AutonomyConfig};
use voxel_rover_terrain::generate;
use voxel_rover_world::{self as world, query, World};

use crate::{
    script::{parse_line, Instruction},
    settings::{Overrides, Settings},
};

/// Drives a rover across generated voxel terrain.
#[derive(Debug, Parser)]
#[command(name = "voxel-rover", version, about)]
struct Args {
    /// TOML file with `[simulation]` and `[terrain]` tables.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Script to execute instead of standard input.
    #[arg(short, long)]
    script: Option<PathBuf>,
    /// Seed shared by terrain generation and the simulation.
    #[arg(long)]
    seed: Option<u64>,
    /// Terrain extent along the east axis.
    #[arg(long)]
    width: Option<u32>,
    /// Terrain extent along the vertical axis.
    #[arg(long)]
    height: Option<u32>,
    /// Terrain extent along the north axis.
    #[arg(long)]
    depth: Option<u32>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }
}

/// World plus the systems reacting to its events.
struct Session {
    world: World,
    autonomy: Autonomy,
}

impl Session {
    fn new(settings: &Settings) -> Result<Self> {
        let terrain = generate(&settings.terrain).context("failed to generate terrain")?;
        let world = World::new(terrain, settings.simulation.clone())
            .context("failed to create the world")?;
        let autonomy = Autonomy::new(AutonomyConfig::new(settings.simulation.seed));
        Ok(Self { world, autonomy })
    }

    fn execute(&mut self, instruction: Instruction, out: &mut impl Write) -> Result<()> {
        match instruction {
            Instruction::Send(command) => self.dispatch(command, out).map(|_| ()),
            Instruction::Wait(units) => {
                let dt = query::config(&self.world).units(units);
                self.advance(dt, out)
            }
        }
    }

    /// Keeps ticking until `dt` has elapsed; the world halts at every autonomy
    /// tick so the rover's answer lands at that instant.
    fn advance(&mut self, dt: Duration, out: &mut impl Write) -> Result<()> {
        let mut remaining = dt;
        while !remaining.is_zero() {
            let advanced = self.dispatch(Command::Tick { dt: remaining }, out)?;
            if advanced.is_zero() {
                break;
            }
            remaining = remaining.saturating_sub(advanced);
        }
        Ok(())
    }

    /// Applies `command` and the autonomy commands it triggers, returning the
    /// simulated time that passed.
    fn dispatch(&mut self, command: Command, out: &mut impl Write) -> Result<Duration> {
        let mut advanced = Duration::ZERO;
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        while !events.is_empty() {
            for event in &events {
                if let Event::TimeAdvanced { dt } = event {
                    advanced += *dt;
                }
                report(event, out)?;
            }

            let unit = query::unit(&self.world);
            let surface = query::current_surface(&self.world);
            let nearby = query::nearby_features(&self.world);
            let mut commands = Vec::new();
            self.autonomy
                .handle(&events, &unit, surface, &nearby, &mut commands);

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
        Ok(advanced)
    }
}

fn report(event: &Event, out: &mut impl Write) -> Result<()> {
    match event {
        Event::StatusReported { status } => {
            serde_json::to_writer(&mut *out, status).context("failed to encode status")?;
            writeln!(out).context("failed to write status")?;
        }
        Event::MoveRejected {
            direction,
            delta,
            reason,
        } => tracing::info!(?direction, delta, ?reason, "move rejected"),
        Event::HealthChanged {
            delta,
            health,
            cause,
        } => tracing::debug!(delta, health, ?cause, "health changed"),
        Event::UnitMoved { from, to } => tracing::debug!(%from, %to, "rover moved"),
        Event::TimeAdvanced { .. } | Event::AutonomyTick => {}
        other => tracing::info!(event = ?other, "world event"),
    }
    Ok(())
}

fn run_script(session: &mut Session, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let instruction =
            parse_line(&line).with_context(|| format!("script line {}", index + 1))?;
        if let Some(instruction) = instruction {
            session.execute(instruction, out)?;
        }
    }
    out.flush().context("failed to flush output")
}

/// Entry point for the Voxel Rover command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?.with_overrides(args.overrides());
    let mut session = Session::new(&settings)?;
    tracing::info!("{}", query::welcome_banner(&session.world));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run_script(&mut session, BufReader::new(file), &mut out)
        }
        None => run_script(&mut session, io::stdin().lock(), &mut out),
    }
}

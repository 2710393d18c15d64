#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Voxel Rover simulation.
//!
//! The world owns the rover, the terrain it explores and a virtual-time
//! scheduler. [`apply`] is the only entry point that mutates state; the
//! [`query`] module exposes read-only views for adapters and systems.

mod config;
mod hazards;
mod movement;
mod placement;
mod scheduler;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use voxel_rover_core::{
    Command, Coordinate, Direction, Event, HealthCause, Mode, TerrainKind, TerrainVolume,
    UnitStatus, WELCOME_BANNER,
};

use crate::scheduler::{Job, Purpose, Scheduler};

pub use config::{Config, ConfigError, MAX_TEMPERATURE_JITTER};

/// Errors raised while constructing a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The terrain offers no column the rover can rest on.
    #[error("terrain offers no spawn coordinate")]
    NoSpawnPoint,
    /// The simulation parameters are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Unit {
    position: Coordinate,
    direction: Direction,
    mode: Mode,
    health: i64,
    fault_active: bool,
}

impl Unit {
    fn spawned_at(position: Coordinate, max_health: i64) -> Self {
        Self {
            position,
            direction: Direction::North,
            mode: Mode::Manual,
            health: max_health,
            fault_active: false,
        }
    }
}

/// Represents the authoritative Voxel Rover world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    terrain: Box<dyn TerrainVolume>,
    config: Config,
    unit: Unit,
    scheduler: Scheduler,
    healing_ticks_left: u32,
    sensor_rng: ChaCha8Rng,
}

impl World {
    /// Creates a world with the rover placed at the terrain's spawn coordinate.
    pub fn new<T>(terrain: T, config: Config) -> Result<Self, WorldError>
    where
        T: TerrainVolume + 'static,
    {
        config.validate()?;
        let spawn = terrain
            .find_spawn_coordinate()
            .ok_or(WorldError::NoSpawnPoint)?;
        tracing::info!(%spawn, "rover spawned");

        Ok(Self {
            banner: WELCOME_BANNER,
            unit: Unit::spawned_at(spawn, config.max_health),
            sensor_rng: ChaCha8Rng::seed_from_u64(config.seed),
            terrain: Box::new(terrain),
            scheduler: Scheduler::new(),
            healing_ticks_left: 0,
            config,
        })
    }

    fn sample(&self, coordinate: Coordinate) -> Option<TerrainKind> {
        self.terrain.sample(coordinate)
    }

    /// Runs due tasks for at most `dt`, halting right after an autonomy tick so
    /// the commands answering it execute at the tick instant.
    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let now = self.scheduler.now();
        let requested = now.saturating_add(dt);
        let until = match self.scheduler.next_due(Purpose::Autonomy) {
            Some(due) if due <= requested => due,
            _ => requested,
        };
        out_events.push(Event::TimeAdvanced {
            dt: until.saturating_sub(now),
        });

        while let Some(job) = self.scheduler.pop_due(until) {
            match job {
                Job::AutonomyTick => {
                    out_events.push(Event::AutonomyTick);
                    break;
                }
                Job::FaultDrain => self.drain_fault(out_events),
                Job::HealStep => self.heal_step(out_events),
                Job::CommitMove { destination } => self.commit_move(destination, out_events),
            }
        }
        self.scheduler.settle(until);
    }

    fn adjust_health(&mut self, delta: i64, cause: HealthCause, out_events: &mut Vec<Event>) {
        if delta == 0 {
            return;
        }
        self.unit.health = self.unit.health.saturating_add(delta);
        out_events.push(Event::HealthChanged {
            delta,
            health: self.unit.health,
            cause,
        });
    }

    fn face(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.unit.direction == direction {
            return;
        }
        self.unit.direction = direction;
        out_events.push(Event::DirectionChanged { direction });
    }

    fn set_mode(&mut self, mode: Mode, out_events: &mut Vec<Event>) {
        if self.unit.mode == mode {
            return;
        }
        self.unit.mode = mode;
        match mode {
            Mode::Automatic => self
                .scheduler
                .schedule_every(Job::AutonomyTick, self.config.autonomy_period()),
            Mode::Manual => {
                let _ = self.scheduler.cancel(Purpose::Autonomy);
            }
        }
        tracing::info!(?mode, "operating mode changed");
        out_events.push(Event::ModeChanged { mode });
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        let position = match self.terrain.find_spawn_coordinate() {
            Some(spawn) => spawn,
            None => {
                tracing::warn!("terrain lost its spawn coordinate; respawning in place");
                self.unit.position
            }
        };

        let _ = self.scheduler.cancel(Purpose::Autonomy);
        let _ = self.scheduler.cancel(Purpose::FaultDrain);
        let _ = self.scheduler.cancel(Purpose::Healing);
        self.healing_ticks_left = 0;
        self.unit = Unit::spawned_at(position, self.config.max_health);

        tracing::info!(%position, "rover restarted");
        out_events.push(Event::UnitRespawned { position });
    }

    fn report_status(&mut self, out_events: &mut Vec<Event>) {
        self.apply_passive_drain(out_events);

        let jitter = self.config.temperature_jitter;
        let noise = if jitter > 0.0 {
            self.sensor_rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        let timestamp = u64::try_from(self.scheduler.now().as_millis()).unwrap_or(u64::MAX);

        let status = UnitStatus {
            position: self.unit.position,
            mode: self.unit.mode,
            direction: self.unit.direction,
            health: self.unit.health,
            fault_active: self.unit.fault_active,
            temperature: query::base_temperature(self) + noise,
            surface: query::current_surface(self),
            nearby: query::nearby_features(self),
            timestamp,
        };
        out_events.push(Event::StatusReported { status });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance(dt, out_events),
        Command::Drive { maneuver } => world.drive(maneuver, out_events),
        Command::Face { direction } => world.face(direction, out_events),
        Command::ToggleMode => {
            let mode = world.unit.mode.toggled();
            world.set_mode(mode, out_events);
        }
        Command::SetMode { mode } => world.set_mode(mode, out_events),
        Command::Heal => world.start_healing(out_events),
        Command::TriggerFault => world.raise_fault(out_events),
        Command::ClearFault => world.clear_fault(out_events),
        Command::Restart => world.restart(out_events),
        Command::RequestStatus => world.report_status(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Config, Purpose, World};
    use voxel_rover_core::{
        Bounds, Coordinate, NearbyFeature, TerrainKind, TerrainVolume, UnitSnapshot,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Simulation parameters the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &Config {
        &world.config
    }

    /// Provides read-only access to the terrain.
    #[must_use]
    pub fn terrain(world: &World) -> &dyn TerrainVolume {
        world.terrain.as_ref()
    }

    /// Extent of the terrain.
    #[must_use]
    pub fn bounds(world: &World) -> Bounds {
        world.terrain.bounds()
    }

    /// Captures the rover's current state.
    #[must_use]
    pub fn unit(world: &World) -> UnitSnapshot {
        UnitSnapshot {
            position: world.unit.position,
            direction: world.unit.direction,
            mode: world.unit.mode,
            health: world.unit.health,
            fault_active: world.unit.fault_active,
        }
    }

    /// Terrain directly underneath the rover, if any.
    #[must_use]
    pub fn current_surface(world: &World) -> Option<TerrainKind> {
        world
            .unit
            .position
            .below()
            .and_then(|below| world.terrain.sample(below))
    }

    /// Temperature reading before sensor noise, driven by the rover's own cell.
    #[must_use]
    pub fn base_temperature(world: &World) -> f32 {
        world
            .terrain
            .sample(world.unit.position)
            .unwrap_or(TerrainKind::Air)
            .base_temperature()
    }

    /// Non-air voxels within the configured scan radius of the rover.
    #[must_use]
    pub fn nearby_features(world: &World) -> Vec<NearbyFeature> {
        features_within(world, world.unit.position, world.config.scan_radius)
    }

    /// Non-air voxels inside the cube of `radius` around `center`, clipped to
    /// the terrain and ordered by `x`, then `y`, then `z`.
    #[must_use]
    pub fn features_within(world: &World, center: Coordinate, radius: u32) -> Vec<NearbyFeature> {
        let bounds = world.terrain.bounds();
        let span = |value: u32, limit: u32| {
            let low = value.saturating_sub(radius);
            let high = value.saturating_add(radius).min(limit.saturating_sub(1));
            low..=high
        };

        let mut features = Vec::new();
        for x in span(center.x(), bounds.width()) {
            for y in span(center.y(), bounds.height()) {
                for z in span(center.z(), bounds.depth()) {
                    let coordinate = Coordinate::new(x, y, z);
                    match world.terrain.sample(coordinate) {
                        Some(terrain) if !terrain.is_air() => {
                            features.push(NearbyFeature {
                                coordinate,
                                terrain,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        features
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.scheduler.now()
    }

    /// Reports whether the autonomy process is running.
    #[must_use]
    pub fn autonomy_active(world: &World) -> bool {
        world.scheduler.is_active(Purpose::Autonomy)
    }

    /// Reports whether a repair cycle is running.
    #[must_use]
    pub fn healing_active(world: &World) -> bool {
        world.scheduler.is_active(Purpose::Healing)
    }

    /// Number of accepted moves still waiting to commit.
    #[must_use]
    pub fn pending_moves(world: &World) -> usize {
        world.scheduler.count(Purpose::PendingMove)
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous exploration system that steers the rover in automatic mode.
//!
//! The world announces every autonomy tick; this system answers each one with
//! at most one face command and one drive command.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxel_rover_core::{
    Command, Coordinate, Direction, Event, Maneuver, Mode, NearbyFeature, TerrainKind,
    UnitSnapshot,
};

/// Configuration parameters required to construct the autonomy system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided target-selection seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that decides how the rover explores while in automatic mode.
#[derive(Debug)]
pub struct Autonomy {
    rng: ChaCha8Rng,
}

impl Autonomy {
    /// Creates a new autonomy system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and immutable views to emit exploration commands.
    ///
    /// Every autonomy tick in `events` is answered from the same views. The
    /// world halts each `Tick` right after an autonomy tick, so a driver that
    /// feeds back the events of one `Tick` at a time sees at most one.
    pub fn handle(
        &mut self,
        events: &[Event],
        unit: &UnitSnapshot,
        surface: Option<TerrainKind>,
        nearby: &[NearbyFeature],
        out: &mut Vec<Command>,
    ) {
        if unit.mode != Mode::Automatic {
            return;
        }

        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::AutonomyTick))
            .count();
        for _ in 0..ticks {
            self.decide(unit, surface, nearby, out);
        }
    }

    fn decide(
        &mut self,
        unit: &UnitSnapshot,
        surface: Option<TerrainKind>,
        nearby: &[NearbyFeature],
        out: &mut Vec<Command>,
    ) {
        match surface {
            Some(TerrainKind::Water) => {
                out.push(Command::Drive {
                    maneuver: Maneuver::Forward,
                });
                return;
            }
            Some(TerrainKind::AcidicSurface) => {
                out.push(Command::Drive {
                    maneuver: Maneuver::Backward,
                });
                return;
            }
            _ => {}
        }

        if nearby.is_empty() {
            return;
        }

        let target = nearby[self.rng.gen_range(0..nearby.len())];
        let direction = heading_towards(unit.position, target.coordinate).unwrap_or(unit.direction);
        tracing::trace!(target = %target.coordinate, ?direction, "autonomy target chosen");

        if direction != unit.direction {
            out.push(Command::Face { direction });
        }
        out.push(Command::Drive {
            maneuver: Maneuver::Forward,
        });
    }
}

/// Cardinal direction leading from `from` towards `to`, resolving the
/// east-west axis before the north-south axis.
///
/// Returns `None` when both share a column.
#[must_use]
pub fn heading_towards(from: Coordinate, to: Coordinate) -> Option<Direction> {
    if to.x() > from.x() {
        Some(Direction::East)
    } else if to.x() < from.x() {
        Some(Direction::West)
    } else if to.z() > from.z() {
        Some(Direction::North)
    } else if to.z() < from.z() {
        Some(Direction::South)
    } else {
        None
    }
}

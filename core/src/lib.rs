#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Voxel Rover simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! The terrain the rover explores is reached through the [`TerrainVolume`]
//! trait so the world never depends on how the voxels were produced.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the rover boots.
pub const WELCOME_BANNER: &str = "Voxel rover online.";

/// Upper bound of the rover's health pool.
pub const MAX_HEALTH: i64 = 10_000;

/// Operating mode that decides who drives the rover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Movement only happens in response to external commands.
    #[default]
    Manual,
    /// The autonomy loop issues movement commands on its own period.
    Automatic,
}

impl Mode {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Manual => Self::Automatic,
            Self::Automatic => Self::Manual,
        }
    }
}

/// Cardinal facing of the rover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Facing toward increasing `z`.
    #[default]
    North,
    /// Facing toward increasing `x`.
    East,
    /// Facing toward decreasing `z`.
    South,
    /// Facing toward decreasing `x`.
    West,
}

impl Direction {
    /// Direction reached by a quarter turn to the left.
    #[must_use]
    pub const fn rotated_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Direction reached by a quarter turn to the right.
    #[must_use]
    pub const fn rotated_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Unit displacement along the `x` and `z` axes for a forward step.
    #[must_use]
    pub const fn horizontal_offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

/// Driving manoeuvres accepted from adapters and the autonomy system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Maneuver {
    /// One step along the current facing.
    Forward,
    /// One step against the current facing.
    Backward,
    /// One step against the facing, then a quarter turn left.
    StrafeLeft,
    /// One step along the facing, then a quarter turn right.
    StrafeRight,
    /// Quarter turn left in place.
    TurnLeft,
    /// Quarter turn right in place.
    TurnRight,
}

/// Location of a single voxel.
///
/// `x` grows eastward, `y` is altitude and `z` grows northward.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    x: u32,
    y: u32,
    z: u32,
}

impl Coordinate {
    /// Creates a new voxel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Position along the east axis.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Altitude.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Position along the north axis.
    #[must_use]
    pub const fn z(&self) -> u32 {
        self.z
    }

    /// Returns the same column at a different altitude.
    #[must_use]
    pub const fn with_altitude(self, y: u32) -> Self {
        Self { y, ..self }
    }

    /// Cell directly underneath, if the coordinate is above the floor.
    #[must_use]
    pub fn below(self) -> Option<Self> {
        self.y.checked_sub(1).map(|y| self.with_altitude(y))
    }

    /// Cell directly above.
    #[must_use]
    pub fn above(self) -> Option<Self> {
        self.y.checked_add(1).map(|y| self.with_altitude(y))
    }

    /// Displaces the coordinate horizontally by `delta` steps along `direction`.
    ///
    /// Returns `None` when the displacement would leave the non-negative
    /// quadrant. Upper bounds are the caller's responsibility.
    #[must_use]
    pub fn stepped(self, direction: Direction, delta: i64) -> Option<Self> {
        let (dx, dz) = direction.horizontal_offset();
        let x = i64::from(self.x).checked_add(dx.checked_mul(delta)?)?;
        let z = i64::from(self.z).checked_add(dz.checked_mul(delta)?)?;
        Some(Self {
            x: u32::try_from(x).ok()?,
            y: self.y,
            z: u32::try_from(z).ok()?,
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Exclusive extent of a terrain volume along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    width: u32,
    height: u32,
    depth: u32,
}

impl Bounds {
    /// Creates bounds spanning `width` cells east, `height` up and `depth` north.
    #[must_use]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of cells along the east axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cells along the vertical axis.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells along the north axis.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Total number of voxels enclosed by the bounds.
    #[must_use]
    pub fn volume(&self) -> usize {
        let cells = u64::from(self.width) * u64::from(self.height) * u64::from(self.depth);
        usize::try_from(cells).unwrap_or(usize::MAX)
    }

    /// Reports whether the column `(x, z)` lies inside the bounds.
    #[must_use]
    pub const fn contains_column(&self, x: u32, z: u32) -> bool {
        x < self.width && z < self.depth
    }

    /// Reports whether the coordinate lies inside the bounds.
    #[must_use]
    pub const fn contains(&self, coordinate: Coordinate) -> bool {
        self.contains_column(coordinate.x, coordinate.z) && coordinate.y < self.height
    }
}

/// Categorical label attached to every voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerrainKind {
    /// Empty space the rover can occupy and fall through.
    Air,
    /// Loose ground.
    Soil,
    /// Liquid the rover floats on; slows it down and corrodes it slowly.
    Water,
    /// Corrosive crust; slows the rover and corrodes it quickly.
    AcidicSurface,
    /// Soft ground that slows the rover.
    Sand,
    /// Generic solid rock.
    Stone,
}

impl TerrainKind {
    /// Every terrain kind in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Air,
        Self::Soil,
        Self::Water,
        Self::AcidicSurface,
        Self::Sand,
        Self::Stone,
    ];

    /// Reports whether the voxel is empty space.
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// Ambient temperature reading in degrees Celsius before jitter.
    #[must_use]
    pub const fn base_temperature(self) -> f32 {
        match self {
            Self::Air => 20.0,
            Self::Soil => 15.0,
            Self::Water => 10.0,
            Self::AcidicSurface => 100.0,
            Self::Sand | Self::Stone => 20.0,
        }
    }

    /// Stable kebab-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Soil => "soil",
            Self::Water => "water",
            Self::AcidicSurface => "acidic-surface",
            Self::Sand => "sand",
            Self::Stone => "stone",
        }
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a string does not name a terrain kind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown terrain label '{0}'")]
pub struct UnknownTerrainLabel(pub String);

impl FromStr for TerrainKind {
    type Err = UnknownTerrainLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownTerrainLabel(trimmed.to_owned()))
    }
}

/// Read-only voxel lookup the world navigates.
///
/// Implementations must be deterministic and free of side effects: the same
/// coordinate always yields the same label.
pub trait TerrainVolume: fmt::Debug {
    /// Terrain at the coordinate, or `None` outside the volume.
    fn sample(&self, coordinate: Coordinate) -> Option<TerrainKind>;

    /// Extent of the volume.
    fn bounds(&self) -> Bounds;

    /// Coordinate where a freshly started rover should be placed.
    fn find_spawn_coordinate(&self) -> Option<Coordinate>;
}

/// Non-air voxel discovered by a proximity scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NearbyFeature {
    /// Location of the voxel.
    pub coordinate: Coordinate,
    /// Terrain found at the location.
    pub terrain: TerrainKind,
}

/// Reasons the world refused to relocate the rover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The destination column lies outside the terrain.
    OutOfBounds,
    /// Both the destination cell and the cell above it are solid.
    Blocked,
    /// The destination column has no ground to rest on.
    NoFloor,
}

/// Origin of a change to the rover's health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthCause {
    /// Landing after a drop of more than the safe fall height.
    Fall,
    /// Standing on a corrosive surface while reporting status.
    Hazard(TerrainKind),
    /// Periodic drain while a critical fault is active.
    Fault,
    /// Periodic repair.
    Healing,
}

/// Immutable representation of the rover used by systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Cell currently occupied by the rover.
    pub position: Coordinate,
    /// Current facing.
    pub direction: Direction,
    /// Current operating mode.
    pub mode: Mode,
    /// Remaining health, possibly negative.
    pub health: i64,
    /// Whether a critical fault is draining health.
    pub fault_active: bool,
}

/// Full status report delivered to adapters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Cell currently occupied by the rover.
    pub position: Coordinate,
    /// Current operating mode.
    pub mode: Mode,
    /// Current facing.
    pub direction: Direction,
    /// Remaining health, possibly negative.
    pub health: i64,
    /// Whether a critical fault is draining health.
    pub fault_active: bool,
    /// Ambient temperature reading in degrees Celsius.
    pub temperature: f32,
    /// Terrain the rover is standing on, if any.
    pub surface: Option<TerrainKind>,
    /// Non-air voxels within the scan radius.
    pub nearby: Vec<NearbyFeature>,
    /// Simulated milliseconds elapsed since the world was created.
    pub timestamp: u64,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by up to the provided delta time.
    ///
    /// The world halts right after an autonomy tick so systems can answer it
    /// at that instant; [`Event::TimeAdvanced`] reports the span actually
    /// covered and drivers resubmit the remainder.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a driving manoeuvre.
    Drive {
        /// Manoeuvre to perform.
        maneuver: Maneuver,
    },
    /// Turns the rover to face the provided direction without moving.
    Face {
        /// Facing to adopt.
        direction: Direction,
    },
    /// Switches between manual and automatic mode.
    ToggleMode,
    /// Requests that the rover operate in the provided mode.
    SetMode {
        /// Mode the rover should activate.
        mode: Mode,
    },
    /// Starts a repair cycle.
    Heal,
    /// Raises a critical fault that drains health until cleared.
    TriggerFault,
    /// Clears an active critical fault.
    ClearFault,
    /// Respawns the rover with default state.
    Restart,
    /// Requests a full status report.
    RequestStatus,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time covered, at most the requested span.
        dt: Duration,
    },
    /// Signals that the autonomy period elapsed while in automatic mode.
    AutonomyTick,
    /// Confirms that a move was accepted and will commit after a delay.
    MoveScheduled {
        /// Cell the rover occupied when the move was issued.
        from: Coordinate,
        /// Cell the rover will occupy once the move commits.
        to: Coordinate,
        /// Latency imposed by the surface the move started from.
        delay: Duration,
    },
    /// Confirms that the rover's position changed.
    UnitMoved {
        /// Cell the rover occupied before the commit.
        from: Coordinate,
        /// Cell the rover occupies after the commit.
        to: Coordinate,
    },
    /// Reports that a move request was refused.
    MoveRejected {
        /// Facing used to compute the candidate cell.
        direction: Direction,
        /// Signed step count along the facing.
        delta: i64,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// Announces a new facing.
    DirectionChanged {
        /// Facing after the change.
        direction: Direction,
    },
    /// Announces that the rover entered a new operating mode.
    ModeChanged {
        /// Mode that became active after processing commands.
        mode: Mode,
    },
    /// Reports an adjustment to the rover's health.
    HealthChanged {
        /// Signed amount applied.
        delta: i64,
        /// Health after the adjustment.
        health: i64,
        /// Origin of the adjustment.
        cause: HealthCause,
    },
    /// Confirms that a repair cycle began.
    HealingStarted,
    /// Confirms that a repair cycle ended.
    HealingFinished,
    /// Confirms that a critical fault became active.
    FaultRaised,
    /// Confirms that the critical fault was cleared.
    FaultCleared,
    /// Confirms that the rover was placed at a spawn coordinate.
    UnitRespawned {
        /// Cell the rover occupies after respawning.
        position: Coordinate,
    },
    /// Delivers the status report requested by [`Command::RequestStatus`].
    StatusReported {
        /// Snapshot captured after passive hazards were applied.
        status: UnitStatus,
    },
}

//! Tuning knobs of the simulation.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use voxel_rover_core::{TerrainKind, MAX_HEALTH};

/// Widest accepted temperature jitter in degrees Celsius.
pub const MAX_TEMPERATURE_JITTER: f32 = 1_000.0;

/// Reasons a [`Config`] cannot drive a simulation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A duration expressed in time units resolves to zero.
    #[error("{field} must span at least one millisecond")]
    ZeroDuration {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The maximum health is not positive.
    #[error("max_health must be positive, got {0}")]
    NonPositiveHealth(i64),
    /// The temperature jitter is negative, not finite or too wide to sample.
    #[error("temperature_jitter must lie within 0..={MAX_TEMPERATURE_JITTER}, got {0}")]
    InvalidJitter(f32),
}

/// Simulation parameters.
///
/// Every delay and period is expressed in time units; one unit lasts
/// `time_unit_ms` milliseconds of simulated time.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Length of one time unit in milliseconds.
    pub time_unit_ms: u64,
    /// Time units between two autonomy ticks.
    pub autonomy_period_units: u32,
    /// Chebyshev radius of proximity scans.
    pub scan_radius: u32,
    /// Largest drop that causes no damage.
    pub safe_fall_height: u32,
    /// Damage per level dropped once the safe height is exceeded.
    pub fall_damage_per_level: i64,
    /// Commit delay for moves that start on sand.
    pub sand_delay_units: u32,
    /// Commit delay for moves that start on an acidic surface.
    pub acid_delay_units: u32,
    /// Commit delay for moves that start on water.
    pub water_delay_units: u32,
    /// Health lost per status report while standing on an acidic surface.
    pub acid_drain: i64,
    /// Health lost per status report while standing on water.
    pub water_drain: i64,
    /// Time units between two fault drains.
    pub fault_period_units: u32,
    /// Health lost per fault drain.
    pub fault_drain: i64,
    /// Time units between two healing steps.
    pub healing_period_units: u32,
    /// Health restored per healing step.
    pub healing_amount: i64,
    /// Healing steps granted by one repair cycle.
    pub healing_max_ticks: u32,
    /// Health restored on respawn and ceiling for healing.
    pub max_health: i64,
    /// Half-width of the uniform temperature jitter in degrees Celsius.
    pub temperature_jitter: f32,
    /// Seed of the sensor noise stream.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_unit_ms: 1_000,
            autonomy_period_units: 1,
            scan_radius: 5,
            safe_fall_height: 3,
            fall_damage_per_level: 100,
            sand_delay_units: 5,
            acid_delay_units: 5,
            water_delay_units: 10,
            acid_drain: 10,
            water_drain: 1,
            fault_period_units: 1,
            fault_drain: 100,
            healing_period_units: 1,
            healing_amount: 10,
            healing_max_ticks: 100,
            max_health: MAX_HEALTH,
            temperature_jitter: 2.5,
            seed: 0x0c0f_fee0_7e57_ab1e,
        }
    }
}

impl Config {
    /// Checks that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, units) in [
            ("autonomy_period_units", self.autonomy_period_units),
            ("fault_period_units", self.fault_period_units),
            ("healing_period_units", self.healing_period_units),
        ] {
            if self.units(units).is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if self.max_health <= 0 {
            return Err(ConfigError::NonPositiveHealth(self.max_health));
        }
        if !(0.0..=MAX_TEMPERATURE_JITTER).contains(&self.temperature_jitter) {
            return Err(ConfigError::InvalidJitter(self.temperature_jitter));
        }
        Ok(())
    }

    /// Converts a count of time units into simulated time.
    #[must_use]
    pub fn units(&self, units: u32) -> Duration {
        Duration::from_millis(self.time_unit_ms.saturating_mul(u64::from(units)))
    }

    /// Interval between autonomy ticks.
    #[must_use]
    pub fn autonomy_period(&self) -> Duration {
        self.units(self.autonomy_period_units)
    }

    /// Interval between fault drains.
    #[must_use]
    pub fn fault_period(&self) -> Duration {
        self.units(self.fault_period_units)
    }

    /// Interval between healing steps.
    #[must_use]
    pub fn healing_period(&self) -> Duration {
        self.units(self.healing_period_units)
    }

    /// Latency imposed on a move that starts from `surface`.
    #[must_use]
    pub fn move_delay(&self, surface: Option<TerrainKind>) -> Duration {
        match surface {
            Some(TerrainKind::Sand) => self.units(self.sand_delay_units),
            Some(TerrainKind::AcidicSurface) => self.units(self.acid_delay_units),
            Some(TerrainKind::Water) => self.units(self.water_delay_units),
            _ => Duration::ZERO,
        }
    }

    /// Health lost on a status report while standing on `surface`.
    #[must_use]
    pub fn hazard_drain(&self, surface: Option<TerrainKind>) -> i64 {
        match surface {
            Some(TerrainKind::AcidicSurface) => self.acid_drain,
            Some(TerrainKind::Water) => self.water_drain,
            _ => 0,
        }
    }
}

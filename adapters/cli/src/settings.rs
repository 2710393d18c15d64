//! Run settings assembled from an optional TOML file and command-line flags.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use voxel_rover_terrain::GeneratorConfig;
use voxel_rover_world::Config;

/// Everything needed to generate terrain and run the simulation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Simulation tuning, read from the `[simulation]` table.
    pub(crate) simulation: Config,
    /// Terrain generation parameters, read from the `[terrain]` table.
    pub(crate) terrain: GeneratorConfig,
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) depth: Option<u32>,
}

impl Settings {
    /// Loads settings from `path`, or defaults when no path was given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies command-line overrides; a seed drives both terrain and simulation.
    #[must_use]
    pub(crate) fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(seed) = overrides.seed {
            self.terrain.seed = seed;
            self.simulation.seed = seed;
        }
        if let Some(width) = overrides.width {
            self.terrain.width = width;
        }
        if let Some(height) = overrides.height {
            self.terrain.height = height;
        }
        if let Some(depth) = overrides.depth {
            self.terrain.depth = depth;
        }
        self
    }
}

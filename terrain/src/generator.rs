//! Seeded terrain generator.
//!
//! Columns follow a bilinearly interpolated height field sampled from a
//! coarse lattice of random control points. Every column is stone up to its
//! ground height. Ground that sits below the water level becomes a sand bed
//! flooded up to the level, ground close above it becomes a sand shore, and
//! the rest is topped with soil, except inside acid patches.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use voxel_rover_core::{Bounds, Coordinate, TerrainKind};

use crate::{TerrainError, VoxelTerrain};

const LATTICE_SPACING: u32 = 4;

/// Parameters of the seeded terrain generator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Number of columns along the east axis.
    pub width: u32,
    /// Number of cells along the vertical axis.
    pub height: u32,
    /// Number of columns along the north axis.
    pub depth: u32,
    /// Seed of the random stream; equal seeds produce equal terrain.
    pub seed: u64,
    /// Mean ground altitude.
    pub base_altitude: u32,
    /// Maximum deviation of the ground from its mean.
    pub relief: u32,
    /// Highest flooded altitude.
    pub water_level: u32,
    /// Number of altitudes above the water level covered by sand.
    pub shore_band: u32,
    /// Number of acid patches scattered over dry land.
    pub acid_patches: u32,
    /// Largest Chebyshev radius of an acid patch.
    pub acid_radius: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 48,
            height: 32,
            depth: 48,
            seed: 0x5eed_cafe_f00d_0001,
            base_altitude: 12,
            relief: 6,
            water_level: 10,
            shore_band: 1,
            acid_patches: 6,
            acid_radius: 2,
        }
    }
}

impl GeneratorConfig {
    /// Extent of the generated volume.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height, self.depth)
    }

    fn validate(&self) -> Result<(), TerrainError> {
        if self.width == 0 || self.depth == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "footprint {}x{} holds no columns",
                self.width, self.depth
            )));
        }
        if self.height < 3 {
            return Err(TerrainError::InvalidConfig(format!(
                "height {} leaves no room above the ground",
                self.height
            )));
        }
        if self.water_level >= self.height - 1 {
            return Err(TerrainError::InvalidConfig(format!(
                "water level {} floods the whole volume of height {}",
                self.water_level, self.height
            )));
        }
        Ok(())
    }
}

/// Generates a terrain volume from the provided parameters.
pub fn generate(config: &GeneratorConfig) -> Result<VoxelTerrain, TerrainError> {
    config.validate()?;
    let bounds = config.bounds();
    let mut terrain = VoxelTerrain::filled(bounds, TerrainKind::Air)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let heights = HeightField::sample(config, &mut rng);
    let acid = AcidMask::scatter(config, &mut rng);

    for z in 0..bounds.depth() {
        for x in 0..bounds.width() {
            let ground = heights.ground(x, z);
            terrain.fill_column(x, z, 0..ground, TerrainKind::Stone)?;

            let top = if ground < config.water_level {
                terrain.fill_column(x, z, ground + 1..config.water_level + 1, TerrainKind::Water)?;
                TerrainKind::Sand
            } else if ground <= config.water_level + config.shore_band {
                TerrainKind::Sand
            } else if acid.covers(x, z) {
                TerrainKind::AcidicSurface
            } else {
                TerrainKind::Soil
            };
            terrain.set(Coordinate::new(x, ground, z), top)?;
        }
    }

    Ok(terrain)
}

struct HeightField {
    lattice_width: u32,
    lattice: Vec<f32>,
    floor: u32,
    ceiling: u32,
}

impl HeightField {
    fn sample(config: &GeneratorConfig, rng: &mut ChaCha8Rng) -> Self {
        let lattice_width = config.width / LATTICE_SPACING + 2;
        let lattice_depth = config.depth / LATTICE_SPACING + 2;
        let relief = config.relief as f32;
        let count = usize::try_from(lattice_width * lattice_depth).unwrap_or(0);
        let lattice = (0..count)
            .map(|_| {
                if relief > 0.0 {
                    rng.gen_range(-relief..=relief)
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            lattice_width,
            lattice,
            floor: 1,
            ceiling: config.height - 2,
        }
        .centred_on(config.base_altitude)
    }

    fn centred_on(mut self, base_altitude: u32) -> Self {
        let base = base_altitude as f32;
        for value in &mut self.lattice {
            *value += base;
        }
        self
    }

    fn ground(&self, x: u32, z: u32) -> u32 {
        let cell_x = x / LATTICE_SPACING;
        let cell_z = z / LATTICE_SPACING;
        let tx = (x % LATTICE_SPACING) as f32 / LATTICE_SPACING as f32;
        let tz = (z % LATTICE_SPACING) as f32 / LATTICE_SPACING as f32;

        let south = lerp(
            self.control(cell_x, cell_z),
            self.control(cell_x + 1, cell_z),
            tx,
        );
        let north = lerp(
            self.control(cell_x, cell_z + 1),
            self.control(cell_x + 1, cell_z + 1),
            tx,
        );
        let altitude = lerp(south, north, tz).round().max(0.0) as u32;
        altitude.clamp(self.floor, self.ceiling)
    }

    fn control(&self, column: u32, row: u32) -> f32 {
        let index = usize::try_from(row * self.lattice_width + column).unwrap_or(usize::MAX);
        self.lattice.get(index).copied().unwrap_or(0.0)
    }
}

struct AcidMask {
    patches: Vec<(u32, u32, u32)>,
}

impl AcidMask {
    fn scatter(config: &GeneratorConfig, rng: &mut ChaCha8Rng) -> Self {
        let patches = (0..config.acid_patches)
            .map(|_| {
                let x = rng.gen_range(0..config.width);
                let z = rng.gen_range(0..config.depth);
                let radius = rng.gen_range(0..=config.acid_radius);
                (x, z, radius)
            })
            .collect();
        Self { patches }
    }

    fn covers(&self, x: u32, z: u32) -> bool {
        self.patches
            .iter()
            .any(|&(px, pz, radius)| px.abs_diff(x) <= radius && pz.abs_diff(z) <= radius)
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

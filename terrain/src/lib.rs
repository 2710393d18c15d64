#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dense voxel terrain backing the Voxel Rover world.
//!
//! [`VoxelTerrain`] stores one [`TerrainKind`] per cell and implements the
//! [`TerrainVolume`] contract consumed by the world. Volumes are either built
//! cell by cell (handy for fixtures) or produced by the seeded generator in
//! [`generator`].

pub mod generator;

use std::ops::Range;

use thiserror::Error;
use voxel_rover_core::{Bounds, Coordinate, TerrainKind, TerrainVolume};

pub use generator::{generate, GeneratorConfig};

/// Errors raised while assembling a terrain volume.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// At least one axis of the requested bounds is zero.
    #[error("terrain bounds {width}x{height}x{depth} enclose no cells")]
    EmptyBounds {
        /// Requested east extent.
        width: u32,
        /// Requested vertical extent.
        height: u32,
        /// Requested north extent.
        depth: u32,
    },
    /// The provided cell buffer does not match the bounds.
    #[error("expected {expected} terrain cells but received {actual}")]
    CellCountMismatch {
        /// Number of cells implied by the bounds.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
    /// A write targeted a coordinate outside the volume.
    #[error("coordinate {0} lies outside the terrain")]
    OutOfBounds(Coordinate),
    /// Generator parameters cannot produce a usable volume.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// Dense, immutable-once-built voxel volume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelTerrain {
    bounds: Bounds,
    cells: Vec<TerrainKind>,
}

impl VoxelTerrain {
    /// Creates a volume where every cell holds `kind`.
    pub fn filled(bounds: Bounds, kind: TerrainKind) -> Result<Self, TerrainError> {
        ensure_not_empty(bounds)?;
        Ok(Self {
            bounds,
            cells: vec![kind; bounds.volume()],
        })
    }

    /// Creates a volume from cells laid out x fastest, then z, then y.
    pub fn from_cells(bounds: Bounds, cells: Vec<TerrainKind>) -> Result<Self, TerrainError> {
        ensure_not_empty(bounds)?;
        let expected = bounds.volume();
        if cells.len() != expected {
            return Err(TerrainError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { bounds, cells })
    }

    /// Overwrites a single cell.
    pub fn set(&mut self, coordinate: Coordinate, kind: TerrainKind) -> Result<(), TerrainError> {
        let index = self
            .index(coordinate)
            .ok_or(TerrainError::OutOfBounds(coordinate))?;
        self.cells[index] = kind;
        Ok(())
    }

    /// Overwrites the altitudes in `altitudes` of column `(x, z)`.
    pub fn fill_column(
        &mut self,
        x: u32,
        z: u32,
        altitudes: Range<u32>,
        kind: TerrainKind,
    ) -> Result<(), TerrainError> {
        for y in altitudes {
            self.set(Coordinate::new(x, y, z), kind)?;
        }
        Ok(())
    }

    /// Overwrites every cell of the horizontal layer at altitude `y`.
    pub fn fill_layer(&mut self, y: u32, kind: TerrainKind) -> Result<(), TerrainError> {
        for z in 0..self.bounds.depth() {
            for x in 0..self.bounds.width() {
                self.set(Coordinate::new(x, y, z), kind)?;
            }
        }
        Ok(())
    }

    /// Altitude of the topmost non-air cell in column `(x, z)`.
    #[must_use]
    pub fn surface_altitude(&self, x: u32, z: u32) -> Option<u32> {
        if !self.bounds.contains_column(x, z) {
            return None;
        }
        (0..self.bounds.height())
            .rev()
            .find(|&y| !self.kind_at(Coordinate::new(x, y, z)).is_air())
    }

    /// Counts the cells holding `kind`.
    #[must_use]
    pub fn count(&self, kind: TerrainKind) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }

    fn kind_at(&self, coordinate: Coordinate) -> TerrainKind {
        self.index(coordinate)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(TerrainKind::Air)
    }

    fn index(&self, coordinate: Coordinate) -> Option<usize> {
        if !self.bounds.contains(coordinate) {
            return None;
        }
        let width = usize::try_from(self.bounds.width()).ok()?;
        let depth = usize::try_from(self.bounds.depth()).ok()?;
        let x = usize::try_from(coordinate.x()).ok()?;
        let y = usize::try_from(coordinate.y()).ok()?;
        let z = usize::try_from(coordinate.z()).ok()?;
        Some((y * depth + z) * width + x)
    }

    fn first_column_topped_by<F>(&self, accept: F) -> Option<Coordinate>
    where
        F: Fn(TerrainKind) -> bool,
    {
        for x in 0..self.bounds.width() {
            for z in 0..self.bounds.depth() {
                let Some(ground) = self.surface_altitude(x, z) else {
                    continue;
                };
                let resting = ground + 1;
                if resting >= self.bounds.height() {
                    continue;
                }
                if accept(self.kind_at(Coordinate::new(x, ground, z))) {
                    return Some(Coordinate::new(x, resting, z));
                }
            }
        }
        None
    }
}

impl TerrainVolume for VoxelTerrain {
    fn sample(&self, coordinate: Coordinate) -> Option<TerrainKind> {
        self.index(coordinate)
            .and_then(|index| self.cells.get(index).copied())
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Scans columns east-major and prefers resting on soil, then on any
    /// solid that is neither water nor acid, then on anything at all.
    fn find_spawn_coordinate(&self) -> Option<Coordinate> {
        self.first_column_topped_by(|kind| kind == TerrainKind::Soil)
            .or_else(|| {
                self.first_column_topped_by(|kind| {
                    !matches!(kind, TerrainKind::Water | TerrainKind::AcidicSurface)
                })
            })
            .or_else(|| self.first_column_topped_by(|_| true))
    }
}

fn ensure_not_empty(bounds: Bounds) -> Result<(), TerrainError> {
    if bounds.volume() == 0 {
        return Err(TerrainError::EmptyBounds {
            width: bounds.width(),
            height: bounds.height(),
            depth: bounds.depth(),
        });
    }
    Ok(())
}

//! Gravity-seeking placement of the rover within a terrain column.

use voxel_rover_core::{Coordinate, TerrainVolume};

/// Computes the resting altitude in column `(x, z)` below `ceiling`.
///
/// The search starts at `ceiling` (clamped to the top of the volume) and
/// descends through air. The first non-air cell is the ground and the rover
/// rests one cell above it, so a returned altitude is never 0. Returns `None`
/// when the column is air all the way down, or when the column lies outside
/// the volume.
pub(crate) fn resting_altitude<T>(terrain: &T, x: u32, z: u32, ceiling: u32) -> Option<u32>
where
    T: TerrainVolume + ?Sized,
{
    let bounds = terrain.bounds();
    if !bounds.contains_column(x, z) || bounds.height() == 0 {
        return None;
    }

    let top = ceiling.min(bounds.height() - 1);
    (0..=top)
        .rev()
        .find(|&y| {
            terrain
                .sample(Coordinate::new(x, y, z))
                .map_or(false, |kind| !kind.is_air())
        })
        .map(|ground| ground + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxel_rover_core::{Bounds, TerrainKind};
    use voxel_rover_terrain::VoxelTerrain;

    fn column_fixture() -> VoxelTerrain {
        let mut terrain =
            VoxelTerrain::filled(Bounds::new(3, 10, 1), TerrainKind::Air).expect("terrain");
        terrain
            .fill_column(0, 0, 0..4, TerrainKind::Stone)
            .expect("column");
        terrain
            .set(Coordinate::new(1, 2, 0), TerrainKind::Water)
            .expect("water");
        terrain
            .set(Coordinate::new(1, 7, 0), TerrainKind::Soil)
            .expect("overhang");
        terrain
    }

    #[test]
    fn rests_above_topmost_solid() {
        let terrain = column_fixture();
        assert_eq!(resting_altitude(&terrain, 0, 0, 9), Some(4));
        assert_eq!(resting_altitude(&terrain, 0, 0, 100), Some(4));
    }

    #[test]
    fn ceiling_hides_overhangs() {
        let terrain = column_fixture();
        assert_eq!(resting_altitude(&terrain, 1, 0, 9), Some(8));
        assert_eq!(resting_altitude(&terrain, 1, 0, 6), Some(3));
    }

    #[test]
    fn empty_column_is_unreachable() {
        let terrain = column_fixture();
        assert_eq!(resting_altitude(&terrain, 2, 0, 9), None);
    }

    #[test]
    fn columns_outside_volume_are_unreachable() {
        let terrain = column_fixture();
        assert_eq!(resting_altitude(&terrain, 3, 0, 9), None);
        assert_eq!(resting_altitude(&terrain, 0, 1, 9), None);
    }
}

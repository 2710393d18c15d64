//! Movement resolution: candidate selection, collision checks, gravity,
//! fall damage and surface-dependent commit latency.

use voxel_rover_core::{
    Coordinate, Direction, Event, HealthCause, Maneuver, MoveRejection, TerrainKind,
};

use crate::{placement, scheduler::Job, World};

impl World {
    pub(crate) fn drive(&mut self, maneuver: Maneuver, out_events: &mut Vec<Event>) {
        let facing = self.unit.direction;
        match maneuver {
            Maneuver::Forward => self.step(facing, 1, out_events),
            Maneuver::Backward => self.step(facing, -1, out_events),
            Maneuver::StrafeLeft => {
                self.step(facing, -1, out_events);
                self.face(facing.rotated_left(), out_events);
            }
            Maneuver::StrafeRight => {
                self.step(facing, 1, out_events);
                self.face(facing.rotated_right(), out_events);
            }
            Maneuver::TurnLeft => self.face(facing.rotated_left(), out_events),
            Maneuver::TurnRight => self.face(facing.rotated_right(), out_events),
        }
    }

    /// Attempts to displace the rover by `delta` cells along `direction`.
    ///
    /// Fall damage lands immediately; the position itself commits after the
    /// latency of the surface the rover is leaving.
    fn step(&mut self, direction: Direction, delta: i64, out_events: &mut Vec<Event>) {
        let from = self.unit.position;
        let destination = match self.resolve_destination(from, direction, delta) {
            Ok(destination) => destination,
            Err(reason) => {
                tracing::debug!(?direction, delta, ?reason, "move rejected");
                out_events.push(Event::MoveRejected {
                    direction,
                    delta,
                    reason,
                });
                return;
            }
        };

        let drop = from.y().saturating_sub(destination.y());
        if drop > self.config.safe_fall_height {
            let damage = i64::from(drop).saturating_mul(self.config.fall_damage_per_level);
            self.adjust_health(-damage, HealthCause::Fall, out_events);
        }

        let surface = from.below().and_then(|below| self.sample(below));
        let delay = self.config.move_delay(surface);
        if delay.is_zero() {
            self.commit_move(destination, out_events);
            return;
        }

        tracing::debug!(%from, to = %destination, ?delay, "move scheduled");
        self.scheduler
            .schedule_once(Job::CommitMove { destination }, delay);
        out_events.push(Event::MoveScheduled {
            from,
            to: destination,
            delay,
        });
    }

    fn resolve_destination(
        &self,
        from: Coordinate,
        direction: Direction,
        delta: i64,
    ) -> Result<Coordinate, MoveRejection> {
        let bounds = self.terrain.bounds();
        let candidate = from
            .stepped(direction, delta)
            .filter(|candidate| bounds.contains_column(candidate.x(), candidate.z()))
            .ok_or(MoveRejection::OutOfBounds)?;

        let ceiling = if self.is_open(candidate) {
            candidate
        } else {
            candidate
                .above()
                .filter(|above| self.is_open(*above))
                .ok_or(MoveRejection::Blocked)?
        };

        let resting = placement::resting_altitude(
            self.terrain.as_ref(),
            candidate.x(),
            candidate.z(),
            ceiling.y(),
        )
        .ok_or(MoveRejection::NoFloor)?;

        Ok(candidate.with_altitude(resting))
    }

    fn is_open(&self, coordinate: Coordinate) -> bool {
        self.sample(coordinate) == Some(TerrainKind::Air)
    }

    pub(crate) fn commit_move(&mut self, destination: Coordinate, out_events: &mut Vec<Event>) {
        let from = self.unit.position;
        self.unit.position = destination;
        tracing::debug!(%from, to = %destination, "move committed");
        out_events.push(Event::UnitMoved {
            from,
            to: destination,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use voxel_rover_core::{Bounds, Command};
    use voxel_rover_terrain::VoxelTerrain;

    use crate::{apply, query, Config, World};

    use super::*;

    /// Stone floor at altitude 0 with soil on top, spawn at (0, 2, 0).
    fn terrain() -> VoxelTerrain {
        let mut terrain =
            VoxelTerrain::filled(Bounds::new(6, 12, 6), TerrainKind::Air).expect("terrain");
        terrain.fill_layer(0, TerrainKind::Stone).expect("bedrock");
        terrain.fill_layer(1, TerrainKind::Soil).expect("topsoil");
        terrain
    }

    fn drive(world: &mut World, maneuver: Maneuver) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Drive { maneuver }, &mut events);
        events
    }

    #[test]
    fn forward_on_soil_commits_immediately() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let events = drive(&mut world, Maneuver::Forward);

        assert_eq!(
            events,
            vec![Event::UnitMoved {
                from: Coordinate::new(0, 2, 0),
                to: Coordinate::new(0, 2, 1),
            }]
        );
        assert_eq!(query::unit(&world).health, 10_000);
    }

    #[test]
    fn leaving_the_volume_is_rejected() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let events = drive(&mut world, Maneuver::Backward);

        assert_eq!(
            events,
            vec![Event::MoveRejected {
                direction: Direction::North,
                delta: -1,
                reason: MoveRejection::OutOfBounds,
            }]
        );
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 0));
    }

    #[test]
    fn single_step_ledges_are_climbed() {
        let mut terrain = terrain();
        terrain
            .set(Coordinate::new(0, 2, 1), TerrainKind::Stone)
            .expect("ledge");
        let mut world = World::new(terrain, Config::default()).expect("world");

        let _ = drive(&mut world, Maneuver::Forward);
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 3, 1));
    }

    #[test]
    fn two_step_walls_block() {
        let mut terrain = terrain();
        terrain
            .fill_column(0, 1, 2..4, TerrainKind::Stone)
            .expect("wall");
        let mut world = World::new(terrain, Config::default()).expect("world");

        let events = drive(&mut world, Maneuver::Forward);
        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveRejection::Blocked,
                ..
            }]
        ));
    }

    #[test]
    fn bottomless_columns_have_no_floor() {
        let mut terrain = terrain();
        terrain
            .fill_column(0, 1, 0..2, TerrainKind::Air)
            .expect("shaft");
        let mut world = World::new(terrain, Config::default()).expect("world");

        let events = drive(&mut world, Maneuver::Forward);
        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveRejection::NoFloor,
                ..
            }]
        ));
    }

    /// Soil-topped ledge along the southern edge rising `height` levels above
    /// the plain, so the spawn sits on its western end.
    fn cliff(height: u32) -> World {
        let mut terrain = terrain();
        for x in 0..6 {
            terrain
                .fill_column(x, 0, 1..1 + height, TerrainKind::Stone)
                .expect("cliff");
            terrain
                .set(Coordinate::new(x, 1 + height, 0), TerrainKind::Soil)
                .expect("cliff top");
        }
        let world = World::new(terrain, Config::default()).expect("world");
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2 + height, 0));
        world
    }

    #[test]
    fn four_level_fall_costs_four_hundred() {
        let mut world = cliff(4);
        let events = drive(&mut world, Maneuver::Forward);

        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 1));
        assert_eq!(query::unit(&world).health, 9_600);
        assert!(events.contains(&Event::HealthChanged {
            delta: -400,
            health: 9_600,
            cause: HealthCause::Fall,
        }));
    }

    #[test]
    fn three_level_fall_is_free() {
        let mut world = cliff(3);
        let _ = drive(&mut world, Maneuver::Forward);

        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 1));
        assert_eq!(query::unit(&world).health, 10_000);
    }

    /// Lake of water with a four-level pillar of `kind` at the spawn column,
    /// so the rover starts at (0, 6, 0) on top of the pillar.
    fn pillar(kind: TerrainKind) -> World {
        let mut terrain = terrain();
        terrain.fill_layer(1, TerrainKind::Water).expect("lake");
        terrain.fill_column(0, 0, 2..6, kind).expect("pillar");
        let world = World::new(terrain, Config::default()).expect("world");
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 6, 0));
        assert_eq!(query::current_surface(&world), Some(kind));
        world
    }

    fn assert_fall_lands_before_delayed_commit(kind: TerrainKind, delay: Duration) {
        let mut world = pillar(kind);
        let from = Coordinate::new(0, 6, 0);
        let to = Coordinate::new(0, 2, 1);

        let events = drive(&mut world, Maneuver::Forward);
        assert_eq!(
            events,
            vec![
                Event::HealthChanged {
                    delta: -400,
                    health: 9_600,
                    cause: HealthCause::Fall,
                },
                Event::MoveScheduled { from, to, delay },
            ]
        );
        assert_eq!(query::unit(&world).health, 9_600);
        assert_eq!(query::unit(&world).position, from);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: delay - Duration::from_millis(1),
            },
            &mut events,
        );
        assert_eq!(query::unit(&world).position, from);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1),
            },
            &mut events,
        );
        assert!(events.contains(&Event::UnitMoved { from, to }));
        assert_eq!(query::unit(&world).position, to);
        assert_eq!(query::unit(&world).health, 9_600);
    }

    #[test]
    fn fall_from_sand_damages_before_the_commit() {
        assert_fall_lands_before_delayed_commit(TerrainKind::Sand, Duration::from_secs(5));
    }

    #[test]
    fn fall_from_water_damages_before_the_commit() {
        assert_fall_lands_before_delayed_commit(TerrainKind::Water, Duration::from_secs(10));
    }

    #[test]
    fn strafes_move_and_rotate() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Face {
                direction: Direction::East,
            },
            &mut events,
        );

        let _ = drive(&mut world, Maneuver::StrafeRight);
        let unit = query::unit(&world);
        assert_eq!(unit.position, Coordinate::new(1, 2, 0));
        assert_eq!(unit.direction, Direction::South);

        let _ = drive(&mut world, Maneuver::StrafeLeft);
        let unit = query::unit(&world);
        assert_eq!(unit.position, Coordinate::new(1, 2, 1));
        assert_eq!(unit.direction, Direction::East);
    }

    #[test]
    fn strafe_rotates_even_when_blocked() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let events = drive(&mut world, Maneuver::StrafeLeft);

        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 0));
        assert_eq!(query::unit(&world).direction, Direction::West);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn turns_only_rotate() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let _ = drive(&mut world, Maneuver::TurnRight);
        let _ = drive(&mut world, Maneuver::TurnRight);
        let unit = query::unit(&world);
        assert_eq!(unit.direction, Direction::South);
        assert_eq!(unit.position, Coordinate::new(0, 2, 0));

        let _ = drive(&mut world, Maneuver::TurnLeft);
        assert_eq!(query::unit(&world).direction, Direction::East);
    }

    #[test]
    fn sand_delays_commit_by_five_units() {
        let mut terrain = terrain();
        terrain.fill_layer(1, TerrainKind::Sand).expect("dunes");
        let mut world = World::new(terrain, Config::default()).expect("world");
        assert_eq!(query::current_surface(&world), Some(TerrainKind::Sand));

        let events = drive(&mut world, Maneuver::Forward);
        assert_eq!(
            events,
            vec![Event::MoveScheduled {
                from: Coordinate::new(0, 2, 0),
                to: Coordinate::new(0, 2, 1),
                delay: Duration::from_secs(5),
            }]
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(4_999),
            },
            &mut events,
        );
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 0));
        assert_eq!(query::pending_moves(&world), 1);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1),
            },
            &mut events,
        );
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 1));
        assert_eq!(query::pending_moves(&world), 0);
    }

    #[test]
    fn overlapping_commits_both_fire_and_last_wins() {
        let mut terrain = terrain();
        terrain.fill_layer(1, TerrainKind::Water).expect("lake");
        let mut world = World::new(terrain, Config::default()).expect("world");
        assert_eq!(query::unit(&world).position, Coordinate::new(0, 2, 0));
        assert_eq!(query::current_surface(&world), Some(TerrainKind::Water));

        let _ = drive(&mut world, Maneuver::Forward);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(4),
            },
            &mut events,
        );
        let _ = drive(&mut world, Maneuver::TurnRight);
        let _ = drive(&mut world, Maneuver::Forward);
        assert_eq!(query::pending_moves(&world), 2);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(20),
            },
            &mut events,
        );
        let commits: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::UnitMoved { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(
            commits,
            vec![Coordinate::new(0, 2, 1), Coordinate::new(1, 2, 0)]
        );
        assert_eq!(query::unit(&world).position, Coordinate::new(1, 2, 0));
        assert_eq!(query::unit(&world).direction, Direction::East);
    }

    #[test]
    fn movement_never_turns_the_rover() {
        let mut world = World::new(terrain(), Config::default()).expect("world");
        let _ = drive(&mut world, Maneuver::Forward);
        let _ = drive(&mut world, Maneuver::Backward);
        assert_eq!(query::unit(&world).direction, Direction::North);
        assert!(query::bounds(&world).contains(query::unit(&world).position));
    }
}

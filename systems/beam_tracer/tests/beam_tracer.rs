use lazor_core::{Block, BlockKind, CellCoord, Direction, LatticePoint, Laser};
use lazor_system_beam_tracer::{BeamEnd, BeamTracer, TraceLimits};
use lazor_world::Grid;

fn points(raw: &[(i64, i64)]) -> Vec<LatticePoint> {
    raw.iter().map(|&(x, y)| LatticePoint::new(x, y)).collect()
}

fn grid_with(columns: u32, rows: u32, blocks: &[(u32, u32, BlockKind)]) -> Grid {
    let mut grid = Grid::new(columns, rows).expect("valid dimensions");
    for &(column, row, kind) in blocks {
        grid.place(CellCoord::new(column, row), Block::fixed(kind))
            .expect("open cell accepts a block");
    }
    grid
}

fn laser(x: i64, y: i64, direction: Direction) -> Laser {
    Laser::new(LatticePoint::new(x, y), direction)
}

#[test]
fn reflection_mirrors_the_path_about_the_impact_row() {
    let grid = grid_with(3, 3, &[(1, 1, BlockKind::Reflect)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(0, 5, Direction::UP_RIGHT)]);

    assert_eq!(trace.beams().len(), 1);
    let beam = &trace.beams()[0];
    assert_eq!(beam.end(), BeamEnd::Exited);
    assert_eq!(
        beam.points(),
        points(&[(0, 5), (1, 4), (2, 3), (1, 2), (0, 1)]).as_slice()
    );

    let impact = beam.points()[2];
    for offset in 1..=2 {
        let before = beam.points()[2 - offset];
        let after = beam.points()[2 + offset];
        assert_eq!(before.x(), after.x(), "mirror keeps the distance from the wall");
        assert_eq!(
            before.y() - impact.y(),
            impact.y() - after.y(),
            "mirror is symmetric about the impact row"
        );
    }
}

#[test]
fn refraction_splits_into_two_continuations() {
    let grid = grid_with(3, 3, &[(1, 1, BlockKind::Refract)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(0, 5, Direction::UP_RIGHT)]);

    assert_eq!(trace.beams().len(), 2);
    let through = &trace.beams()[0];
    let reflected = &trace.beams()[1];

    assert_eq!(
        through.points(),
        points(&[(0, 5), (1, 4), (2, 3), (3, 2), (4, 1), (5, 0)]).as_slice()
    );
    assert_eq!(through.parent(), None);

    assert_eq!(reflected.points(), points(&[(2, 3), (1, 2), (0, 1)]).as_slice());
    assert_eq!(reflected.parent(), Some(0));
    assert_eq!(reflected.source(), 0);
    assert_eq!(reflected.end(), BeamEnd::Exited);

    assert_eq!(trace.visited().len(), 8);
}

#[test]
fn opaque_block_absorbs_the_beam() {
    let grid = grid_with(3, 3, &[(1, 1, BlockKind::Opaque)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(0, 5, Direction::UP_RIGHT)]);

    let beam = &trace.beams()[0];
    assert_eq!(beam.end(), BeamEnd::Absorbed);
    assert_eq!(beam.points(), points(&[(0, 5), (1, 4), (2, 3)]).as_slice());
    assert!(!trace.is_visited(LatticePoint::new(3, 2)));
    assert!(!trace.is_visited(LatticePoint::new(1, 2)));
}

#[test]
fn empty_blocks_and_unavailable_cells_are_transparent() {
    let mut grid = grid_with(3, 3, &[(1, 1, BlockKind::Empty)]);
    grid.mark_unavailable(CellCoord::new(1, 0))
        .expect("open cell can be blocked");
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(0, 5, Direction::UP_RIGHT)]);

    assert_eq!(
        trace.beams()[0].points(),
        points(&[(0, 5), (1, 4), (2, 3), (3, 2), (4, 1), (5, 0)]).as_slice()
    );
}

#[test]
fn closed_reflective_loop_is_reported_as_non_terminating() {
    let grid = grid_with(
        3,
        3,
        &[
            (1, 0, BlockKind::Reflect),
            (0, 1, BlockKind::Reflect),
            (2, 1, BlockKind::Reflect),
            (1, 2, BlockKind::Reflect),
        ],
    );
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(3, 2, Direction::DOWN_RIGHT)]);

    let beam = &trace.beams()[0];
    assert_eq!(beam.end(), BeamEnd::NonTerminating);
    assert_eq!(
        beam.points(),
        points(&[(3, 2), (4, 3), (3, 4), (2, 3), (3, 2), (4, 3)]).as_slice()
    );
    assert!(!trace.terminated());
    assert_eq!(trace.visited().len(), 4);
}

#[test]
fn repeated_lasers_merge_and_off_lattice_lasers_exit_immediately() {
    let grid = Grid::new(2, 2).expect("valid dimensions");
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(
        &grid,
        &[
            laser(0, 1, Direction::DOWN_RIGHT),
            laser(0, 1, Direction::DOWN_RIGHT),
            laser(9, 9, Direction::DOWN_RIGHT),
        ],
    );

    let ends: Vec<_> = trace.beams().iter().map(|beam| beam.end()).collect();
    assert_eq!(
        ends,
        vec![BeamEnd::Exited, BeamEnd::Merged, BeamEnd::Exited]
    );
    assert_eq!(trace.beams()[1].points(), trace.beams()[0].points());
    assert!(trace.beams()[2].points().is_empty());
    assert!(trace.terminated());
    assert_eq!(trace.visited().len(), 4);
}

#[test]
fn lasers_sharing_a_diagonal_keep_their_full_paths() {
    let grid = Grid::new(2, 2).expect("valid dimensions");
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(
        &grid,
        &[
            laser(0, 1, Direction::DOWN_RIGHT),
            laser(1, 2, Direction::DOWN_RIGHT),
        ],
    );

    let leader: Vec<_> = trace.beams_from(0).collect();
    let follower: Vec<_> = trace.beams_from(1).collect();
    assert_eq!(
        leader[0].points(),
        points(&[(0, 1), (1, 2), (2, 3), (3, 4)]).as_slice()
    );
    assert_eq!(follower.len(), 1);
    assert_eq!(follower[0].end(), BeamEnd::Merged);
    assert_eq!(
        follower[0].points(),
        points(&[(1, 2), (2, 3), (3, 4)]).as_slice()
    );
    assert_eq!(trace.visited().len(), 4);
}

#[test]
fn beam_merging_mid_path_inherits_the_rest_of_the_earlier_path() {
    let grid = grid_with(2, 2, &[(0, 0, BlockKind::Reflect)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(
        &grid,
        &[
            laser(1, 2, Direction::DOWN_RIGHT),
            laser(0, 3, Direction::UP_RIGHT),
        ],
    );

    assert_eq!(
        trace.beams()[0].points(),
        points(&[(1, 2), (2, 3), (3, 4)]).as_slice()
    );
    let follower = &trace.beams()[1];
    assert_eq!(follower.end(), BeamEnd::Merged);
    assert_eq!(
        follower.points(),
        points(&[(0, 3), (1, 2), (2, 3), (3, 4)]).as_slice()
    );
    assert_eq!(trace.visited().len(), 4);
}

#[test]
fn beam_reflects_toward_the_left_edge_exit() {
    let grid = grid_with(2, 2, &[(1, 0, BlockKind::Reflect)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(&grid, &[laser(1, 0, Direction::DOWN_RIGHT)]);

    assert_eq!(
        trace.beams()[0].points(),
        points(&[(1, 0), (2, 1), (1, 2), (0, 3)]).as_slice()
    );
    assert!(trace.covers(&[LatticePoint::new(0, 3)]));
}

#[test]
fn beams_from_groups_paths_by_laser() {
    let grid = grid_with(3, 3, &[(1, 1, BlockKind::Refract)]);
    let mut tracer = BeamTracer::new();

    let trace = tracer.trace(
        &grid,
        &[
            laser(0, 5, Direction::UP_RIGHT),
            laser(6, 1, Direction::DOWN_LEFT),
        ],
    );

    assert_eq!(trace.beams_from(0).count(), 2);
    assert!(trace.beams_from(1).all(|beam| beam.source() == 1));
}

#[test]
fn step_budget_stops_long_beams() {
    let grid = Grid::new(4, 4).expect("valid dimensions");
    let mut tracer = BeamTracer::with_limits(TraceLimits {
        max_steps_per_beam: Some(2),
    });

    let trace = tracer.trace(&grid, &[laser(0, 1, Direction::DOWN_RIGHT)]);

    let beam = &trace.beams()[0];
    assert_eq!(beam.end(), BeamEnd::NonTerminating);
    assert_eq!(beam.points().len(), 3);
}

#[test]
fn tracer_reuse_does_not_leak_state_between_traces() {
    let grid = grid_with(3, 3, &[(1, 1, BlockKind::Refract)]);
    let lasers = [laser(0, 5, Direction::UP_RIGHT)];
    let mut tracer = BeamTracer::new();

    let first = tracer.trace(&grid, &lasers);
    let second = tracer.trace(&grid, &lasers);

    assert_eq!(first.beams(), second.beams());
    assert_eq!(first.visited(), second.visited());
}

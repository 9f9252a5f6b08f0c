use std::path::PathBuf;

use lazor_core::{Block, BlockKind, BlockPool, CellCoord, Direction, LatticePoint, Laser, Placement};
use lazor_system_placement_search::{
    PlacementSearch, SearchConfig, SearchOutcome, SearchReport, SearchRequest,
};
use lazor_world::{Grid, Puzzle};

fn fixture(name: &str) -> Puzzle {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../puzzles")
        .join(name);
    lazor_bff::load_puzzle(&path).expect("fixture parses")
}

fn placement(column: u32, row: u32, kind: BlockKind) -> Placement {
    Placement {
        cell: CellCoord::new(column, row),
        kind,
    }
}

fn single_opaque_puzzle(target: LatticePoint) -> Puzzle {
    let grid = Grid::new(1, 1).expect("valid dimensions");
    let pool: BlockPool = [BlockKind::Opaque].into_iter().collect();
    let laser = Laser::new(
        LatticePoint::new(0, 1),
        Direction::new(1, 1).expect("diagonal direction"),
    );
    Puzzle::new(grid, pool, vec![laser], [target]).expect("valid puzzle")
}

fn solve(puzzle: &Puzzle, config: SearchConfig) -> SearchReport {
    PlacementSearch::new(config).solve(&SearchRequest::from_puzzle(puzzle))
}

fn placements(report: &SearchReport) -> Vec<Placement> {
    report
        .outcome
        .solution()
        .expect("search should find a solution")
        .placements()
        .to_vec()
}

#[test]
fn fixed_reflector_alone_solves_the_puzzle() {
    let mut grid = Grid::new(2, 2).expect("valid dimensions");
    grid.place(CellCoord::new(1, 0), Block::fixed(BlockKind::Reflect))
        .expect("open cell accepts a block");
    let puzzle = Puzzle::new(
        grid.clone(),
        BlockPool::new(),
        vec![Laser::new(LatticePoint::new(1, 0), Direction::DOWN_RIGHT)],
        [LatticePoint::new(0, 3)],
    )
    .expect("valid puzzle");

    let report = solve(&puzzle, SearchConfig::default());

    let solution = report.outcome.solution().expect("grid as given is a solution");
    assert_eq!(solution.grid(), &grid);
    assert!(solution.placements().is_empty());
    assert_eq!(report.stats.candidates_tried, 1);
}

#[test]
fn single_block_reaches_the_origin_target() {
    let report = solve(
        &single_opaque_puzzle(LatticePoint::new(0, 1)),
        SearchConfig::default(),
    );

    assert_eq!(
        placements(&report),
        vec![placement(0, 0, BlockKind::Opaque)]
    );
    assert_eq!(report.stats.candidates_tried, 1);
}

#[test]
fn absorbed_beam_cannot_reach_a_target_behind_the_block() {
    let report = solve(
        &single_opaque_puzzle(LatticePoint::new(1, 2)),
        SearchConfig::default(),
    );

    assert!(matches!(report.outcome, SearchOutcome::Exhausted));
    assert_eq!(report.stats.candidates_tried, 1);
}

#[test]
fn more_blocks_than_cells_is_exhausted_without_tracing() {
    let grid = Grid::new(1, 2).expect("valid dimensions");
    let pool: BlockPool = [BlockKind::Reflect, BlockKind::Reflect, BlockKind::Opaque]
        .into_iter()
        .collect();
    let puzzle = Puzzle::new(
        grid,
        pool,
        vec![Laser::new(LatticePoint::new(0, 1), Direction::DOWN_RIGHT)],
        [LatticePoint::new(1, 2)],
    )
    .expect("valid puzzle");

    let report = solve(&puzzle, SearchConfig::default());

    assert!(matches!(report.outcome, SearchOutcome::Exhausted));
    assert_eq!(report.stats.candidates_tried, 0);
}

#[test]
fn every_distinct_arrangement_is_tried_exactly_once() {
    let grid = Grid::new(2, 2).expect("valid dimensions");
    let pool: BlockPool = [BlockKind::Reflect, BlockKind::Reflect, BlockKind::Opaque]
        .into_iter()
        .collect();
    let puzzle = Puzzle::new(grid, pool, Vec::new(), [LatticePoint::new(1, 2)])
        .expect("valid puzzle");
    let request = SearchRequest::from_puzzle(&puzzle);

    // C(4, 3) * 3! / (2! * 1!) = 12
    assert_eq!(request.candidate_count(), 12);

    let report = PlacementSearch::default().solve(&request);

    assert!(matches!(report.outcome, SearchOutcome::Exhausted));
    assert_eq!(report.stats.candidates_tried, 12);
    assert_eq!(report.stats.non_terminating, 0);
}

#[test]
fn mad_1_is_solved_in_enumeration_order() {
    let puzzle = fixture("mad_1.bff");

    let report = solve(&puzzle, SearchConfig::default());

    assert_eq!(
        placements(&report),
        vec![
            placement(2, 0, BlockKind::Refract),
            placement(3, 1, BlockKind::Reflect),
            placement(0, 2, BlockKind::Reflect),
        ]
    );
    assert_eq!(report.stats.candidates_tried, 1179);

    let solution = report.outcome.solution().expect("solution");
    for target in puzzle.targets() {
        assert!(
            solution.trace().is_visited(*target),
            "target {target} should be lit"
        );
    }
}

#[test]
fn tiny_5_is_solved_around_the_fixed_block() {
    let puzzle = fixture("tiny_5.bff");

    let report = solve(&puzzle, SearchConfig::default());

    assert_eq!(
        placements(&report),
        vec![
            placement(0, 0, BlockKind::Reflect),
            placement(2, 0, BlockKind::Reflect),
            placement(0, 2, BlockKind::Reflect),
            placement(1, 2, BlockKind::Refract),
        ]
    );
    assert_eq!(report.stats.candidates_tried, 19);
}

#[test]
fn unreachable_target_exhausts_the_search_space() {
    let puzzle = fixture("unreachable_3.bff");
    let request = SearchRequest::from_puzzle(&puzzle);

    let report = PlacementSearch::default().solve(&request);

    assert!(matches!(report.outcome, SearchOutcome::Exhausted));
    assert_eq!(u128::from(report.stats.candidates_tried), request.candidate_count());
    assert_eq!(report.stats.candidates_tried, 140);
}

#[test]
fn candidate_cutoff_abandons_the_search() {
    let puzzle = fixture("mad_1.bff");

    let report = solve(
        &puzzle,
        SearchConfig {
            max_candidates: Some(100),
            ..SearchConfig::default()
        },
    );

    assert!(matches!(report.outcome, SearchOutcome::Abandoned));
    assert_eq!(report.stats.candidates_tried, 100);
}

#[test]
fn cutoff_at_the_winning_candidate_still_finds_it() {
    let puzzle = fixture("mad_1.bff");

    let report = solve(
        &puzzle,
        SearchConfig {
            max_candidates: Some(1179),
            ..SearchConfig::default()
        },
    );

    assert!(report.outcome.solution().is_some());
}

#[test]
fn repeated_searches_are_identical() {
    let puzzle = fixture("tiny_5.bff");

    let first = solve(&puzzle, SearchConfig::default());
    let second = solve(&puzzle, SearchConfig::default());

    assert_eq!(placements(&first), placements(&second));
    assert_eq!(first.stats, second.stats);
    let first_solution = first.outcome.solution().expect("solution");
    let second_solution = second.outcome.solution().expect("solution");
    assert_eq!(first_solution.trace().beams(), second_solution.trace().beams());
}

#[test]
fn parallel_search_matches_sequential_search() {
    let parallel = SearchConfig {
        parallel: true,
        ..SearchConfig::default()
    };

    for name in ["mad_1.bff", "tiny_5.bff"] {
        let puzzle = fixture(name);
        let sequential_report = solve(&puzzle, SearchConfig::default());
        let parallel_report = solve(&puzzle, parallel);

        assert_eq!(
            placements(&sequential_report),
            placements(&parallel_report),
            "{name} should resolve to the same arrangement"
        );
    }

    let unreachable = fixture("unreachable_3.bff");
    let report = solve(&unreachable, parallel);
    assert!(matches!(report.outcome, SearchOutcome::Exhausted));
    assert_eq!(report.stats.candidates_tried, 140);
}

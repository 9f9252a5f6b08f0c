#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Exhaustive search over arrangements of free blocks.
//!
//! Candidates are the distinct assignments of the free block multiset to open
//! cells. Kinds are placed in [`BlockKind`] order: each kind claims a subset of
//! the cells left over by the kinds before it, subsets are walked in
//! lexicographic order of open-cell index, and the last kind varies fastest.
//! Every candidate is traced once against the working grid and the first one
//! that terminates while lighting every target wins.

mod subsets;

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};

use lazor_core::{Block, BlockKind, BlockPool, CellCoord, LatticePoint, Laser, Placement};
use lazor_system_beam_tracer::{BeamTracer, Trace, TraceLimits};
use lazor_world::{Grid, Puzzle};
use rayon::prelude::*;

use crate::subsets::{binomial, Subsets};

/// Everything the search needs to evaluate candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    grid: Grid,
    pool: BlockPool,
    open_cells: Vec<CellCoord>,
    lasers: Vec<Laser>,
    targets: BTreeSet<LatticePoint>,
}

impl SearchRequest {
    /// Builds a request from a validated puzzle.
    #[must_use]
    pub fn from_puzzle(puzzle: &Puzzle) -> Self {
        Self {
            grid: puzzle.grid().clone(),
            pool: puzzle.pool().clone(),
            open_cells: puzzle.open_cells(),
            lasers: puzzle.lasers().to_vec(),
            targets: puzzle.targets().clone(),
        }
    }

    /// Grid holding the fixed blocks.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Free blocks to place.
    #[must_use]
    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Cells free blocks may occupy, in row-major order.
    #[must_use]
    pub fn open_cells(&self) -> &[CellCoord] {
        &self.open_cells
    }

    /// Laser sources.
    #[must_use]
    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    /// Points a solution must light.
    #[must_use]
    pub fn targets(&self) -> &BTreeSet<LatticePoint> {
        &self.targets
    }

    /// Number of distinct candidates the search space holds, saturating at
    /// `u128::MAX`.
    ///
    /// Equals `C(n, k) * k! / prod(c_i!)` for `n` open cells and `k` free
    /// blocks split into kinds of `c_i` blocks each.
    #[must_use]
    pub fn candidate_count(&self) -> u128 {
        let mut remaining = self.open_cells.len();
        let mut total: u128 = 1;
        for (_, count) in self.pool.iter() {
            if count > remaining {
                return 0;
            }
            total = total.saturating_mul(binomial(remaining, count));
            remaining -= count;
        }
        total
    }
}

/// Optional knobs applied to a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Stops the search with [`SearchOutcome::Abandoned`] once this many
    /// candidates were evaluated without a match.
    pub max_candidates: Option<u64>,
    /// Distributes the candidates over the rayon thread pool.
    pub parallel: bool,
    /// Limits forwarded to every beam tracer.
    pub trace_limits: TraceLimits,
}

/// Winning arrangement.
#[derive(Clone, Debug)]
pub struct Solution {
    grid: Grid,
    placements: Vec<Placement>,
    trace: Trace,
}

impl Solution {
    /// Grid with every free block in place.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Free block placements in row-major cell order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Beam trace that lit every target.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}

/// Terminal state of a search.
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    /// A candidate lit every target.
    Found(Solution),
    /// Every candidate was evaluated and none matched.
    Exhausted,
    /// The candidate cutoff was reached before the space was exhausted.
    Abandoned,
}

impl SearchOutcome {
    /// Solution carried by a successful search.
    #[must_use]
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Self::Found(solution) => Some(solution),
            Self::Exhausted | Self::Abandoned => None,
        }
    }
}

/// Counters collected while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Candidates that were traced.
    pub candidates_tried: u64,
    /// Traced candidates rejected because a beam never came to rest.
    pub non_terminating: u64,
}

/// Outcome of a search together with its counters.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// How the search ended.
    pub outcome: SearchOutcome,
    /// Work performed.
    pub stats: SearchStats,
}

/// Placement search engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementSearch {
    config: SearchConfig,
}

impl PlacementSearch {
    /// Creates an engine with the provided configuration.
    #[must_use]
    pub const fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Configuration the engine runs with.
    #[must_use]
    pub const fn config(&self) -> SearchConfig {
        self.config
    }

    /// Searches the request's candidate space.
    pub fn solve(&self, request: &SearchRequest) -> SearchReport {
        let blocks = request.pool.len();
        let cells = request.open_cells.len();
        if blocks > cells {
            log::debug!("{blocks} free blocks cannot fit in {cells} open cells");
            return SearchReport {
                outcome: SearchOutcome::Exhausted,
                stats: SearchStats::default(),
            };
        }

        log::debug!(
            "searching {} candidates for {blocks} free blocks over {cells} open cells",
            request.candidate_count()
        );

        let counters = Counters::default();
        let kinds: Vec<(BlockKind, usize)> = request.pool.iter().collect();
        let halt = if self.config.parallel && !kinds.is_empty() {
            self.solve_parallel(request, &kinds, &counters)
        } else {
            halted(Worker::new(request, &kinds, &counters, self.config).place_kind(0))
        };

        let mut stats = counters.snapshot();
        if let Some(limit) = self.config.max_candidates {
            stats.candidates_tried = stats.candidates_tried.min(limit);
        }

        let outcome = match halt {
            Some(Halt::Found(solution)) => {
                log::debug!(
                    "solution found after {} candidates",
                    stats.candidates_tried
                );
                SearchOutcome::Found(solution)
            }
            Some(Halt::Abandoned) => {
                log::debug!(
                    "search abandoned after {} candidates",
                    stats.candidates_tried
                );
                SearchOutcome::Abandoned
            }
            None => {
                log::debug!(
                    "search exhausted after {} candidates",
                    stats.candidates_tried
                );
                SearchOutcome::Exhausted
            }
        };

        SearchReport { outcome, stats }
    }

    fn solve_parallel(
        &self,
        request: &SearchRequest,
        kinds: &[(BlockKind, usize)],
        counters: &Counters,
    ) -> Option<Halt> {
        let (_, first_count) = kinds[0];
        let mut walk = Subsets::new(request.open_cells.len(), first_count);
        let mut roots = Vec::new();
        while let Some(subset) = walk.advance() {
            roots.push(subset.to_vec());
        }
        log::trace!("distributing {} subtrees over the thread pool", roots.len());

        roots
            .par_iter()
            .map_init(
                || Worker::new(request, kinds, counters, self.config),
                |worker, root| halted(worker.explore_root(root)),
            )
            .find_map_first(|halt| halt)
    }
}

#[derive(Debug, Default)]
struct Counters {
    candidates: AtomicU64,
    non_terminating: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> SearchStats {
        SearchStats {
            candidates_tried: self.candidates.load(Ordering::Relaxed),
            non_terminating: self.non_terminating.load(Ordering::Relaxed),
        }
    }
}

enum Halt {
    Found(Solution),
    Abandoned,
}

fn halted(flow: ControlFlow<Halt>) -> Option<Halt> {
    match flow {
        ControlFlow::Break(halt) => Some(halt),
        ControlFlow::Continue(()) => None,
    }
}

/// Owns a working grid and tracer and walks part of the candidate tree.
struct Worker<'a> {
    request: &'a SearchRequest,
    kinds: &'a [(BlockKind, usize)],
    counters: &'a Counters,
    max_candidates: Option<u64>,
    grid: Grid,
    tracer: BeamTracer,
    taken: Vec<bool>,
}

impl<'a> Worker<'a> {
    fn new(
        request: &'a SearchRequest,
        kinds: &'a [(BlockKind, usize)],
        counters: &'a Counters,
        config: SearchConfig,
    ) -> Self {
        Self {
            request,
            kinds,
            counters,
            max_candidates: config.max_candidates,
            grid: request.grid.clone(),
            tracer: BeamTracer::with_limits(config.trace_limits),
            taken: vec![false; request.open_cells.len()],
        }
    }

    /// Places the first kind on the provided open-cell indices and walks the
    /// remaining kinds.
    fn explore_root(&mut self, root: &[usize]) -> ControlFlow<Halt> {
        let (kind, _) = self.kinds[0];
        self.place_all(root, kind);
        let flow = self.place_kind(1);
        self.remove_all(root);
        flow
    }

    fn place_kind(&mut self, level: usize) -> ControlFlow<Halt> {
        let Some(&(kind, count)) = self.kinds.get(level) else {
            return self.evaluate();
        };

        let available: Vec<usize> = (0..self.taken.len())
            .filter(|&index| !self.taken[index])
            .collect();
        let mut walk = Subsets::new(available.len(), count);
        let mut chosen = Vec::with_capacity(count);
        while let Some(subset) = walk.advance() {
            chosen.clear();
            chosen.extend(subset.iter().map(|&slot| available[slot]));

            self.place_all(&chosen, kind);
            let flow = self.place_kind(level + 1);
            self.remove_all(&chosen);
            flow?;
        }
        ControlFlow::Continue(())
    }

    fn place_all(&mut self, indices: &[usize], kind: BlockKind) {
        for &index in indices {
            let cell = self.request.open_cells[index];
            self.grid
                .place(cell, Block::free(kind))
                .expect("search only proposes open cells");
            self.taken[index] = true;
        }
    }

    fn remove_all(&mut self, indices: &[usize]) {
        for &index in indices {
            let cell = self.request.open_cells[index];
            let _ = self
                .grid
                .remove(cell)
                .expect("search only removes the blocks it placed");
            self.taken[index] = false;
        }
    }

    fn evaluate(&mut self) -> ControlFlow<Halt> {
        let previous = self.counters.candidates.fetch_add(1, Ordering::Relaxed);
        if self.max_candidates.is_some_and(|limit| previous >= limit) {
            return ControlFlow::Break(Halt::Abandoned);
        }

        let trace = self.tracer.trace(&self.grid, &self.request.lasers);
        if !trace.terminated() {
            let _ = self.counters.non_terminating.fetch_add(1, Ordering::Relaxed);
            return ControlFlow::Continue(());
        }
        if !trace.covers(&self.request.targets) {
            return ControlFlow::Continue(());
        }

        ControlFlow::Break(Halt::Found(Solution {
            grid: self.grid.clone(),
            placements: self.grid.placements(),
            trace,
        }))
    }
}

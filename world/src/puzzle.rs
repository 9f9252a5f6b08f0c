use std::collections::BTreeSet;

use lazor_core::{BlockPool, CellCoord, LatticePoint, Laser};
use thiserror::Error;

use crate::Grid;

/// Reasons a puzzle model is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// The grid handed to the puzzle already holds a free block.
    #[error("grid cell {0} holds a free block; puzzles start with fixed blocks only")]
    FreeBlockOnGrid(CellCoord),
    /// A target point lies outside the grid's lattice.
    #[error("target {0} lies outside the grid lattice")]
    TargetOutsideLattice(LatticePoint),
}

/// Fully populated puzzle: fixed grid, free block pool, lasers and targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Puzzle {
    grid: Grid,
    pool: BlockPool,
    lasers: Vec<Laser>,
    targets: BTreeSet<LatticePoint>,
}

impl Puzzle {
    /// Assembles a puzzle, validating that the grid only holds fixed blocks
    /// and that every target lies on the lattice.
    ///
    /// Lasers are not validated: a laser that starts off the lattice simply
    /// contributes an empty path.
    pub fn new(
        grid: Grid,
        pool: BlockPool,
        lasers: Vec<Laser>,
        targets: impl IntoIterator<Item = LatticePoint>,
    ) -> Result<Self, PuzzleError> {
        if let Some(placement) = grid.placements().first() {
            return Err(PuzzleError::FreeBlockOnGrid(placement.cell));
        }

        let targets: BTreeSet<LatticePoint> = targets.into_iter().collect();
        if let Some(outside) = targets.iter().find(|point| !grid.contains_point(**point)) {
            return Err(PuzzleError::TargetOutsideLattice(*outside));
        }

        Ok(Self {
            grid,
            pool,
            lasers,
            targets,
        })
    }

    /// Grid holding the puzzle's fixed blocks.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Free blocks the solver must place.
    #[must_use]
    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Laser sources in declaration order.
    #[must_use]
    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    /// Points every solution must illuminate.
    #[must_use]
    pub fn targets(&self) -> &BTreeSet<LatticePoint> {
        &self.targets
    }

    /// Cells available to free blocks, in row-major order.
    #[must_use]
    pub fn open_cells(&self) -> Vec<CellCoord> {
        self.grid.open_cells()
    }
}

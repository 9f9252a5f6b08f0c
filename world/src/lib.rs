#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state and puzzle model for the Lazor solver.
//!
//! The [`Grid`] is the only mutable surface in the solver. It is populated
//! with fixed blocks when a puzzle is loaded and then mutated exclusively by
//! the placement search, which places and removes free blocks between beam
//! traces. A trace only ever reads it.

mod puzzle;

pub use puzzle::{Puzzle, PuzzleError};

use lazor_core::{
    Block, CellCoord, LatticePoint, Placement, PlacementError, RemovalError,
};
use thiserror::Error;

/// Contents of a single block cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellSlot {
    /// The cell accepts a block but currently holds none.
    Open,
    /// The puzzle forbids blocks in this cell; beams pass through freely.
    Unavailable,
    /// The cell holds a block.
    Occupied(Block),
}

/// Reasons a grid cannot be created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// One of the dimensions was zero.
    #[error("grid dimensions {columns}x{rows} leave no cells")]
    EmptyGrid {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// The cell count does not fit in memory addressing.
    #[error("grid dimensions {columns}x{rows} are too large")]
    TooLarge {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
}

/// Dense, row-major grid of block cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    slots: Vec<CellSlot>,
}

impl Grid {
    /// Creates a grid of open cells with the provided dimensions.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyGrid { columns, rows });
        }
        let capacity = u64::from(columns) * u64::from(rows);
        let capacity =
            usize::try_from(capacity).map_err(|_| GridError::TooLarge { columns, rows })?;
        Ok(Self {
            columns,
            rows,
            slots: vec![CellSlot::Open; capacity],
        })
    }

    /// Number of block-cell columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of block-cell rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width and height of the point lattice laid over the grid.
    #[must_use]
    pub fn lattice_size(&self) -> (i64, i64) {
        (
            i64::from(self.columns) * 2 + 1,
            i64::from(self.rows) * 2 + 1,
        )
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the lattice point lies on the grid's lattice.
    #[must_use]
    pub fn contains_point(&self, point: LatticePoint) -> bool {
        let (width, height) = self.lattice_size();
        (0..width).contains(&point.x()) && (0..height).contains(&point.y())
    }

    /// Contents of the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn slot(&self, cell: CellCoord) -> Option<CellSlot> {
        self.index(cell).map(|index| self.slots[index])
    }

    /// Block stored in the provided cell, if any.
    #[must_use]
    pub fn block_at(&self, cell: CellCoord) -> Option<Block> {
        match self.slot(cell)? {
            CellSlot::Occupied(block) => Some(block),
            CellSlot::Open | CellSlot::Unavailable => None,
        }
    }

    /// Block whose cell is centred on the provided lattice point, if any.
    #[must_use]
    pub fn block_at_point(&self, point: LatticePoint) -> Option<Block> {
        self.block_at(point.cell()?)
    }

    /// Stores a block in an open cell.
    pub fn place(&mut self, cell: CellCoord, block: Block) -> Result<(), PlacementError> {
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        match self.slots[index] {
            CellSlot::Open => {
                self.slots[index] = CellSlot::Occupied(block);
                Ok(())
            }
            CellSlot::Unavailable => Err(PlacementError::Unavailable),
            CellSlot::Occupied(_) => Err(PlacementError::Occupied),
        }
    }

    /// Removes a free block, returning it. Fixed blocks never move.
    pub fn remove(&mut self, cell: CellCoord) -> Result<Block, RemovalError> {
        let index = self.index(cell).ok_or(RemovalError::OutOfBounds)?;
        match self.slots[index] {
            CellSlot::Occupied(block) if block.is_fixed() => Err(RemovalError::Fixed),
            CellSlot::Occupied(block) => {
                self.slots[index] = CellSlot::Open;
                Ok(block)
            }
            CellSlot::Open | CellSlot::Unavailable => Err(RemovalError::Vacant),
        }
    }

    /// Forbids blocks in the provided cell.
    pub fn mark_unavailable(&mut self, cell: CellCoord) -> Result<(), PlacementError> {
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        match self.slots[index] {
            CellSlot::Open | CellSlot::Unavailable => {
                self.slots[index] = CellSlot::Unavailable;
                Ok(())
            }
            CellSlot::Occupied(_) => Err(PlacementError::Occupied),
        }
    }

    /// Cells that are not unavailable and hold no fixed block, in row-major
    /// order.
    ///
    /// Cells currently holding a free block are included: free blocks only
    /// sit on the grid for the duration of a trial.
    #[must_use]
    pub fn open_cells(&self) -> Vec<CellCoord> {
        self.cells()
            .filter_map(|(cell, slot)| match slot {
                CellSlot::Open => Some(cell),
                CellSlot::Occupied(block) if !block.is_fixed() => Some(cell),
                CellSlot::Occupied(_) | CellSlot::Unavailable => None,
            })
            .collect()
    }

    /// Free blocks currently on the grid, in row-major order.
    #[must_use]
    pub fn placements(&self) -> Vec<Placement> {
        self.cells()
            .filter_map(|(cell, slot)| match slot {
                CellSlot::Occupied(block) if !block.is_fixed() => Some(Placement {
                    cell,
                    kind: block.kind(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Iterator over every cell and its contents in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, CellSlot)> + '_ {
        let columns = self.columns;
        self.slots.iter().enumerate().map(move |(index, slot)| {
            let index = index as u64;
            let column = (index % u64::from(columns)) as u32;
            let row = (index / u64::from(columns)) as u32;
            (CellCoord::new(column, row), *slot)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

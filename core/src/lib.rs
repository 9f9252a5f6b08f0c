#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lazor solver.
//!
//! Everything in the solver is expressed on a single lattice. A grid of
//! `W x H` block cells maps to a `(2W + 1) x (2H + 1)` lattice of points:
//! block cell `(column, row)` is centred on lattice point
//! `(2 * column + 1, 2 * row + 1)` and lasers travel between points along
//! diagonal unit vectors. The world crate owns the grid, systems trace beams
//! and search placements, and adapters parse and present puzzles; all of them
//! speak in the types defined here.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of blocks that can occupy a grid cell.
///
/// The declaration order is significant: the placement search enumerates
/// free blocks kind by kind in this order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BlockKind {
    /// Mirrors the beam off the crossed block edge.
    Reflect,
    /// Absorbs the beam.
    Opaque,
    /// Lets the beam through while also emitting a reflected beam.
    Refract,
    /// Occupies a cell without interacting with beams.
    Empty,
}

impl BlockKind {
    /// Every block kind in enumeration order.
    pub const ALL: [BlockKind; 4] = [Self::Reflect, Self::Opaque, Self::Refract, Self::Empty];

    /// Symbol used by the `.bff` puzzle notation.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Reflect => 'A',
            Self::Opaque => 'B',
            Self::Refract => 'C',
            Self::Empty => 'o',
        }
    }

    /// Resolves a `.bff` symbol into a block kind.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'A' => Some(Self::Reflect),
            'B' => Some(Self::Opaque),
            'C' => Some(Self::Refract),
            'o' => Some(Self::Empty),
            _ => None,
        }
    }

    /// Reports whether a beam crossing this block changes course.
    #[must_use]
    pub const fn interacts_with_beams(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reflect => "reflect",
            Self::Opaque => "opaque",
            Self::Refract => "refract",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// Typed obstacle stored in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    kind: BlockKind,
    fixed: bool,
}

impl Block {
    /// Creates a block whose position is fixed by the puzzle.
    #[must_use]
    pub const fn fixed(kind: BlockKind) -> Self {
        Self { kind, fixed: true }
    }

    /// Creates a block the solver is free to move.
    #[must_use]
    pub const fn free(kind: BlockKind) -> Self {
        Self { kind, fixed: false }
    }

    /// Kind of the block.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Reports whether the puzzle pins the block to its cell.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }
}

/// Location of a single block cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new block cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Lattice point at the centre of the cell.
    #[must_use]
    pub fn center(self) -> LatticePoint {
        LatticePoint::new(
            i64::from(self.column) * 2 + 1,
            i64::from(self.row) * 2 + 1,
        )
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Point on the fine lattice that beams travel across.
///
/// Coordinates are signed so that a beam stepping off the lattice edge is
/// still representable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LatticePoint {
    x: i64,
    y: i64,
}

impl LatticePoint {
    /// Creates a lattice point from raw coordinates.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate, growing rightwards.
    #[must_use]
    pub const fn x(&self) -> i64 {
        self.x
    }

    /// Vertical coordinate, growing downwards.
    #[must_use]
    pub const fn y(&self) -> i64 {
        self.y
    }

    /// Point reached after a single step in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        Self {
            x: self.x + direction.dx as i64,
            y: self.y + direction.dy as i64,
        }
    }

    /// Block cell centred on this point, if the point is a cell centre.
    ///
    /// Only odd/odd points with non-negative coordinates are cell centres.
    /// Bounds against a concrete grid are the grid's concern.
    #[must_use]
    pub fn cell(self) -> Option<CellCoord> {
        if self.x < 0 || self.y < 0 || self.x % 2 == 0 || self.y % 2 == 0 {
            return None;
        }
        let column = u32::try_from((self.x - 1) / 2).ok()?;
        let row = u32::try_from((self.y - 1) / 2).ok()?;
        Some(CellCoord::new(column, row))
    }
}

impl fmt::Display for LatticePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Diagonal unit vector along which a beam travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(i8, i8)", into = "(i8, i8)")]
pub struct Direction {
    dx: i8,
    dy: i8,
}

impl Direction {
    /// Travel toward increasing `x` and decreasing `y`.
    pub const UP_RIGHT: Direction = Direction { dx: 1, dy: -1 };
    /// Travel toward decreasing `x` and decreasing `y`.
    pub const UP_LEFT: Direction = Direction { dx: -1, dy: -1 };
    /// Travel toward increasing `x` and increasing `y`.
    pub const DOWN_RIGHT: Direction = Direction { dx: 1, dy: 1 };
    /// Travel toward decreasing `x` and increasing `y`.
    pub const DOWN_LEFT: Direction = Direction { dx: -1, dy: 1 };

    /// Creates a direction from its components, each of which must be `+1`
    /// or `-1`.
    pub fn new(dx: i64, dy: i64) -> Result<Self, DirectionError> {
        match (dx, dy) {
            (1, 1) => Ok(Self::DOWN_RIGHT),
            (1, -1) => Ok(Self::UP_RIGHT),
            (-1, 1) => Ok(Self::DOWN_LEFT),
            (-1, -1) => Ok(Self::UP_LEFT),
            _ => Err(DirectionError { dx, dy }),
        }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn dx(&self) -> i8 {
        self.dx
    }

    /// Vertical component.
    #[must_use]
    pub const fn dy(&self) -> i8 {
        self.dy
    }

    /// Direction mirrored off a vertical edge.
    #[must_use]
    pub const fn flip_x(self) -> Self {
        Self {
            dx: -self.dx,
            dy: self.dy,
        }
    }

    /// Direction mirrored off a horizontal edge.
    #[must_use]
    pub const fn flip_y(self) -> Self {
        Self {
            dx: self.dx,
            dy: -self.dy,
        }
    }
}

impl TryFrom<(i8, i8)> for Direction {
    type Error = DirectionError;

    fn try_from((dx, dy): (i8, i8)) -> Result<Self, Self::Error> {
        Self::new(i64::from(dx), i64::from(dy))
    }
}

impl From<Direction> for (i8, i8) {
    fn from(direction: Direction) -> Self {
        (direction.dx, direction.dy)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}

/// Rejected direction components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("laser direction ({dx}, {dy}) is not a diagonal unit vector")]
pub struct DirectionError {
    /// Horizontal component that was supplied.
    pub dx: i64,
    /// Vertical component that was supplied.
    pub dy: i64,
}

/// Laser source emitting a single beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Laser {
    origin: LatticePoint,
    direction: Direction,
}

impl Laser {
    /// Creates a laser located at `origin` and aimed along `direction`.
    #[must_use]
    pub const fn new(origin: LatticePoint, direction: Direction) -> Self {
        Self { origin, direction }
    }

    /// Lattice point the beam starts from.
    #[must_use]
    pub const fn origin(&self) -> LatticePoint {
        self.origin
    }

    /// Initial direction of the beam.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Multiset of free block kinds awaiting placement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPool {
    counts: BTreeMap<BlockKind, usize>,
}

impl BlockPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of free blocks of the provided kind.
    pub fn set(&mut self, kind: BlockKind, count: usize) {
        if count == 0 {
            let _ = self.counts.remove(&kind);
        } else {
            let _ = self.counts.insert(kind, count);
        }
    }

    /// Adds `count` free blocks of the provided kind.
    pub fn add(&mut self, kind: BlockKind, count: usize) {
        let total = self.count(kind).saturating_add(count);
        self.set(kind, total);
    }

    /// Number of free blocks of the provided kind.
    #[must_use]
    pub fn count(&self, kind: BlockKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of free blocks in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.values().sum()
    }

    /// Reports whether the pool holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Non-zero kinds with their counts, in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockKind, usize)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl FromIterator<BlockKind> for BlockPool {
    fn from_iter<T: IntoIterator<Item = BlockKind>>(iter: T) -> Self {
        let mut pool = Self::new();
        for kind in iter {
            pool.add(kind, 1);
        }
        pool
    }
}

/// Free block assigned to a cell by a solution.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Placement {
    /// Cell that received the block.
    pub cell: CellCoord,
    /// Kind of block placed in the cell.
    pub kind: BlockKind,
}

/// Reasons a block placement may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The puzzle forbids blocks in the requested cell.
    #[error("cell does not accept blocks")]
    Unavailable,
    /// The requested cell already holds a block.
    #[error("cell already holds a block")]
    Occupied,
}

/// Reasons a block removal may be rejected by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell holds no block.
    #[error("cell holds no block")]
    Vacant,
    /// The block in the requested cell is fixed by the puzzle.
    #[error("block is fixed by the puzzle")]
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::{
        BlockKind, BlockPool, CellCoord, Direction, LatticePoint, Placement, PlacementError,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_centers_sit_on_odd_lattice_points() {
        assert_eq!(CellCoord::new(0, 0).center(), LatticePoint::new(1, 1));
        assert_eq!(CellCoord::new(2, 1).center(), LatticePoint::new(5, 3));
    }

    #[test]
    fn only_odd_points_map_back_to_cells() {
        assert_eq!(LatticePoint::new(5, 3).cell(), Some(CellCoord::new(2, 1)));
        assert_eq!(LatticePoint::new(4, 3).cell(), None);
        assert_eq!(LatticePoint::new(5, 2).cell(), None);
        assert_eq!(LatticePoint::new(-1, 3).cell(), None);
    }

    #[test]
    fn direction_rejects_non_diagonal_components() {
        assert!(Direction::new(1, -1).is_ok());
        assert!(Direction::new(0, 1).is_err());
        assert!(Direction::new(2, 2).is_err());
    }

    #[test]
    fn flips_mirror_a_single_component() {
        assert_eq!(Direction::DOWN_RIGHT.flip_x(), Direction::DOWN_LEFT);
        assert_eq!(Direction::DOWN_RIGHT.flip_y(), Direction::UP_RIGHT);
        assert_eq!(Direction::UP_LEFT.flip_x().flip_y(), Direction::DOWN_RIGHT);
    }

    #[test]
    fn step_moves_one_unit_diagonally() {
        let point = LatticePoint::new(2, 7).step(Direction::UP_RIGHT);
        assert_eq!(point, LatticePoint::new(3, 6));
    }

    #[test]
    fn block_symbols_are_reversible() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_symbol(kind.symbol()), Some(kind));
        }
        assert_eq!(BlockKind::from_symbol('x'), None);
    }

    #[test]
    fn pool_counts_collapse_into_a_multiset() {
        let pool: BlockPool = [BlockKind::Refract, BlockKind::Reflect, BlockKind::Reflect]
            .into_iter()
            .collect();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.count(BlockKind::Reflect), 2);
        assert_eq!(
            pool.iter().collect::<Vec<_>>(),
            vec![(BlockKind::Reflect, 2), (BlockKind::Refract, 1)]
        );
    }

    #[test]
    fn pool_drops_kinds_set_to_zero() {
        let mut pool = BlockPool::new();
        pool.set(BlockKind::Opaque, 2);
        pool.set(BlockKind::Opaque, 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn placement_round_trips_through_bincode() {
        assert_round_trip(&Placement {
            cell: CellCoord::new(3, 1),
            kind: BlockKind::Refract,
        });
    }

    #[test]
    fn direction_round_trips_through_bincode() {
        assert_round_trip(&Direction::UP_LEFT);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Occupied);
    }

    #[test]
    fn invalid_direction_fails_to_deserialize() {
        let bytes = bincode::serialize(&(0_i8, 1_i8)).expect("serialize");
        assert!(bincode::deserialize::<Direction>(&bytes).is_err());
    }
}

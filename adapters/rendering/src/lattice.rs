use std::{collections::HashSet, fmt};

use lazor_core::{CellCoord, LatticePoint};
use lazor_world::{CellSlot, Grid, Puzzle};

/// Glyph marking a laser origin.
pub const ORIGIN_GLYPH: char = 'S';
/// Glyph marking a target point.
pub const TARGET_GLYPH: char = 'T';
/// Glyph marking a point crossed by a beam.
pub const BEAM_GLYPH: char = 'L';
/// Glyph marking the centre of an open cell.
pub const OPEN_GLYPH: char = 'o';
/// Glyph marking the centre of a cell that refuses blocks.
pub const UNAVAILABLE_GLYPH: char = 'x';
/// Glyph marking any other lattice point.
pub const EMPTY_GLYPH: char = '.';

/// Character map covering every point of a puzzle lattice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatticeMap {
    width: usize,
    glyphs: Vec<char>,
}

impl LatticeMap {
    /// Number of lattice columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of lattice rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.glyphs.len() / self.width.max(1)
    }

    /// Glyph drawn at the provided point, or `None` off the lattice.
    #[must_use]
    pub fn glyph(&self, point: LatticePoint) -> Option<char> {
        let x = usize::try_from(point.x()).ok()?;
        let y = usize::try_from(point.y()).ok()?;
        if x >= self.width {
            return None;
        }
        self.glyphs.get(y * self.width + x).copied()
    }

    /// Rebuilds a map from rows produced by [`LatticeMap::rows`].
    pub(crate) fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let mut width = 0;
        let mut glyphs = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let before = glyphs.len();
            glyphs.extend(row.as_ref().chars().filter(|glyph| !glyph.is_whitespace()));
            if index == 0 {
                width = glyphs.len();
            }
            // Ragged rows are padded or cut to the first row's width.
            glyphs.resize(before + width, EMPTY_GLYPH);
        }
        Self { width, glyphs }
    }

    /// Rows of glyphs separated by single spaces.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.glyphs.chunks(self.width.max(1)).map(|row| {
            let mut line = String::with_capacity(row.len() * 2);
            for (index, glyph) in row.iter().enumerate() {
                if index > 0 {
                    line.push(' ');
                }
                line.push(*glyph);
            }
            line
        })
    }
}

impl fmt::Display for LatticeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Draws the puzzle lattice.
///
/// `grid` replaces the puzzle's own grid when provided, which lets callers
/// show a solved arrangement. Beam points are drawn from `visited`. Origins
/// win over targets, targets over blocks, and blocks over beams.
#[must_use]
pub fn render_lattice(
    puzzle: &Puzzle,
    grid: Option<&Grid>,
    visited: &HashSet<LatticePoint>,
) -> LatticeMap {
    let grid = grid.unwrap_or_else(|| puzzle.grid());
    let (width, height) = grid.lattice_size();
    let width = usize::try_from(width).unwrap_or(0);
    let height = usize::try_from(height).unwrap_or(0);
    let origins: HashSet<LatticePoint> =
        puzzle.lasers().iter().map(|laser| laser.origin()).collect();

    let mut glyphs = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let point = LatticePoint::new(x as i64, y as i64);
            glyphs.push(glyph_at(grid, point, &origins, puzzle, visited));
        }
    }
    LatticeMap { width, glyphs }
}

fn glyph_at(
    grid: &Grid,
    point: LatticePoint,
    origins: &HashSet<LatticePoint>,
    puzzle: &Puzzle,
    visited: &HashSet<LatticePoint>,
) -> char {
    if origins.contains(&point) {
        return ORIGIN_GLYPH;
    }
    if puzzle.targets().contains(&point) {
        return TARGET_GLYPH;
    }
    let slot = point.cell().and_then(|cell| grid.slot(cell));
    if let Some(CellSlot::Occupied(block)) = slot {
        return block.kind().symbol();
    }
    if visited.contains(&point) {
        return BEAM_GLYPH;
    }
    match slot {
        Some(CellSlot::Open) => OPEN_GLYPH,
        Some(CellSlot::Unavailable) => UNAVAILABLE_GLYPH,
        Some(CellSlot::Occupied(_)) | None => EMPTY_GLYPH,
    }
}

/// Draws the block cells in `.bff` grid notation, one row per line.
#[must_use]
pub fn render_cells(grid: &Grid) -> Vec<String> {
    (0..grid.rows())
        .map(|row| {
            (0..grid.columns())
                .map(|column| match grid.slot(CellCoord::new(column, row)) {
                    Some(CellSlot::Occupied(block)) => block.kind().symbol(),
                    Some(CellSlot::Unavailable) => UNAVAILABLE_GLYPH,
                    Some(CellSlot::Open) | None => OPEN_GLYPH,
                })
                .map(String::from)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

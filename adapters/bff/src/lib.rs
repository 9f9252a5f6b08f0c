#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reader for the `.bff` puzzle notation.
//!
//! A `.bff` file is line oriented. Blank lines and lines starting with `#`
//! are ignored. The block grid sits between `GRID START` and `GRID STOP`, one
//! row per line, using `o` for open cells, `x` for cells that refuse blocks and
//! `A`, `B`, `C` for fixed reflect, opaque and refract blocks. The remaining
//! directives declare free block counts (`A 2`), lasers (`L x y vx vy`) and
//! target points (`P x y`), all in lattice coordinates.

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use lazor_core::{
    Block, BlockKind, BlockPool, CellCoord, Direction, DirectionError, LatticePoint, Laser,
    PlacementError,
};
use lazor_world::{Grid, GridError, Puzzle, PuzzleError};
use thiserror::Error;

const GRID_START: &str = "GRID START";
const GRID_STOP: &str = "GRID STOP";

/// Problems found on a single line of a `.bff` document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LineError {
    /// The line starts with a directive the notation does not define.
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
    /// The directive carries the wrong number of fields.
    #[error("'{directive}' expects {expected} fields, found {found}")]
    FieldCount {
        /// Directive being parsed.
        directive: String,
        /// Number of whitespace separated fields the directive takes.
        expected: usize,
        /// Number of fields present on the line.
        found: usize,
    },
    /// A numeric field could not be parsed.
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    /// A grid row holds a symbol the notation does not define.
    #[error("unknown grid symbol '{0}'")]
    UnknownSymbol(char),
    /// A grid row is wider or narrower than the first row.
    #[error("grid row holds {found} cells, expected {expected}")]
    RaggedRow {
        /// Width of the first grid row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// `GRID START` appeared inside an open grid section.
    #[error("grid section is already open")]
    NestedGrid,
    /// `GRID STOP` appeared outside a grid section.
    #[error("grid section was never opened")]
    StrayGridStop,
    /// A second grid section was declared.
    #[error("puzzle declares more than one grid")]
    DuplicateGrid,
    /// The laser direction is not a diagonal unit vector.
    #[error(transparent)]
    Direction(#[from] DirectionError),
}

/// Reasons a `.bff` document cannot be turned into a puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A specific line is malformed.
    #[error("line {line}: {kind}")]
    Line {
        /// One-based line number.
        line: usize,
        /// What is wrong with the line.
        kind: LineError,
    },
    /// The grid section opened on the provided line is never closed.
    #[error("grid section opened on line {0} is never closed")]
    UnterminatedGrid(usize),
    /// The document holds no grid rows.
    #[error("puzzle declares no grid")]
    MissingGrid,
    /// The grid dimensions are unusable.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A fixed block could not be laid out on the grid.
    #[error("fixed block could not be placed: {0}")]
    Layout(#[from] PlacementError),
    /// The assembled puzzle failed validation.
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}

impl ParseError {
    /// Line the error points at, when it concerns a single line.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Line { line, .. } => Some(*line),
            Self::UnterminatedGrid(line) => Some(*line),
            Self::MissingGrid | Self::Grid(_) | Self::Layout(_) | Self::Puzzle(_) => None,
        }
    }
}

/// Reasons a `.bff` file cannot be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file contents are not a valid puzzle.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },
}

/// Reads and parses the `.bff` file at the provided path.
pub fn load_puzzle(path: impl AsRef<Path>) -> Result<Puzzle, LoadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let puzzle = parse_puzzle(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "loaded {}: {}x{} grid, {} free blocks, {} lasers, {} targets",
        path.display(),
        puzzle.grid().columns(),
        puzzle.grid().rows(),
        puzzle.pool().len(),
        puzzle.lasers().len(),
        puzzle.targets().len()
    );
    Ok(puzzle)
}

/// Parses a `.bff` document.
pub fn parse_puzzle(source: &str) -> Result<Puzzle, ParseError> {
    let mut draft = Draft::default();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        draft
            .feed(raw.trim(), line)
            .map_err(|kind| ParseError::Line { line, kind })?;
    }
    draft.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Symbol {
    Open,
    Unavailable,
    Fixed(BlockKind),
}

impl Symbol {
    fn parse(symbol: char) -> Result<Self, LineError> {
        match symbol {
            'o' => Ok(Self::Open),
            'x' => Ok(Self::Unavailable),
            'A' | 'B' | 'C' => BlockKind::from_symbol(symbol)
                .map(Self::Fixed)
                .ok_or(LineError::UnknownSymbol(symbol)),
            other => Err(LineError::UnknownSymbol(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Section {
    #[default]
    Preamble,
    Grid {
        opened: usize,
    },
    Closed,
}

#[derive(Debug, Default)]
struct Draft {
    section: Section,
    rows: Vec<Vec<Symbol>>,
    pool: BlockPool,
    lasers: Vec<Laser>,
    targets: Vec<LatticePoint>,
}

impl Draft {
    fn feed(&mut self, line: &str, number: usize) -> Result<(), LineError> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        match (self.section, line) {
            (Section::Preamble, GRID_START) => {
                self.section = Section::Grid { opened: number };
                Ok(())
            }
            (Section::Grid { .. }, GRID_START) => Err(LineError::NestedGrid),
            (Section::Closed, GRID_START) => Err(LineError::DuplicateGrid),
            (Section::Grid { .. }, GRID_STOP) => {
                self.section = Section::Closed;
                Ok(())
            }
            (_, GRID_STOP) => Err(LineError::StrayGridStop),
            (Section::Grid { .. }, row) => self.feed_row(row),
            (_, directive) => self.feed_directive(directive),
        }
    }

    fn feed_row(&mut self, row: &str) -> Result<(), LineError> {
        let symbols = row
            .chars()
            .filter(|symbol| !symbol.is_whitespace())
            .map(Symbol::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = self.rows.first() {
            if first.len() != symbols.len() {
                return Err(LineError::RaggedRow {
                    expected: first.len(),
                    found: symbols.len(),
                });
            }
        }
        self.rows.push(symbols);
        Ok(())
    }

    fn feed_directive(&mut self, line: &str) -> Result<(), LineError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let directive = fields[0];
        match directive {
            "A" | "B" | "C" => {
                let [_, count] = expect_fields::<2>(&fields)?;
                let kind = directive
                    .chars()
                    .next()
                    .and_then(BlockKind::from_symbol)
                    .ok_or_else(|| LineError::UnknownDirective(directive.to_owned()))?;
                self.pool.set(kind, number(count)?);
            }
            "L" => {
                let [_, x, y, dx, dy] = expect_fields::<5>(&fields)?;
                let direction = Direction::new(number(dx)?, number(dy)?)?;
                self.lasers.push(Laser::new(
                    LatticePoint::new(number(x)?, number(y)?),
                    direction,
                ));
            }
            "P" => {
                let [_, x, y] = expect_fields::<3>(&fields)?;
                self.targets
                    .push(LatticePoint::new(number(x)?, number(y)?));
            }
            other => return Err(LineError::UnknownDirective(other.to_owned())),
        }
        Ok(())
    }

    fn finish(self) -> Result<Puzzle, ParseError> {
        if let Section::Grid { opened } = self.section {
            return Err(ParseError::UnterminatedGrid(opened));
        }
        let Some(first) = self.rows.first() else {
            return Err(ParseError::MissingGrid);
        };
        if first.is_empty() {
            return Err(ParseError::MissingGrid);
        }

        let columns = u32::try_from(first.len()).unwrap_or(u32::MAX);
        let rows = u32::try_from(self.rows.len()).unwrap_or(u32::MAX);
        let mut grid = Grid::new(columns, rows)?;
        for (cell, symbol) in cells(&self.rows) {
            match symbol {
                Symbol::Open => {}
                Symbol::Unavailable => grid.mark_unavailable(cell)?,
                Symbol::Fixed(kind) => grid.place(cell, Block::fixed(kind))?,
            }
        }

        Ok(Puzzle::new(grid, self.pool, self.lasers, self.targets)?)
    }
}

fn cells(rows: &[Vec<Symbol>]) -> impl Iterator<Item = (CellCoord, Symbol)> + '_ {
    (0u32..).zip(rows).flat_map(|(row, symbols)| {
        (0u32..)
            .zip(symbols)
            .map(move |(column, symbol)| (CellCoord::new(column, row), *symbol))
    })
}

fn expect_fields<'a, const N: usize>(fields: &[&'a str]) -> Result<[&'a str; N], LineError> {
    <[&str; N]>::try_from(fields).map_err(|_| LineError::FieldCount {
        directive: fields.first().copied().unwrap_or_default().to_owned(),
        expected: N,
        found: fields.len(),
    })
}

fn number<T: FromStr>(field: &str) -> Result<T, LineError> {
    field
        .parse()
        .map_err(|_| LineError::InvalidNumber(field.to_owned()))
}

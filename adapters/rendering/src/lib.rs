#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for Lazor solver adapters.
//!
//! Adapters turn a finished search into a [`SolutionReport`] and hand it to a
//! [`ReportSink`], which decides where and in which [`ReportFormat`] it lands.

mod lattice;
mod raster;

pub use lattice::{
    render_cells, render_lattice, LatticeMap, BEAM_GLYPH, EMPTY_GLYPH, OPEN_GLYPH,
    ORIGIN_GLYPH, TARGET_GLYPH, UNAVAILABLE_GLYPH,
};
pub use raster::{encode_png, render_image, POINT_PIXELS};

use std::{collections::HashSet, fmt::Write as _, io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use lazor_core::{LatticePoint, Laser, Placement};
use lazor_system_beam_tracer::{BeamEnd, BeamPath};
use lazor_system_placement_search::{SearchOutcome, SearchReport};
use lazor_world::Puzzle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a search ended, as presented to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    /// An arrangement lit every target.
    Found,
    /// No arrangement lit every target.
    Exhausted,
    /// The candidate cutoff stopped the search.
    Abandoned,
}

impl ReportOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Exhausted => "exhausted",
            Self::Abandoned => "abandoned (candidate limit reached)",
        }
    }
}

/// Why a reported beam stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamStop {
    /// Left the lattice.
    Exited,
    /// Hit an opaque block.
    Absorbed,
    /// Joined a path traced earlier.
    Merged,
    /// Never came to rest.
    NonTerminating,
}

impl From<BeamEnd> for BeamStop {
    fn from(end: BeamEnd) -> Self {
        match end {
            BeamEnd::Exited => Self::Exited,
            BeamEnd::Absorbed => Self::Absorbed,
            BeamEnd::Merged => Self::Merged,
            BeamEnd::NonTerminating => Self::NonTerminating,
        }
    }
}

/// Single beam of a solved puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamReport {
    /// Index of the laser the beam descends from.
    pub laser: usize,
    /// Index of the beam that spawned this one by refraction.
    pub parent: Option<usize>,
    /// Points in visit order.
    pub points: Vec<LatticePoint>,
    /// Why the beam stopped.
    pub stop: BeamStop,
}

impl From<&BeamPath> for BeamReport {
    fn from(path: &BeamPath) -> Self {
        Self {
            laser: path.source(),
            parent: path.parent(),
            points: path.points().to_vec(),
            stop: path.end().into(),
        }
    }
}

/// Work counters of a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Candidates traced.
    pub candidates_tried: u64,
    /// Candidates rejected because a beam never came to rest.
    pub non_terminating: u64,
    /// Wall-clock time spent searching, in seconds.
    pub elapsed_seconds: f64,
}

/// Presentation-ready summary of a solved (or unsolvable) puzzle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionReport {
    /// Name the puzzle is known by, usually its file stem.
    pub puzzle: String,
    /// How the search ended.
    pub outcome: ReportOutcome,
    /// Free blocks placed by the solution, in row-major order.
    pub placements: Vec<Placement>,
    /// Laser sources of the puzzle.
    pub lasers: Vec<Laser>,
    /// Beams of the solution in trace order.
    pub beams: Vec<BeamReport>,
    /// Work counters.
    pub stats: ReportStats,
    /// Block cells in `.bff` notation, solved arrangement included.
    pub cells: Vec<String>,
    /// Lattice drawing of the solution.
    pub lattice: Vec<String>,
}

impl SolutionReport {
    /// Summarises a finished search.
    #[must_use]
    pub fn new(
        puzzle_name: impl Into<String>,
        puzzle: &Puzzle,
        search: &SearchReport,
        elapsed: Duration,
    ) -> Self {
        let stats = ReportStats {
            candidates_tried: search.stats.candidates_tried,
            non_terminating: search.stats.non_terminating,
            elapsed_seconds: elapsed.as_secs_f64(),
        };

        let (outcome, solution) = match &search.outcome {
            SearchOutcome::Found(solution) => (ReportOutcome::Found, Some(solution)),
            SearchOutcome::Exhausted => (ReportOutcome::Exhausted, None),
            SearchOutcome::Abandoned => (ReportOutcome::Abandoned, None),
        };

        let (lattice, cells, placements, beams) = match solution {
            Some(solution) => (
                render_lattice(puzzle, Some(solution.grid()), solution.trace().visited()),
                render_cells(solution.grid()),
                solution.placements().to_vec(),
                solution.trace().beams().iter().map(BeamReport::from).collect::<Vec<_>>(),
            ),
            None => (
                render_lattice(puzzle, None, &HashSet::new()),
                render_cells(puzzle.grid()),
                Vec::new(),
                Vec::new(),
            ),
        };

        Self {
            puzzle: puzzle_name.into(),
            outcome,
            placements,
            lasers: puzzle.lasers().to_vec(),
            beams,
            stats,
            cells,
            lattice: lattice.rows().collect(),
        }
    }

    /// Plain text rendering.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut text);
        text
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Puzzle: {}", self.puzzle)?;
        writeln!(out, "Outcome: {}", self.outcome.label())?;
        writeln!(
            out,
            "Candidates tried: {} ({} non-terminating)",
            self.stats.candidates_tried, self.stats.non_terminating
        )?;
        writeln!(out, "Elapsed: {:.3}s", self.stats.elapsed_seconds)?;

        writeln!(out)?;
        if self.placements.is_empty() {
            writeln!(out, "Blocks placed: none")?;
        } else {
            writeln!(out, "Blocks placed:")?;
            for placement in &self.placements {
                writeln!(out, "- {} at {}", placement.kind, placement.cell)?;
            }
        }

        writeln!(out, "Lasers:")?;
        for laser in &self.lasers {
            writeln!(
                out,
                "- start {} heading {}",
                laser.origin(),
                laser.direction()
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Cells:")?;
        for row in &self.cells {
            writeln!(out, "{row}")?;
        }

        writeln!(out)?;
        writeln!(out, "Lattice:")?;
        for row in &self.lattice {
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String, RenderingError> {
        serde_json::to_string_pretty(self).map_err(RenderingError::Json)
    }

    /// PNG drawing of the reported lattice.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderingError> {
        let image = render_image(&LatticeMap::from_rows(&self.lattice), &self.lasers)?;
        encode_png(&image)
    }
}

/// Output formats supported by report sinks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl ReportFormat {
    /// Renders the report in this format.
    pub fn render(self, report: &SolutionReport) -> Result<String, RenderingError> {
        match self {
            Self::Text => Ok(report.to_text()),
            Self::Json => report.to_json(),
        }
    }

    /// File extension conventionally used for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// Destination for solution reports.
pub trait ReportSink {
    /// Emits a single report.
    fn emit(&mut self, report: &SolutionReport) -> AnyResult<()>;
}

/// Sink that renders reports into any [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    format: ReportFormat,
}

impl<W: Write> WriterSink<W> {
    /// Creates a sink writing reports in the provided format.
    #[must_use]
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self { writer, format }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn emit(&mut self, report: &SolutionReport) -> AnyResult<()> {
        let mut rendered = self.format.render(report)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        self.writer
            .write_all(rendered.as_bytes())
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("failed to write report for {}", report.puzzle))
    }
}

/// Errors raised while rendering reports.
#[derive(Debug, Error)]
pub enum RenderingError {
    /// The report could not be serialised to JSON.
    #[error("failed to serialise report as JSON")]
    Json(#[source] serde_json::Error),
    /// The lattice is too large to draw.
    #[error("a {width}x{height} lattice is too large to draw")]
    Oversized {
        /// Lattice columns.
        width: usize,
        /// Lattice rows.
        height: usize,
    },
    /// The image could not be encoded.
    #[error("failed to encode image")]
    Image(#[from] image::ImageError),
}

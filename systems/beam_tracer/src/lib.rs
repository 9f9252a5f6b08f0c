#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that propagates laser beams across a grid snapshot.
//!
//! Beams are processed from a FIFO work-list seeded with one state per laser.
//! Each step looks one unit ahead: if the beam is about to cross the edge of
//! an occupied block cell, the block decides whether the beam is absorbed,
//! mirrored, or split in two. Every `(position, direction)` state is recorded
//! once per trace, which bounds the work and exposes closed reflective loops.

use std::collections::{HashMap, HashSet, VecDeque};

use lazor_core::{BlockKind, Direction, LatticePoint, Laser};
use lazor_world::Grid;

/// Reason a beam stopped propagating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BeamEnd {
    /// The next step would leave the lattice, or the beam started outside it.
    Exited,
    /// The beam struck an opaque block.
    Absorbed,
    /// The beam reached a state already traced by an earlier beam. Its path
    /// continues with the points that beam recorded from there on.
    Merged,
    /// The beam revisited one of its own states, or exhausted its step budget.
    NonTerminating,
}

/// Ordered path followed by a single beam.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeamPath {
    source: usize,
    parent: Option<usize>,
    points: Vec<LatticePoint>,
    end: BeamEnd,
}

impl BeamPath {
    /// Index of the laser the beam ultimately descends from.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Index of the beam whose refraction spawned this one, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Lattice points in visit order.
    #[must_use]
    pub fn points(&self) -> &[LatticePoint] {
        &self.points
    }

    /// Reason the beam stopped.
    #[must_use]
    pub const fn end(&self) -> BeamEnd {
        self.end
    }
}

/// Result of tracing every laser across a grid snapshot.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    beams: Vec<BeamPath>,
    visited: HashSet<LatticePoint>,
}

impl Trace {
    /// Beams in processing order: lasers first, then refraction spawns.
    #[must_use]
    pub fn beams(&self) -> &[BeamPath] {
        &self.beams
    }

    /// Union of the points visited by all beams.
    #[must_use]
    pub fn visited(&self) -> &HashSet<LatticePoint> {
        &self.visited
    }

    /// Reports whether any beam visited the provided point.
    #[must_use]
    pub fn is_visited(&self, point: LatticePoint) -> bool {
        self.visited.contains(&point)
    }

    /// Reports whether every provided point was visited.
    pub fn covers<'a>(&self, points: impl IntoIterator<Item = &'a LatticePoint>) -> bool {
        points.into_iter().all(|point| self.visited.contains(point))
    }

    /// Reports whether every beam came to rest.
    #[must_use]
    pub fn terminated(&self) -> bool {
        self.beams
            .iter()
            .all(|beam| beam.end != BeamEnd::NonTerminating)
    }

    /// Paths of the beams descending from the provided laser.
    pub fn beams_from(&self, source: usize) -> impl Iterator<Item = &BeamPath> + '_ {
        self.beams.iter().filter(move |beam| beam.source == source)
    }
}

/// Safety bounds applied while tracing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceLimits {
    /// Maximum number of steps a single beam may take. `None` derives the
    /// bound from the grid: four directions per lattice point, which no beam
    /// can exceed without revisiting a state.
    pub max_steps_per_beam: Option<usize>,
}

/// Beam tracing system that reuses its work-list and state table between
/// traces.
#[derive(Debug, Default)]
pub struct BeamTracer {
    limits: TraceLimits,
    queue: VecDeque<PendingBeam>,
    seen: HashMap<BeamState, Visit>,
}

impl BeamTracer {
    /// Creates a tracer with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer with explicit limits.
    #[must_use]
    pub fn with_limits(limits: TraceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Traces every laser across the provided grid snapshot.
    pub fn trace(&mut self, grid: &Grid, lasers: &[Laser]) -> Trace {
        self.queue.clear();
        self.seen.clear();

        for (source, laser) in lasers.iter().enumerate() {
            self.queue.push_back(PendingBeam {
                state: BeamState {
                    position: laser.origin(),
                    direction: laser.direction(),
                },
                source,
                parent: None,
            });
        }

        let step_budget = self
            .limits
            .max_steps_per_beam
            .unwrap_or_else(|| default_step_budget(grid));

        let mut trace = Trace::default();
        while let Some(pending) = self.queue.pop_front() {
            let index = trace.beams.len();
            let beam = self.trace_beam(grid, pending, &trace.beams, step_budget);
            trace.visited.extend(beam.points.iter().copied());
            trace.beams.push(beam);
        }
        trace
    }

    fn trace_beam(
        &mut self,
        grid: &Grid,
        pending: PendingBeam,
        earlier: &[BeamPath],
        step_budget: usize,
    ) -> BeamPath {
        let index = earlier.len();
        let mut path = BeamPath {
            source: pending.source,
            parent: pending.parent,
            points: Vec::new(),
            end: BeamEnd::Exited,
        };
        let mut state = pending.state;

        if !grid.contains_point(state.position) {
            return path;
        }
        if let Some(&visit) = self.seen.get(&state) {
            path.points.extend_from_slice(visit.continuation(earlier));
            path.end = BeamEnd::Merged;
            return path;
        }
        self.record(state, index, 0);
        path.points.push(state.position);

        let mut steps = 0;
        path.end = loop {
            if steps >= step_budget {
                log::debug!("beam {index} exhausted its budget of {step_budget} steps");
                break BeamEnd::NonTerminating;
            }

            let Some(contacts) = probe(grid, state) else {
                break BeamEnd::Exited;
            };

            let direction = match resolve(&contacts, state.direction) {
                Interaction::Absorb => break BeamEnd::Absorbed,
                Interaction::Continue { direction, splits } => {
                    for split in splits.into_iter().flatten() {
                        self.queue.push_back(PendingBeam {
                            state: BeamState {
                                position: state.position,
                                direction: split,
                            },
                            source: pending.source,
                            parent: Some(index),
                        });
                    }
                    direction
                }
            };

            state = BeamState {
                position: state.position.step(direction),
                direction,
            };
            steps += 1;
            path.points.push(state.position);

            match self.seen.get(&state).copied() {
                Some(visit) if visit.beam == index => {
                    log::debug!("beam {index} entered a closed loop at {}", state.position);
                    break BeamEnd::NonTerminating;
                }
                Some(visit) => {
                    path.points
                        .extend_from_slice(visit.continuation(earlier).get(1..).unwrap_or(&[]));
                    break BeamEnd::Merged;
                }
                None => self.record(state, index, path.points.len() - 1),
            }
        };

        log::trace!(
            "beam {index} from laser {} ended {:?} after {} points",
            path.source,
            path.end,
            path.points.len()
        );
        path
    }

    fn record(&mut self, state: BeamState, beam: usize, point: usize) {
        let _ = self.seen.insert(state, Visit { beam, point });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BeamState {
    position: LatticePoint,
    direction: Direction,
}

/// Beam that first recorded a state, and where in its path the state sits.
#[derive(Clone, Copy, Debug)]
struct Visit {
    beam: usize,
    point: usize,
}

impl Visit {
    /// Points the owning beam visited from this state onwards.
    fn continuation(self, earlier: &[BeamPath]) -> &[LatticePoint] {
        earlier
            .get(self.beam)
            .and_then(|beam| beam.points.get(self.point..))
            .unwrap_or(&[])
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingBeam {
    state: BeamState,
    source: usize,
    parent: Option<usize>,
}

/// Block edge a beam is about to cross.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    /// Crossing a vertical edge mirrors the horizontal component.
    Vertical,
    /// Crossing a horizontal edge mirrors the vertical component.
    Horizontal,
}

impl Edge {
    fn mirror(self, direction: Direction) -> Direction {
        match self {
            Self::Vertical => direction.flip_x(),
            Self::Horizontal => direction.flip_y(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Contact {
    edge: Edge,
    kind: BlockKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interaction {
    Absorb,
    Continue {
        direction: Direction,
        splits: [Option<Direction>; 2],
    },
}

/// Looks one step ahead of the beam.
///
/// Returns `None` when the next step leaves the lattice. Otherwise returns the
/// blocks whose edges the step crosses: the cell beside the beam (vertical
/// edge) and the cell above or below it (horizontal edge). Empty blocks are
/// transparent and never reported.
fn probe(grid: &Grid, state: BeamState) -> Option<[Option<Contact>; 2]> {
    let position = state.position;
    let beside = LatticePoint::new(
        position.x() + i64::from(state.direction.dx()),
        position.y(),
    );
    let ahead = LatticePoint::new(
        position.x(),
        position.y() + i64::from(state.direction.dy()),
    );
    if !grid.contains_point(beside) || !grid.contains_point(ahead) {
        return None;
    }

    let contact = |point: LatticePoint, edge: Edge| {
        grid.block_at_point(point)
            .filter(|block| block.kind().interacts_with_beams())
            .map(|block| Contact {
                edge,
                kind: block.kind(),
            })
    };
    Some([
        contact(beside, Edge::Vertical),
        contact(ahead, Edge::Horizontal),
    ])
}

/// Applies the block rules for every contact of a single step.
///
/// Opaque blocks win over everything else. Reflections compose, so touching
/// two reflective edges at once flips both components.
fn resolve(contacts: &[Option<Contact>; 2], incoming: Direction) -> Interaction {
    if contacts
        .iter()
        .flatten()
        .any(|contact| contact.kind == BlockKind::Opaque)
    {
        return Interaction::Absorb;
    }

    let mut direction = incoming;
    let mut splits = [None; 2];
    for (slot, contact) in contacts.iter().enumerate() {
        let Some(contact) = contact else {
            continue;
        };
        match contact.kind {
            BlockKind::Reflect => direction = contact.edge.mirror(direction),
            BlockKind::Refract => splits[slot] = Some(contact.edge.mirror(incoming)),
            BlockKind::Opaque | BlockKind::Empty => {}
        }
    }
    Interaction::Continue { direction, splits }
}

fn default_step_budget(grid: &Grid) -> usize {
    let (width, height) = grid.lattice_size();
    let points = usize::try_from(width.saturating_mul(height)).unwrap_or(usize::MAX);
    points.saturating_mul(4)
}

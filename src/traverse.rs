//! Walking the classified graph to produce output contours.
//!
//! Traversal is a small state machine. The state is the current vertex and
//! the [`Direction`] of travel; at each intersection, the operation's tables
//! decide which part of the vertex's flag gets consumed and which way to go
//! next. A contour is finished when traversal comes back to the vertex that
//! it started from, travelling in the direction that it started in.

use crate::geom::Point;
use crate::graph::{Flag, Ring, Stage, VertexIdx, Workspace};
use crate::validate::GraphInconsistency;
use crate::ClipOp;

/// The direction of travel along the graph.
///
/// The "across" directions mean that the next step is to the current
/// vertex's neighbor on the other polygon, after which travel continues
/// forward or backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    /// Along `next` links.
    Forward,
    /// Along `prev` links.
    Reverse,
    /// Across to the neighbor, then forward.
    AcrossForward,
    /// Across to the neighbor, then backward.
    AcrossReverse,
}

impl Direction {
    /// Is the next step to the other polygon?
    pub fn is_across(self) -> bool {
        matches!(self, Direction::AcrossForward | Direction::AcrossReverse)
    }

    /// Does travel (eventually) follow `next` links?
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward | Direction::AcrossForward)
    }

    /// Toggles whether the next step is across.
    pub fn across(self) -> Direction {
        match self {
            Direction::Forward => Direction::AcrossForward,
            Direction::Reverse => Direction::AcrossReverse,
            Direction::AcrossForward => Direction::Forward,
            Direction::AcrossReverse => Direction::Reverse,
        }
    }

    /// Toggles between forward and backward travel.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
            Direction::AcrossForward => Direction::AcrossReverse,
            Direction::AcrossReverse => Direction::AcrossForward,
        }
    }
}

/// The direction in which to set off from a start vertex with flag `flag`.
///
/// Difference uses the intersection tables; its subject was classified
/// against the complement of the clip polygon.
pub fn start_direction(op: ClipOp, flag: Flag) -> Option<Direction> {
    let dir = match (op, flag) {
        (_, Flag::None) => return None,
        (ClipOp::Union, Flag::Exit) => Direction::Reverse,
        (ClipOp::Union, Flag::Entry | Flag::EntryExit) => Direction::Forward,
        // Only reachable through the neighbor.
        (ClipOp::Union, Flag::ExitEntry) => Direction::AcrossForward,
        (_, Flag::Exit | Flag::ExitEntry) => Direction::Forward,
        (_, Flag::Entry) => Direction::Reverse,
        (_, Flag::EntryExit) => Direction::AcrossForward,
    };
    Some(dir)
}

/// Which part of `flag` gets consumed when arriving at a vertex in direction `dir`.
pub fn choose_flag(op: ClipOp, flag: Flag, dir: Direction) -> Flag {
    match (op, flag) {
        (ClipOp::Union, Flag::EntryExit) => Flag::Entry,
        (ClipOp::Union, Flag::ExitEntry) => Flag::Exit,
        (_, Flag::EntryExit) if dir.is_across() => Flag::EntryExit,
        (_, Flag::EntryExit) if dir.is_forward() => Flag::Entry,
        (_, Flag::EntryExit) => Flag::Exit,
        (_, Flag::ExitEntry) if dir.is_forward() => Flag::Exit,
        (_, Flag::ExitEntry) => Flag::Entry,
        (_, f) => f,
    }
}

/// The direction in which to leave a vertex after consuming `chosen` from
/// it, having arrived in direction `dir`.
pub fn transition(op: ClipOp, chosen: Flag, dir: Direction) -> Option<Direction> {
    let across = dir.is_across();
    let out = match (op, chosen) {
        (ClipOp::Union, Flag::Entry) if across => dir.across().reverse(),
        (ClipOp::Union, Flag::Entry) => dir.across(),
        (ClipOp::Union, Flag::Exit) if across => dir.across(),
        (ClipOp::Union, Flag::Exit) => dir.across().reverse(),
        (ClipOp::Union, _) => return None,
        (_, Flag::Entry) if across => Direction::Forward,
        (_, Flag::Exit) if across => Direction::Reverse,
        (_, Flag::Entry | Flag::Exit) => Direction::AcrossForward,
        (_, Flag::EntryExit) if across => Direction::AcrossForward,
        _ => return None,
    };
    Some(out)
}

/// The combined table: the part of `flag` to consume, and the direction to leave in.
pub fn step(op: ClipOp, flag: Flag, dir: Direction) -> Option<(Flag, Direction)> {
    let chosen = choose_flag(op, flag, dir);
    transition(op, chosen, dir).map(|out| (chosen, out))
}

impl Workspace {
    // Removes `flag` from `v`'s flag. A vertex whose flag is used up stops
    // being an intersection, and so does its couple.
    fn consume_flag(
        &mut self,
        v: VertexIdx,
        flag: Flag,
        dir: Direction,
    ) -> Result<(), GraphInconsistency> {
        if flag == Flag::None {
            return Ok(());
        }
        let current = self.verts[v].flag;
        let remaining = match (current, flag) {
            (c, f) if c == f => Flag::None,
            (Flag::EntryExit | Flag::ExitEntry, Flag::Entry) => Flag::Exit,
            (Flag::EntryExit | Flag::ExitEntry, Flag::Exit) => Flag::Entry,
            _ => {
                return Err(GraphInconsistency::NoTransition {
                    vertex: v,
                    flag: current,
                    direction: dir,
                })
            }
        };

        self.verts[v].flag = remaining;
        if remaining == Flag::None {
            self.verts[v].intersection = false;
            if let Some(c) = self.verts[v].couple {
                self.verts[c].flag = Flag::None;
                self.verts[c].intersection = false;
            }
        }
        Ok(())
    }

    // Takes one step from `v`, having arrived in direction `incoming` and
    // leaving in direction `outgoing`.
    fn follow(
        &self,
        v: VertexIdx,
        incoming: Direction,
        outgoing: Direction,
    ) -> Result<VertexIdx, GraphInconsistency> {
        let vert = &self.verts[v];
        if outgoing.is_across() {
            return vert
                .neighbor
                .ok_or(GraphInconsistency::MissingNeighbor { vertex: v });
        }
        // Half of a two-sided flag is still waiting to be consumed.
        if incoming.is_forward() == outgoing.is_forward() && vert.flag != Flag::None {
            return Ok(v);
        }
        let next = if outgoing.is_forward() {
            vert.next
        } else {
            vert.prev
        };
        next.ok_or(GraphInconsistency::BrokenList { vertex: v })
    }

    // The first flagged subject vertex that isn't the wrong end of a couple.
    // A coupled entry is only started from at its second vertex, and a
    // coupled exit at its first.
    fn find_start(&self) -> Option<VertexIdx> {
        self.ring(Ring::Subject).find(|&v| {
            let vert = &self.verts[v];
            match (vert.flag, vert.couple) {
                (Flag::None, _) => false,
                (_, None) => true,
                (Flag::Entry, Some(c)) => vert.prev == Some(c),
                (Flag::Exit, Some(c)) => vert.next == Some(c),
                _ => false,
            }
        })
    }

    /// Walks out a single contour, consuming the flags along the way.
    ///
    /// Returns `None` once there is nowhere left to start from. The returned
    /// contour may be degenerate (fewer than three points) when traversal
    /// only went back and forth between neighbors.
    pub fn extract_contour(&mut self, op: ClipOp) -> Result<Option<Vec<Point>>, GraphInconsistency> {
        self.expect_stage(Stage::Closed)?;
        let Some(start) = self.find_start() else {
            return Ok(None);
        };
        let start_flag = self.verts[start].flag;
        let start_dir =
            start_direction(op, start_flag).ok_or(GraphInconsistency::UnflaggedIntersection {
                vertex: start,
            })?;
        log::trace!("starting a contour at {start:?} ({start_flag:?}), going {start_dir:?}");

        // Every step either moves along a list or consumes some flag, so a
        // valid graph gets back to the start well within this.
        let max_steps = 4 * self.verts.len() + 8;
        let mut points = Vec::new();
        let mut v = start;
        let mut dir = start_dir;
        let mut last = None;
        for _ in 0..max_steps {
            if !dir.is_across() && last != Some(v) {
                points.push(self.point(v));
            }

            let (next_v, next_dir) = if !self.verts[v].intersection {
                (self.follow(v, dir, dir)?, dir)
            } else {
                let flag = self.verts[v].flag;
                let (chosen, out) = step(op, flag, dir).ok_or(GraphInconsistency::NoTransition {
                    vertex: v,
                    flag,
                    direction: dir,
                })?;
                self.consume_flag(v, chosen, dir)?;
                log::trace!("{v:?}: consumed {chosen:?} of {flag:?}, {dir:?} -> {out:?}");
                (self.follow(v, dir, out)?, out)
            };

            last = Some(v);
            v = next_v;
            dir = next_dir;
            if v == start && dir == start_dir {
                #[cfg(feature = "slow-asserts")]
                self.validate_consumption()?;
                log::debug!("extracted a contour of {} points", points.len());
                return Ok(Some(points));
            }
        }
        Err(GraphInconsistency::Unterminated { start })
    }

    /// Extracts contours until there are none left.
    ///
    /// Degenerate contours, with fewer than three points, are dropped.
    pub fn extract_all(&mut self, op: ClipOp) -> Result<Vec<Vec<Point>>, GraphInconsistency> {
        let mut ret = Vec::new();
        while let Some(points) = self.extract_contour(op)? {
            if points.len() >= 3 {
                ret.push(points);
            } else {
                log::debug!("dropping a degenerate contour {points:?}");
            }
        }
        Ok(ret)
    }
}

//! Consistency checks for the vertex graph.
//!
//! Traversal only terminates if the graph it walks is well-formed, so the
//! entry points check the graph after intersection discovery and again after
//! classification. A failed check is reported as a [`GraphInconsistency`]
//! instead of a panic, so that bad input can't take down the caller.

use crate::graph::{Flag, Stage, VertexIdx, Workspace};
use crate::traverse::Direction;

/// A broken invariant in the vertex graph.
///
/// These indicate either a bug or input that violates the algorithm's
/// assumptions (most commonly, a self-intersecting polygon).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphInconsistency {
    /// A vertex's `next` and `prev` links don't agree with its neighbors' links.
    BrokenList {
        /// The vertex whose links are wrong.
        vertex: VertexIdx,
    },
    /// A vertex was about to be linked to a second neighbor.
    ConflictingNeighbor {
        /// The vertex that already had a neighbor.
        vertex: VertexIdx,
    },
    /// A vertex's neighbor doesn't point back at it, or is on the same polygon.
    AsymmetricNeighbor {
        /// The vertex whose neighbor is wrong.
        vertex: VertexIdx,
    },
    /// An intersection vertex has no neighbor, or a non-intersection vertex has one.
    MissingNeighbor {
        /// The offending vertex.
        vertex: VertexIdx,
    },
    /// A vertex's alpha was outside of `[0, 1)`.
    BadAlpha {
        /// The offending vertex.
        vertex: VertexIdx,
        /// Its alpha.
        alpha: f64,
    },
    /// There was no place to put a vertex that keeps its edge sorted by alpha.
    UnsortedAlpha {
        /// The vertex being inserted, or the first out-of-order vertex.
        vertex: VertexIdx,
    },
    /// An intersection vertex survived classification without a flag.
    UnflaggedIntersection {
        /// The offending vertex.
        vertex: VertexIdx,
    },
    /// An intersection vertex's flag is unrelated to its neighbor's.
    FlagMismatch {
        /// The offending vertex.
        vertex: VertexIdx,
        /// Its flag.
        flag: Flag,
        /// Its neighbor's flag.
        neighbor_flag: Flag,
    },
    /// A couple link is one-sided, joins non-adjacent vertices, or joins
    /// vertices with different flags.
    BadCouple {
        /// The offending vertex.
        vertex: VertexIdx,
    },
    /// Traversal reached an intersection whose flag has no transition.
    NoTransition {
        /// Where traversal was.
        vertex: VertexIdx,
        /// The flag being consumed.
        flag: Flag,
        /// The direction traversal arrived in.
        direction: Direction,
    },
    /// Traversal ran far longer than any valid graph allows without getting
    /// back to where it started.
    Unterminated {
        /// Where traversal started.
        start: VertexIdx,
    },
    /// A processing step was attempted out of order.
    PhaseOrder {
        /// The stage that the step requires.
        expected: Stage,
        /// The stage the workspace was actually in.
        found: Stage,
    },
}

impl std::fmt::Display for GraphInconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphInconsistency::BrokenList { vertex } => {
                write!(f, "list links around {vertex:?} are inconsistent")
            }
            GraphInconsistency::ConflictingNeighbor { vertex } => {
                write!(f, "{vertex:?} already has a different neighbor")
            }
            GraphInconsistency::AsymmetricNeighbor { vertex } => {
                write!(f, "the neighbor of {vertex:?} doesn't link back to it")
            }
            GraphInconsistency::MissingNeighbor { vertex } => {
                write!(f, "{vertex:?} disagrees with its neighbor link about being an intersection")
            }
            GraphInconsistency::BadAlpha { vertex, alpha } => {
                write!(f, "{vertex:?} has alpha {alpha}, outside of [0, 1)")
            }
            GraphInconsistency::UnsortedAlpha { vertex } => {
                write!(f, "intersections around {vertex:?} are not sorted along their edge")
            }
            GraphInconsistency::UnflaggedIntersection { vertex } => {
                write!(f, "intersection {vertex:?} has no flag")
            }
            GraphInconsistency::FlagMismatch {
                vertex,
                flag,
                neighbor_flag,
            } => write!(
                f,
                "{vertex:?} is flagged {flag:?} but its neighbor is flagged {neighbor_flag:?}"
            ),
            GraphInconsistency::BadCouple { vertex } => {
                write!(f, "the couple of {vertex:?} is inconsistent")
            }
            GraphInconsistency::NoTransition {
                vertex,
                flag,
                direction,
            } => write!(
                f,
                "no transition out of {vertex:?} with flag {flag:?}, arriving {direction:?}"
            ),
            GraphInconsistency::Unterminated { start } => {
                write!(f, "traversal starting from {start:?} didn't terminate")
            }
            GraphInconsistency::PhaseOrder { expected, found } => {
                write!(f, "expected a workspace at stage {expected:?}, found {found:?}")
            }
        }
    }
}

impl std::error::Error for GraphInconsistency {}

impl Workspace {
    /// Checks the structure built by intersection discovery.
    ///
    /// The polygon lists must be consistently doubly linked, neighbor links
    /// must be symmetric and cross between the polygons, every intersection
    /// vertex must have a neighbor, and the intersections inserted on each
    /// edge must be sorted by alpha.
    pub fn validate_links(&self) -> Result<(), GraphInconsistency> {
        for v in self.all_vertices() {
            let vert = &self.verts[v];
            if vert.next.is_some_and(|n| self.verts[n].prev != Some(v))
                || vert.prev.is_some_and(|p| self.verts[p].next != Some(v))
            {
                return Err(GraphInconsistency::BrokenList { vertex: v });
            }

            if vert.intersection != vert.neighbor.is_some() {
                return Err(GraphInconsistency::MissingNeighbor { vertex: v });
            }
            if let Some(n) = vert.neighbor {
                let nv = &self.verts[n];
                if nv.neighbor != Some(v) || nv.ring == vert.ring {
                    return Err(GraphInconsistency::AsymmetricNeighbor { vertex: v });
                }
            }

            if !(0.0..1.0).contains(&vert.alpha) {
                return Err(GraphInconsistency::BadAlpha {
                    vertex: v,
                    alpha: vert.alpha,
                });
            }
            if let Some(n) = vert.next {
                let next_alpha = self.verts[n].alpha;
                if vert.alpha > 0.0 && next_alpha > 0.0 && next_alpha < vert.alpha {
                    return Err(GraphInconsistency::UnsortedAlpha { vertex: n });
                }
            }
        }
        Ok(())
    }

    /// Checks the flags and couples assigned by classification.
    ///
    /// In addition to everything checked by
    /// [`validate_links`](Workspace::validate_links), every intersection must
    /// be flagged, and (unless either side is two-sided) its flag must equal
    /// or complement its neighbor's. Couples must be symmetric, join
    /// list-adjacent vertices with equal single flags, and be mirrored by a
    /// couple between the two neighbors.
    pub fn validate_classification(&self) -> Result<(), GraphInconsistency> {
        self.validate_links()?;

        for v in self.all_vertices() {
            let vert = &self.verts[v];
            if let Some(n) = vert.neighbor {
                let neighbor_flag = self.verts[n].flag;
                if vert.flag == Flag::None {
                    return Err(GraphInconsistency::UnflaggedIntersection { vertex: v });
                }
                let related = vert.flag.is_double()
                    || neighbor_flag.is_double()
                    || neighbor_flag == vert.flag
                    || neighbor_flag == vert.flag.invert();
                if !related {
                    return Err(GraphInconsistency::FlagMismatch {
                        vertex: v,
                        flag: vert.flag,
                        neighbor_flag,
                    });
                }
            }

            if let Some(c) = vert.couple {
                let cv = &self.verts[c];
                let adjacent = self.wrapping_next(v) == c || self.wrapping_next(c) == v;
                let mirrored = match (vert.neighbor, cv.neighbor) {
                    (Some(n), Some(cn)) => self.verts[n].couple == Some(cn),
                    _ => false,
                };
                if cv.couple != Some(v)
                    || !adjacent
                    || cv.flag != vert.flag
                    || !matches!(vert.flag, Flag::Entry | Flag::Exit)
                    || !mirrored
                {
                    return Err(GraphInconsistency::BadCouple { vertex: v });
                }
            }
        }
        Ok(())
    }

    /// Checks that traversal hasn't left a couple half-consumed.
    #[cfg(feature = "slow-asserts")]
    pub(crate) fn validate_consumption(&self) -> Result<(), GraphInconsistency> {
        for v in self.all_vertices() {
            let vert = &self.verts[v];
            if let Some(c) = vert.couple {
                if self.verts[c].couple != Some(v) || self.verts[c].flag != vert.flag {
                    return Err(GraphInconsistency::BadCouple { vertex: v });
                }
            }
        }
        Ok(())
    }

    // Both polygons' vertices. Vertices dropped while building the workspace
    // are unreachable and skipped.
    fn all_vertices(&self) -> impl Iterator<Item = VertexIdx> + '_ {
        use crate::graph::Ring;
        self.ring(Ring::Subject).chain(self.ring(Ring::Clip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Ring;
    use assert_matches::assert_matches;

    fn overlapping() -> Workspace {
        let a = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let b = vec![(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)];
        Workspace::new(a, b).unwrap()
    }

    #[test]
    fn fresh_workspace_is_valid() {
        let ws = overlapping();
        ws.validate_links().unwrap();
    }

    #[test]
    fn one_sided_neighbor() {
        let mut ws = overlapping();
        let a = ws.head(Ring::Subject);
        let b = ws.head(Ring::Clip);
        ws.verts[a].intersection = true;
        ws.verts[a].neighbor = Some(b);
        assert_matches!(
            ws.validate_links(),
            Err(GraphInconsistency::AsymmetricNeighbor { vertex }) if vertex == a
        );
    }

    #[test]
    fn intersection_without_neighbor() {
        let mut ws = overlapping();
        let a = ws.head(Ring::Clip);
        ws.verts[a].intersection = true;
        assert_matches!(
            ws.validate_links(),
            Err(GraphInconsistency::MissingNeighbor { vertex }) if vertex == a
        );
    }

    #[test]
    fn unrelated_flags() {
        let mut ws = overlapping();
        ws.discover_intersections().unwrap();
        ws.classify(crate::ClipOp::Union).unwrap();
        ws.validate_classification().unwrap();

        let v = ws.intersections(Ring::Subject).next().unwrap();
        ws.verts[v].flag = Flag::None;
        assert_matches!(
            ws.validate_classification(),
            Err(GraphInconsistency::UnflaggedIntersection { vertex }) if vertex == v
        );
    }

    #[test]
    fn broken_couple() {
        let mut ws = overlapping();
        ws.discover_intersections().unwrap();
        ws.classify(crate::ClipOp::Union).unwrap();

        let mut inters = ws.intersections(Ring::Clip);
        let a = inters.next().unwrap();
        let b = inters.next().unwrap();
        drop(inters);
        ws.verts[a].couple = Some(b);
        assert_matches!(
            ws.validate_classification(),
            Err(GraphInconsistency::BadCouple { .. })
        );
    }

    #[cfg(feature = "slow-asserts")]
    #[test]
    fn half_consumed_couple() {
        let mut ws = overlapping();
        ws.discover_intersections().unwrap();
        ws.classify(crate::ClipOp::Union).unwrap();
        ws.validate_consumption().unwrap();

        let mut inters = ws.intersections(Ring::Clip);
        let a = inters.next().unwrap();
        let b = inters.next().unwrap();
        drop(inters);
        ws.verts[a].couple = Some(b);
        assert_matches!(
            ws.validate_consumption(),
            Err(GraphInconsistency::BadCouple { vertex }) if vertex == a
        );
    }
}

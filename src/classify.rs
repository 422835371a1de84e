//! Labelling intersection vertices as entries and exits.
//!
//! Every edge next to an intersection is either `On` the other polygon's
//! boundary, or it lies inside or outside the other polygon. The statuses of
//! the edges arriving at and leaving an intersection determine its [`Flag`].
//!
//! The clip polygon is labelled first, directly from its edge statuses. The
//! subject polygon is mostly labelled by copying its neighbors' flags: the
//! first suitable intersection is labelled directly, which tells us whether
//! the copies need to be inverted. Two-sided flags don't survive copying, so
//! intersections whose neighbor has one are always labelled directly.

use crate::containment::point_in_polygon;
use crate::geom::{same_way, Point};
use crate::graph::{cyclic_pairs, Flag, Ring, Stage, VertexIdx, Workspace};
use crate::validate::GraphInconsistency;
use crate::ClipOp;

/// Where an edge lies relative to the other polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeStatus {
    /// Strictly inside.
    In,
    /// Along the boundary.
    On,
    /// Strictly outside.
    Out,
}

impl EdgeStatus {
    fn invert(self) -> EdgeStatus {
        match self {
            EdgeStatus::In => EdgeStatus::Out,
            EdgeStatus::On => EdgeStatus::On,
            EdgeStatus::Out => EdgeStatus::In,
        }
    }
}

/// The flag of a vertex whose arriving edge has status `incoming` and whose
/// leaving edge has status `outgoing`.
///
/// Two boundaries running along each other don't meet there, so a vertex
/// between two `On` edges gets no flag.
pub fn flag_for(incoming: EdgeStatus, outgoing: EdgeStatus) -> Flag {
    use EdgeStatus::*;
    match (incoming, outgoing) {
        (In, In) => Flag::ExitEntry,
        (In, On) | (In, Out) => Flag::Exit,
        (On, In) => Flag::Entry,
        (On, On) => Flag::None,
        (On, Out) => Flag::Exit,
        (Out, In) | (Out, On) => Flag::Entry,
        (Out, Out) => Flag::EntryExit,
    }
}

impl Flag {
    /// Swaps entries and exits. The other flags are unchanged.
    pub fn invert(self) -> Flag {
        match self {
            Flag::Entry => Flag::Exit,
            Flag::Exit => Flag::Entry,
            f => f,
        }
    }
}

/// How two polygons are placed relative to each other, when their boundaries
/// don't cross.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Neither polygon overlaps the other.
    Disjoint,
    /// The subject lies inside the clip polygon.
    SubjectInside,
    /// The clip polygon lies inside the subject.
    ClipInside,
    /// The polygons cover the same region.
    Equal,
}

// Difference is computed as an intersection with the complement of the clip
// polygon, which amounts to swapping the insides and outsides of the subject's
// edges.
fn inverts_status(op: ClipOp, ring: Ring) -> bool {
    op == ClipOp::Difference && ring == Ring::Subject
}

impl Workspace {
    /// Does the edge from `a` to `b` run along the other polygon's boundary?
    ///
    /// This is the case when both ends are intersections, and their neighbors
    /// are adjacent on the other polygon.
    fn is_on(&self, a: VertexIdx, b: VertexIdx) -> bool {
        let (va, vb) = (&self.verts[a], &self.verts[b]);
        if !va.intersection || !vb.intersection {
            return false;
        }
        let (Some(na), Some(nb)) = (va.neighbor, vb.neighbor) else {
            return false;
        };
        let (vna, vnb) = (&self.verts[na], &self.verts[nb]);

        // The closing edge of an open list.
        (vna.next.is_none() && vnb.prev.is_none())
            || (vna.prev.is_none() && vnb.next.is_none())
            || vna.next == Some(nb)
            || vnb.next == Some(na)
    }

    fn edge_status(&self, a: VertexIdx, b: VertexIdx, other: &[Point], invert: bool) -> EdgeStatus {
        if self.is_on(a, b) {
            return EdgeStatus::On;
        }
        let mid = self.point(a).midpoint(&self.point(b));
        let status = if point_in_polygon(other, &mid) {
            EdgeStatus::In
        } else {
            EdgeStatus::Out
        };
        if invert {
            status.invert()
        } else {
            status
        }
    }

    fn direct_flag(&self, v: VertexIdx, other: &[Point], invert: bool) -> Flag {
        let incoming = self.edge_status(self.wrapping_prev(v), v, other, invert);
        let outgoing = self.edge_status(v, self.wrapping_next(v), other, invert);
        flag_for(incoming, outgoing)
    }

    /// Decides how the polygons are placed relative to each other, assuming
    /// that their boundaries don't cross.
    ///
    /// Each polygon is sampled at the midpoint of its first edge that doesn't
    /// run along the other polygon's boundary. A polygon with no such edge is
    /// made up of the other one's boundary, so the two are equal. Neighbor
    /// links are needed to recognize the shared edges, so this must be asked
    /// before classification severs the unflagged ones.
    pub fn relation(&self) -> Relation {
        let sample = |ring: Ring| {
            let other = self.ring_points(ring.other());
            self.ring(ring).find_map(|v| {
                let next = self.wrapping_next(v);
                let mid = self.point(v).midpoint(&self.point(next));
                (!self.is_on(v, next)).then(|| point_in_polygon(&other, &mid))
            })
        };

        match (sample(Ring::Subject), sample(Ring::Clip)) {
            (None, _) | (_, None) => Relation::Equal,
            (Some(true), _) => Relation::SubjectInside,
            (_, Some(true)) => Relation::ClipInside,
            (Some(false), Some(false)) => Relation::Disjoint,
        }
    }

    /// Flags every intersection vertex on both polygons, and couples up
    /// adjacent vertices that represent a single touch.
    ///
    /// Intersections that turn out not to be meaningful (for example, the
    /// ends of a stretch where the boundaries run along each other without
    /// crossing) stop being intersections.
    pub fn classify(&mut self, op: ClipOp) -> Result<(), GraphInconsistency> {
        self.expect_stage(Stage::Discovered)?;

        self.classify_first(op)?;
        self.classify_second(op)?;
        self.clear_unflagged();
        self.build_couples()?;
        self.stage = Stage::Classified;

        log::debug!(
            "classified for {op:?}: {} flagged intersections on the subject, {} on the clip",
            self.intersections(Ring::Subject).count(),
            self.intersections(Ring::Clip).count(),
        );
        Ok(())
    }

    // Labels the clip polygon directly. Also records, for the two-sided
    // flags, whether the polygons run opposite ways through the touch.
    fn classify_first(&mut self, op: ClipOp) -> Result<(), GraphInconsistency> {
        let ring = Ring::Clip;
        let other = self.ring_points(ring.other());
        let invert = inverts_status(op, ring);

        let mut updates = Vec::new();
        for v in self.intersections(ring) {
            let n = self.verts[v]
                .neighbor
                .ok_or(GraphInconsistency::MissingNeighbor { vertex: v })?;
            let flag = self.direct_flag(v, &other, invert);
            let cross_change = flag.is_double()
                && !same_way(
                    &self.point(self.wrapping_prev(v)),
                    &self.point(self.wrapping_next(v)),
                    &self.point(self.wrapping_prev(n)),
                    &self.point(self.wrapping_next(n)),
                    &self.point(v),
                );
            log::trace!("{v:?} at {:?}: {flag:?}", self.point(v));
            updates.push((v, n, flag, cross_change));
        }

        for (v, n, flag, cross_change) in updates {
            self.verts[v].flag = flag;
            self.verts[v].cross_change = cross_change;
            if cross_change {
                self.verts[n].cross_change = true;
            }
        }
        Ok(())
    }

    // Labels the subject polygon, mostly by copying from the clip.
    fn classify_second(&mut self, op: ClipOp) -> Result<(), GraphInconsistency> {
        let ring = Ring::Subject;
        let other = self.ring_points(ring.other());
        let invert = inverts_status(op, ring);

        let mut neighbor_flags = Vec::new();
        for v in self.intersections(ring) {
            let n = self.verts[v]
                .neighbor
                .ok_or(GraphInconsistency::MissingNeighbor { vertex: v })?;
            neighbor_flags.push((v, self.verts[n].flag));
        }

        // Whether copied flags need to be inverted, as decided by the first
        // intersection whose neighbor has a one-sided flag.
        let mut flip = Some(false);
        let anchor = neighbor_flags
            .iter()
            .find(|(_, nf)| *nf != Flag::None && !nf.is_double());
        if let Some(&(v, neighbor_flag)) = anchor {
            let flag = self.direct_flag(v, &other, invert);
            flip = if flag == neighbor_flag {
                Some(false)
            } else if flag == neighbor_flag.invert() {
                Some(true)
            } else {
                log::debug!(
                    "{v:?} is {flag:?} but its neighbor is {neighbor_flag:?}; labelling the subject directly"
                );
                None
            };
        }

        let mut updates = Vec::with_capacity(neighbor_flags.len());
        for (v, neighbor_flag) in neighbor_flags {
            let flag = match (neighbor_flag, flip) {
                (Flag::None, _) => Flag::None,
                (nf, Some(false)) if !nf.is_double() => nf,
                (nf, Some(true)) if !nf.is_double() => nf.invert(),
                _ => self.direct_flag(v, &other, invert),
            };
            log::trace!("{v:?} at {:?}: {flag:?}", self.point(v));
            updates.push((v, flag));
        }
        for (v, flag) in updates {
            self.verts[v].flag = flag;
        }
        Ok(())
    }

    // Intersections that didn't get a flag on either side are no longer
    // treated as intersections.
    fn clear_unflagged(&mut self) {
        for ring in [Ring::Clip, Ring::Subject] {
            let unflagged: Vec<_> = self
                .intersections(ring)
                .filter(|&v| self.verts[v].flag == Flag::None)
                .collect();
            for v in unflagged {
                if let Some(n) = self.verts[v].neighbor {
                    self.verts[n].intersection = false;
                    self.verts[n].flag = Flag::None;
                }
                self.unlink_neighbors(v);
                self.verts[v].intersection = false;
            }
        }
    }

    // Adjacent vertices with the same one-sided flag represent the two ends
    // of a single touch. Couples are found on the clip polygon and mirrored
    // onto the subject.
    fn build_couples(&mut self) -> Result<(), GraphInconsistency> {
        let clip: Vec<_> = self.ring(Ring::Clip).collect();
        for (&a, &b) in cyclic_pairs(&clip) {
            let flag = self.verts[a].flag;
            if flag != self.verts[b].flag || !matches!(flag, Flag::Entry | Flag::Exit) {
                continue;
            }
            let (Some(na), Some(nb)) = (self.verts[a].neighbor, self.verts[b].neighbor) else {
                return Err(GraphInconsistency::MissingNeighbor { vertex: a });
            };
            if self.verts[na].flag != self.verts[nb].flag {
                return Err(GraphInconsistency::BadCouple { vertex: a });
            }

            self.verts[a].couple = Some(b);
            self.verts[b].couple = Some(a);
            self.verts[na].couple = Some(nb);
            self.verts[nb].couple = Some(na);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use Flag::{Entry as En, EntryExit as EnEx, Exit as Ex, None as N};

    fn rect(cx: f64, cy: f64, w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![
            (cx - w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy + h / 2.0),
            (cx - w / 2.0, cy + h / 2.0),
        ]
    }

    fn classified(clip: Vec<(f64, f64)>, op: ClipOp) -> Workspace {
        let mut ws = Workspace::new(rect(2.0, 2.0, 4.0, 4.0), clip).unwrap();
        assert!(ws.discover_intersections().unwrap());
        ws.classify(op).unwrap();
        ws.validate_classification().unwrap();
        ws
    }

    fn flags(ws: &Workspace, ring: Ring) -> Vec<Flag> {
        ws.ring(ring).map(|v| ws.vertex(v).flag).collect()
    }

    #[test]
    fn flag_table() {
        use EdgeStatus::*;
        assert_eq!(flag_for(Out, In), Flag::Entry);
        assert_eq!(flag_for(In, Out), Flag::Exit);
        assert_eq!(flag_for(On, On), Flag::None);
        assert_eq!(flag_for(Out, Out), Flag::EntryExit);
        assert_eq!(flag_for(In, In), Flag::ExitEntry);
        assert_eq!(flag_for(On, In), Flag::Entry);
        assert_eq!(flag_for(In, On), Flag::Exit);
    }

    #[test]
    fn overlapping() {
        let ws = classified(rect(4.0, 4.0, 4.0, 4.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, En, N, Ex, N]);
        assert_eq!(flags(&ws, Ring::Clip), [N, Ex, N, N, N, En]);
    }

    #[test]
    fn difference_inverts_subject() {
        let ws = classified(rect(4.0, 4.0, 4.0, 4.0), ClipOp::Difference);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, Ex, N, En, N]);
        assert_eq!(flags(&ws, Ring::Clip), [N, Ex, N, N, N, En]);
    }

    #[test]
    fn adjacent() {
        let ws = classified(rect(2.0, 6.0, 4.0, 4.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, En, Ex]);
        assert_eq!(flags(&ws, Ring::Clip), [En, Ex, N, N]);
    }

    #[test]
    fn touching_corners() {
        let ws = classified(rect(6.0, 6.0, 4.0, 4.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, EnEx, N]);
        assert_eq!(flags(&ws, Ring::Clip), [EnEx, N, N, N]);
    }

    #[test]
    fn overlapping_border() {
        let ws = classified(rect(3.0, 6.0, 4.0, 4.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, En, Ex, N]);
        assert_eq!(flags(&ws, Ring::Clip), [En, Ex, N, N, N]);
    }

    #[test]
    fn one_larger() {
        let ws = classified(rect(3.0, 3.0, 6.0, 6.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, En, N, Ex]);
        assert_eq!(flags(&ws, Ring::Clip), [N, Ex, N, N, N, En]);
    }

    #[test]
    fn couples() {
        let ws = classified(rect(4.0, 3.0, 2.0, 2.0), ClipOp::Union);
        assert_eq!(flags(&ws, Ring::Subject), [N, N, En, Ex, Ex, N]);
        assert_eq!(flags(&ws, Ring::Clip), [N, Ex, N, N, En, En]);

        let s3 = ws.nth(Ring::Subject, 3).unwrap();
        let s4 = ws.nth(Ring::Subject, 4).unwrap();
        let c4 = ws.nth(Ring::Clip, 4).unwrap();
        let c5 = ws.nth(Ring::Clip, 5).unwrap();
        assert_eq!(ws.vertex(s3).couple, Some(s4));
        assert_eq!(ws.vertex(s4).couple, Some(s3));
        assert_eq!(ws.vertex(c4).couple, Some(c5));
        assert_eq!(ws.vertex(c5).couple, Some(c4));
    }

    #[test]
    fn cleared_intersections_are_unlinked() {
        // The shared edges of identical squares carry no flags at all.
        let mut ws = Workspace::new(rect(2.0, 2.0, 4.0, 4.0), rect(2.0, 2.0, 4.0, 4.0)).unwrap();
        assert!(ws.discover_intersections().unwrap());
        ws.classify(ClipOp::Union).unwrap();
        assert_eq!(ws.intersections(Ring::Subject).count(), 0);
        assert_eq!(ws.intersections(Ring::Clip).count(), 0);
        assert!(ws.ring(Ring::Clip).all(|v| ws.vertex(v).neighbor.is_none()));
    }

    #[test]
    fn relations() {
        let relation = |clip| {
            let mut ws = Workspace::new(rect(2.0, 2.0, 4.0, 4.0), clip).unwrap();
            ws.discover_intersections().unwrap();
            ws.relation()
        };
        assert_eq!(relation(rect(12.0, 2.0, 4.0, 4.0)), Relation::Disjoint);
        assert_eq!(relation(rect(2.0, 2.0, 2.0, 2.0)), Relation::ClipInside);
        assert_eq!(relation(rect(2.0, 2.0, 8.0, 8.0)), Relation::SubjectInside);
        assert_eq!(relation(rect(2.0, 2.0, 4.0, 4.0)), Relation::Equal);

        // The same square, with its vertices listed starting elsewhere and
        // an extra vertex in the middle of one edge.
        let shifted = vec![(4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 2.0), (0.0, 0.0)];
        assert_eq!(relation(shifted), Relation::Equal);
    }

    #[test]
    fn classify_twice() {
        let mut ws = classified(rect(4.0, 4.0, 4.0, 4.0), ClipOp::Union);
        assert_matches!(
            ws.classify(ClipOp::Union),
            Err(GraphInconsistency::PhaseOrder {
                expected: Stage::Discovered,
                found: Stage::Classified
            })
        );
    }

    #[test]
    fn opposite_windings_through_a_touch() {
        let cross_change = |subject: Vec<(f64, f64)>| {
            let mut ws = Workspace::new(subject, rect(6.0, 6.0, 4.0, 4.0)).unwrap();
            ws.discover_intersections().unwrap();
            ws.classify(ClipOp::Union).unwrap();
            let v = ws.head(Ring::Clip);
            let n = ws.vertex(v).neighbor.unwrap();
            assert_eq!(ws.vertex(v).flag, EnEx);
            (ws.vertex(v).cross_change, ws.vertex(n).cross_change)
        };

        let mut subject = rect(2.0, 2.0, 4.0, 4.0);
        assert_eq!(cross_change(subject.clone()), (false, false));
        subject.reverse();
        assert_eq!(cross_change(subject), (true, true));
    }
}

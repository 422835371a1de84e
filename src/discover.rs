//! Finding the places where the two polygons meet.
//!
//! Every edge of the subject is tested against every edge of the clip
//! polygon. Proper crossings get a fresh pair of intersection vertices. When
//! a vertex of one polygon lies on the other polygon's boundary, it gets
//! cloned into the edge that it lies on (or linked directly to a coinciding
//! vertex), so that every meeting point is represented on both polygons.

use arrayvec::ArrayVec;

use crate::geom::{calc_alpha, classify_intersection, line_coincidence_bits, Coincidence, Intersection};
use crate::graph::{cyclic_pairs, Ring, Stage, VertexIdx, Workspace};
use crate::validate::GraphInconsistency;

/// A change to the graph in response to one pair of edges meeting.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    /// New intersection vertices at these positions along the subject and
    /// clip edges.
    Cross { alpha_p: f64, alpha_q: f64 },
    /// A copy of the vertex `from`, inserted into the edge `before -> after`
    /// of the other polygon.
    Clone {
        from: VertexIdx,
        before: VertexIdx,
        after: VertexIdx,
    },
    /// Two existing vertices that are in the same place.
    Link(VertexIdx, VertexIdx),
}

// The subject edge s0 -> s1 and the clip edge c0 -> c1, with how they meet.
fn plan(
    kind: Intersection,
    bits: impl FnOnce() -> Coincidence,
    [s0, s1, c0, c1]: [VertexIdx; 4],
) -> ArrayVec<Action, 6> {
    let mut actions = ArrayVec::new();
    match kind {
        Intersection::None => {}
        Intersection::Cross { alpha_p, alpha_q } => {
            actions.push(Action::Cross { alpha_p, alpha_q });
        }
        Intersection::Touch { alpha_p, alpha_q } => {
            if alpha_p < 1.0 && alpha_q >= 1.0 {
                // The clip edge ends in the middle of the subject edge.
                actions.push(Action::Clone {
                    from: c1,
                    before: s0,
                    after: s1,
                });
            } else if alpha_q < 1.0 && alpha_p >= 1.0 {
                actions.push(Action::Clone {
                    from: s1,
                    before: c0,
                    after: c1,
                });
            } else {
                actions.push(Action::Link(s1, c1));
            }
        }
        Intersection::Coincide => {
            // A on CD and C on AB are the ends of the previous edges, and
            // were already handled as touches.
            let bits = bits();
            if bits.contains(Coincidence::B_ON_CD) {
                actions.push(Action::Clone {
                    from: s1,
                    before: c0,
                    after: c1,
                });
            }
            if bits.contains(Coincidence::D_ON_AB) {
                actions.push(Action::Clone {
                    from: c1,
                    before: s0,
                    after: s1,
                });
            }
            for (bit, a, b) in [
                (Coincidence::A_IS_C, s0, c0),
                (Coincidence::A_IS_D, s0, c1),
                (Coincidence::B_IS_C, s1, c0),
                (Coincidence::B_IS_D, s1, c1),
            ] {
                if bits.contains(bit) {
                    actions.push(Action::Link(a, b));
                }
            }
        }
    }
    actions
}

impl Workspace {
    /// Finds all the intersections between the two polygons, inserting new
    /// vertices and neighbor links as needed.
    ///
    /// Returns `false` if the polygons' boundaries don't meet at all, in
    /// which case the polygons are either disjoint or one contains the other.
    pub fn discover_intersections(&mut self) -> Result<bool, GraphInconsistency> {
        self.expect_stage(Stage::Built)?;

        // Only the original vertices delimit edges; intersection vertices get
        // inserted between them as we go.
        let subject: Vec<_> = self.ring(Ring::Subject).collect();
        let clip: Vec<_> = self.ring(Ring::Clip).collect();

        let mut found = 0usize;
        for (&s0, &s1) in cyclic_pairs(&subject) {
            for (&c0, &c1) in cyclic_pairs(&clip) {
                let (p0, p1) = (self.point(s0), self.point(s1));
                let (q0, q1) = (self.point(c0), self.point(c1));
                let kind = classify_intersection(&p0, &p1, &q0, &q1);
                if kind == Intersection::None {
                    continue;
                }
                found += 1;

                let actions = plan(
                    kind,
                    || line_coincidence_bits(&p0, &p1, &q0, &q1),
                    [s0, s1, c0, c1],
                );
                log::trace!("{p0:?}->{p1:?} meets {q0:?}->{q1:?}: {kind:?} {actions:?}");
                for action in actions {
                    self.apply(action, [s0, s1, c0, c1])?;
                }
            }
        }

        for v in self.verts.indices() {
            if self.verts[v].neighbor.is_some() {
                self.verts[v].intersection = true;
            }
        }
        self.stage = Stage::Discovered;
        log::debug!(
            "{found} edge pairs meet, giving {} intersections",
            self.intersections(Ring::Subject).count()
        );
        Ok(found > 0)
    }

    fn apply(
        &mut self,
        action: Action,
        [s0, s1, c0, c1]: [VertexIdx; 4],
    ) -> Result<(), GraphInconsistency> {
        match action {
            Action::Cross { alpha_p, alpha_q } => {
                // Both copies share the same point, so that output contours
                // agree no matter which polygon they were walked along.
                let p = self.point(s0).affine(&self.point(s1), alpha_p);
                let i1 = self.alloc_intersection(Ring::Subject, p, alpha_p);
                let i2 = self.alloc_intersection(Ring::Clip, p, alpha_q);
                self.link_neighbors(i1, i2)?;
                self.sorted_insert(s0, s1, i1)?;
                self.sorted_insert(c0, c1, i2)?;
            }
            Action::Clone {
                from,
                before,
                after,
            } => self.insert_clone(from, before, after)?,
            Action::Link(a, b) => self.link_neighbors(a, b)?,
        }
        Ok(())
    }

    // Puts a copy of `from` into the other polygon's edge `before -> after`,
    // which `from` lies on.
    fn insert_clone(
        &mut self,
        from: VertexIdx,
        before: VertexIdx,
        after: VertexIdx,
    ) -> Result<(), GraphInconsistency> {
        let at = self.point(from);
        let alpha = calc_alpha(&at, &self.point(before), &self.point(after)).unwrap_or(f64::NAN);
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(GraphInconsistency::BadAlpha {
                vertex: from,
                alpha,
            });
        }

        let ring = self.verts[before].ring;
        let v = self.alloc_intersection(ring, at, alpha);
        self.link_neighbors(v, from)?;
        self.sorted_insert(before, after, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    fn rect(cx: f64, cy: f64, w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![
            (cx - w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy + h / 2.0),
            (cx - w / 2.0, cy + h / 2.0),
        ]
    }

    fn discovered(subject: Vec<(f64, f64)>, clip: Vec<(f64, f64)>) -> Workspace {
        let mut ws = Workspace::new(subject, clip).unwrap();
        assert!(ws.discover_intersections().unwrap());
        ws.validate_links().unwrap();
        ws
    }

    fn neighbor_of(ws: &Workspace, ring: Ring, n: usize) -> Option<VertexIdx> {
        ws.vertex(ws.nth(ring, n).unwrap()).neighbor
    }

    fn assert_linked(ws: &Workspace, subject: usize, clip: usize) {
        assert_eq!(neighbor_of(ws, Ring::Subject, subject), ws.nth(Ring::Clip, clip));
        let s = ws.nth(Ring::Subject, subject).unwrap();
        assert!(ws.vertex(s).intersection);
    }

    #[test]
    fn disjoint() {
        let mut ws = Workspace::new(rect(2.0, 2.0, 4.0, 4.0), rect(12.0, 2.0, 4.0, 4.0)).unwrap();
        assert!(!ws.discover_intersections().unwrap());
        assert_eq!(ws.intersections(Ring::Subject).count(), 0);
        assert_eq!(ws.stage(), Stage::Discovered);
    }

    #[test]
    fn nested() {
        let mut ws = Workspace::new(rect(2.0, 2.0, 4.0, 4.0), rect(2.0, 2.0, 2.0, 2.0)).unwrap();
        assert!(!ws.discover_intersections().unwrap());
    }

    #[test]
    fn overlapping() {
        let ws = discovered(rect(2.0, 2.0, 4.0, 4.0), rect(4.0, 4.0, 4.0, 4.0));
        assert_eq!(ws.ring_len(Ring::Subject), 6);
        assert_eq!(ws.ring_len(Ring::Clip), 6);
        assert_linked(&ws, 2, 1);
        assert_linked(&ws, 4, 5);
        assert_eq!(ws.point(ws.nth(Ring::Subject, 2).unwrap()), Point::new(4.0, 2.0));
        assert_eq!(ws.point(ws.nth(Ring::Subject, 4).unwrap()), Point::new(2.0, 4.0));
    }

    #[test]
    fn adjacent() {
        let ws = discovered(rect(2.0, 2.0, 4.0, 4.0), rect(2.0, 6.0, 4.0, 4.0));
        assert_eq!(ws.ring_len(Ring::Subject), 4);
        assert_eq!(ws.ring_len(Ring::Clip), 4);
        assert_linked(&ws, 2, 1);
        assert_linked(&ws, 3, 0);
    }

    #[test]
    fn overlapping_border() {
        let ws = discovered(rect(2.0, 2.0, 4.0, 4.0), rect(3.0, 6.0, 4.0, 4.0));
        assert_eq!(ws.ring_len(Ring::Subject), 5);
        assert_eq!(ws.ring_len(Ring::Clip), 5);
        assert_linked(&ws, 2, 1);
        assert_linked(&ws, 3, 0);
        assert_eq!(ws.point(ws.nth(Ring::Subject, 3).unwrap()), Point::new(1.0, 4.0));
        assert_eq!(ws.point(ws.nth(Ring::Clip, 1).unwrap()), Point::new(4.0, 4.0));
    }

    #[test]
    fn touching_corners() {
        let ws = discovered(rect(2.0, 2.0, 4.0, 4.0), rect(6.0, 6.0, 4.0, 4.0));
        assert_eq!(ws.ring_len(Ring::Subject), 4);
        assert_linked(&ws, 2, 0);
        assert_eq!(ws.intersections(Ring::Clip).count(), 1);
    }

    #[test]
    fn apex_on_edge() {
        let tri = vec![(1.0, 1.0), (3.0, 1.0), (2.0, 4.0)];
        let ws = discovered(tri, rect(2.0, 2.0, 4.0, 4.0));
        assert_eq!(ws.ring_len(Ring::Subject), 3);
        assert_eq!(ws.ring_len(Ring::Clip), 5);
        assert_linked(&ws, 2, 3);
        let clone = ws.nth(Ring::Clip, 3).unwrap();
        assert_eq!(ws.vertex(clone).alpha, 0.5);
    }

    #[test]
    fn touch_plans() {
        let [s0, s1, c0, c1] = [0, 1, 2, 3].map(VertexIdx);
        let verts = [s0, s1, c0, c1];
        let no_bits = || Coincidence::empty();

        let touch = |alpha_p, alpha_q| Intersection::Touch { alpha_p, alpha_q };
        assert_eq!(
            plan(touch(0.5, 1.0), no_bits, verts).as_slice(),
            [Action::Clone {
                from: c1,
                before: s0,
                after: s1
            }]
        );
        assert_eq!(
            plan(touch(1.0, 0.25), no_bits, verts).as_slice(),
            [Action::Clone {
                from: s1,
                before: c0,
                after: c1
            }]
        );
        assert_eq!(
            plan(touch(1.0, 1.0), no_bits, verts).as_slice(),
            [Action::Link(s1, c1)]
        );
    }

    #[test]
    fn coincide_plans() {
        let [s0, s1, c0, c1] = [0, 1, 2, 3].map(VertexIdx);
        let verts = [s0, s1, c0, c1];
        let bits = || Coincidence::B_ON_CD | Coincidence::D_ON_AB | Coincidence::A_ON_CD;
        assert_eq!(
            plan(Intersection::Coincide, bits, verts).as_slice(),
            [
                Action::Clone {
                    from: s1,
                    before: c0,
                    after: c1
                },
                Action::Clone {
                    from: c1,
                    before: s0,
                    after: s1
                },
            ]
        );

        let bits = || Coincidence::A_IS_C | Coincidence::B_IS_D;
        assert_eq!(
            plan(Intersection::Coincide, bits, verts).as_slice(),
            [Action::Link(s0, c0), Action::Link(s1, c1)]
        );
    }

    #[test]
    fn discover_twice() {
        let mut ws = discovered(rect(2.0, 2.0, 4.0, 4.0), rect(4.0, 4.0, 4.0, 4.0));
        assert!(ws.discover_intersections().is_err());
    }
}

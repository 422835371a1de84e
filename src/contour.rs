//! The output of a boolean operation.

use kurbo::{BezPath, Shape as _};

use crate::containment::point_in_polygon;
use crate::geom::{on_segment, Point};

/// An index for a [`Contour`] within [`Contours`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Serialize)]
pub struct ContourIdx(pub usize);

/// A closed polyline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Contour {
    /// The points making up this contour.
    ///
    /// If you're drawing a contour with line segments, don't forget to close it: the last point
    /// should be connected to the first point.
    ///
    /// A contour never visits the same point twice. Different contours can
    /// touch at single points, though: the union of two squares that share
    /// only a corner is two contours meeting at that corner.
    pub points: Vec<Point>,

    /// A contour can have a parent, so that sets with holes can be represented as nested contours.
    pub parent: Option<ContourIdx>,

    /// Whether this contour is "outer" or not. A contour with no parent is "outer", and
    /// its children are not.
    ///
    /// Unlike the points' order, which is inherited from the input polygons,
    /// this tells you how to fill the contour.
    pub outer: bool,
}

impl Contour {
    /// Creates an outer contour.
    pub fn new(points: Vec<Point>) -> Self {
        Contour {
            points,
            parent: None,
            outer: true,
        }
    }

    /// Converts this contour to a closed [`BezPath`].
    pub fn to_bez_path(&self) -> BezPath {
        let mut ret = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            ret.move_to(first.to_kurbo());
            for p in points {
                ret.line_to(p.to_kurbo());
            }
            ret.close_path();
        }
        ret
    }

    /// The signed area enclosed by this contour.
    ///
    /// It's positive when the points go counter-clockwise (with the `y` axis pointing up).
    pub fn signed_area(&self) -> f64 {
        self.to_bez_path().area()
    }

    /// Do the points of this contour describe the same cycle as `points`,
    /// possibly starting from a different place?
    pub fn cyclically_equal(&self, points: &[Point]) -> bool {
        let n = self.points.len();
        if n != points.len() {
            return false;
        }
        if n == 0 {
            return true;
        }
        (0..n).any(|shift| {
            (0..n).all(|i| self.points[(i + shift) % n].close_to(&points[i]))
        })
    }
}

/// A collection of [`Contour`]s.
///
/// Can be indexed with a [`ContourIdx`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, Default)]
pub struct Contours {
    contours: Vec<Contour>,
}

impl Contours {
    /// Builds contours from the closed walks produced by a clipping traversal.
    ///
    /// A walk that comes back to a point it already visited is split there
    /// into simple loops. Loops are then nested by containment: a loop inside
    /// an odd number of others is a hole, and its parent is the innermost
    /// loop around it.
    pub fn from_rings(rings: impl IntoIterator<Item = Vec<Point>>) -> Self {
        let loops: Vec<Vec<Point>> = rings.into_iter().flat_map(split_pinches).collect();
        let enclosing: Vec<Vec<usize>> = (0..loops.len())
            .map(|i| {
                (0..loops.len())
                    .filter(|&j| j != i && inside(&loops[i], &loops[j]))
                    .collect()
            })
            .collect();
        let depth = |i: usize| enclosing[i].len();

        // Parents are strictly shallower than their children, so visiting by
        // depth pushes every parent first.
        let mut order: Vec<usize> = (0..loops.len()).collect();
        order.sort_by_key(|&i| depth(i));

        let mut loops: Vec<Option<Vec<Point>>> = loops.into_iter().map(Some).collect();
        let mut pushed: Vec<Option<ContourIdx>> = vec![None; loops.len()];
        let mut ret = Contours::default();
        for i in order {
            let Some(points) = loops[i].take() else {
                continue;
            };
            let parent = enclosing[i]
                .iter()
                .copied()
                .max_by_key(|&j| depth(j))
                .and_then(|j| pushed[j]);
            pushed[i] = Some(match parent {
                Some(parent) => ret.push_hole(parent, points),
                None => ret.push(Contour::new(points)),
            });
        }
        ret
    }

    /// Adds a contour, returning its index.
    pub fn push(&mut self, contour: Contour) -> ContourIdx {
        self.contours.push(contour);
        ContourIdx(self.contours.len() - 1)
    }

    /// Adds a hole inside the contour `parent`.
    pub fn push_hole(&mut self, parent: ContourIdx, points: Vec<Point>) -> ContourIdx {
        self.push(Contour {
            points,
            parent: Some(parent),
            outer: !self.contours[parent.0].outer,
        })
    }

    /// Moves all of `other`'s contours into this collection, keeping their nesting.
    pub fn append(&mut self, other: Contours) {
        let offset = self.contours.len();
        self.contours
            .extend(other.contours.into_iter().map(|mut c| {
                c.parent = c.parent.map(|p| ContourIdx(p.0 + offset));
                c
            }));
    }

    /// The number of contours.
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Is the result empty?
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Returns all of the contour indices, grouped by containment.
    ///
    /// For each of the inner vecs, the first element is an outer contour with
    /// no parent. All of the other contours in that inner vec lie inside that
    /// outer contour.
    pub fn grouped(&self) -> Vec<Vec<ContourIdx>> {
        let mut children = vec![Vec::new(); self.contours.len()];
        let mut top_level = Vec::new();
        for (i, contour) in self.contours.iter().enumerate() {
            if let Some(parent) = contour.parent {
                children[parent.0].push(ContourIdx(i));
            } else {
                top_level.push(ContourIdx(i));
            }
        }

        fn visit(idx: ContourIdx, children: &[Vec<ContourIdx>], acc: &mut Vec<ContourIdx>) {
            acc.push(idx);
            for &child in &children[idx.0] {
                visit(child, children, acc);
            }
        }

        top_level
            .into_iter()
            .map(|top| {
                let mut tree = Vec::new();
                visit(top, &children, &mut tree);
                tree
            })
            .collect()
    }

    /// Iterates over all of the contours.
    pub fn contours(&self) -> impl Iterator<Item = &Contour> + '_ {
        self.contours.iter()
    }

    /// The area covered by all the contours, with holes subtracted.
    pub fn area(&self) -> f64 {
        self.contours
            .iter()
            .map(|c| {
                let a = c.signed_area().abs();
                if c.outer {
                    a
                } else {
                    -a
                }
            })
            .sum()
    }
}

impl std::ops::Index<ContourIdx> for Contours {
    type Output = Contour;

    fn index(&self, index: ContourIdx) -> &Self::Output {
        &self.contours[index.0]
    }
}

// Splits a closed walk into simple loops, wherever it returns to a point it
// has already visited. Loops with fewer than three points are dropped.
fn split_pinches(points: Vec<Point>) -> Vec<Vec<Point>> {
    let mut loops = Vec::new();
    let mut walk: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        match walk.iter().position(|q| q.close_to(&p)) {
            Some(pos) => {
                // The repeated point stays on the walk, and also starts the loop.
                let mut lobe = vec![walk[pos]];
                lobe.extend(walk.split_off(pos + 1));
                loops.push(lobe);
            }
            None => walk.push(p),
        }
    }
    loops.push(walk);
    loops.retain(|l| l.len() >= 3);
    loops
}

// Is the loop `inner` inside the loop `outer`?
//
// The loops don't cross, so any point of `inner` off `outer`'s boundary
// decides it. Vertices are tried first, then edge midpoints.
fn inside(inner: &[Point], outer: &[Point]) -> bool {
    let on_outer = |p: &Point| {
        (0..outer.len()).any(|j| on_segment(p, &outer[j], &outer[(j + 1) % outer.len()]))
    };
    let n = inner.len();
    let midpoints = (0..n).map(|i| inner[i].midpoint(&inner[(i + 1) % n]));
    match inner.iter().copied().chain(midpoints).find(|p| !on_outer(p)) {
        Some(p) => point_in_polygon(outer, &p),
        None => {
            log::debug!("loop {inner:?} lies on the boundary of {outer:?}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(ps: &[(f64, f64)]) -> Vec<Point> {
        ps.iter().map(|&p| p.into()).collect()
    }

    #[test]
    fn area_and_orientation() {
        let ccw = Contour::new(pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]));
        assert_eq!(ccw.signed_area(), 16.0);

        let mut cw = ccw.clone();
        cw.points.reverse();
        assert_eq!(cw.signed_area(), -16.0);
    }

    #[test]
    fn holes() {
        let mut contours = Contours::default();
        let outer = contours.push(Contour::new(pts(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ])));
        let hole = contours.push_hole(outer, pts(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]));
        let other = contours.push(Contour::new(pts(&[(5.0, 0.0), (6.0, 0.0), (6.0, 1.0)])));

        assert!(!contours[hole].outer);
        assert_eq!(contours.grouped(), vec![vec![outer, hole], vec![other]]);
        assert_eq!(contours.area(), 16.0 - 1.0 + 0.5);
    }

    #[test]
    fn split_at_a_shared_corner() {
        let figure_eight = pts(&[
            (4.0, 4.0),
            (4.0, 8.0),
            (8.0, 8.0),
            (8.0, 4.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
            (4.0, 0.0),
        ]);
        let contours = Contours::from_rings(vec![figure_eight]);
        assert_eq!(contours.len(), 2);
        assert!(contours.contours().all(|c| c.outer && c.parent.is_none()));
        assert_eq!(contours.area(), 32.0);
    }

    #[test]
    fn nested_by_containment() {
        let hole = pts(&[(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)]);
        let outer = pts(&[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)]);
        // The hole comes first, as it might out of a traversal.
        let contours = Contours::from_rings(vec![hole.clone(), outer.clone()]);
        assert_eq!(contours.grouped(), vec![vec![ContourIdx(0), ContourIdx(1)]]);
        assert_eq!(contours[ContourIdx(0)].points, outer);
        assert_eq!(contours[ContourIdx(1)].points, hole);
        assert!(!contours[ContourIdx(1)].outer);
        assert_eq!(contours.area(), 32.0);
    }

    #[test]
    fn hole_touching_its_parent() {
        let walk = pts(&[
            (0.0, 0.0),
            (6.0, 0.0),
            (6.0, 6.0),
            (0.0, 6.0),
            (0.0, 0.0),
            (2.0, 1.0),
            (1.0, 2.0),
        ]);
        let contours = Contours::from_rings(vec![walk]);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[ContourIdx(1)].parent, Some(ContourIdx(0)));
        assert_eq!(contours.area(), 36.0 - 1.5);
    }

    #[test]
    fn spikes_are_dropped() {
        let walk = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let contours = Contours::from_rings(vec![walk]);
        assert_eq!(contours.len(), 1);
        assert!(contours[ContourIdx(0)].cyclically_equal(&pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])));
    }

    #[test]
    fn cycles() {
        let c = Contour::new(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        assert!(c.cyclically_equal(&pts(&[(1.0, 1.0), (0.0, 0.0), (1.0, 0.0)])));
        assert!(!c.cyclically_equal(&pts(&[(1.0, 1.0), (1.0, 0.0), (0.0, 0.0)])));
        assert!(!c.cyclically_equal(&pts(&[(0.0, 0.0), (1.0, 0.0)])));
    }
}

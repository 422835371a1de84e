#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod classify;
pub mod containment;
pub mod contour;
mod discover;
pub mod geom;
pub mod graph;
pub mod traverse;
pub mod validate;

#[cfg(feature = "generators")]
pub mod generators;

pub use classify::Relation;
pub use contour::{Contour, ContourIdx, Contours};
pub use geom::Point;
pub use graph::{Flag, Ring, VertexIdx, Workspace};
pub use validate::GraphInconsistency;

use crate::graph::Stage;

/// Binary operations between polygons.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    /// A point is in the union of two sets if it is in either one.
    Union,
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the difference of two sets if it is in the first but not the second.
    Difference,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Xor,
}

/// The operations that a single pass over a [`Workspace`] can compute.
///
/// Exclusive-or takes two passes, see [`BinaryOp::Xor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ClipOp {
    /// See [`BinaryOp::Union`].
    Union,
    /// See [`BinaryOp::Intersection`].
    Intersection,
    /// See [`BinaryOp::Difference`].
    Difference,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Something went wrong with a boolean operation.
pub enum Error {
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs was not a number.
    NaN,
    /// One of the inputs had fewer than three distinct points.
    TooFewPoints {
        /// The number of distinct points it had.
        len: usize,
    },
    /// The vertex graph was inconsistent.
    ///
    /// This usually means that one of the inputs intersected itself.
    Graph(GraphInconsistency),
}

impl From<GraphInconsistency> for Error {
    fn from(e: GraphInconsistency) -> Self {
        Error::Graph(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infinity => write!(f, "one of the inputs was infinite"),
            Error::NaN => write!(f, "one of the inputs had a NaN"),
            Error::TooFewPoints { len } => {
                write!(f, "one of the inputs had only {len} distinct points")
            }
            Error::Graph(e) => write!(f, "inconsistent vertex graph: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Graph(e) => Some(e),
            _ => None,
        }
    }
}

// What happened in a single clipping pass.
enum Outcome {
    // The boundaries don't meet at all.
    Untouched(Relation),
    // The boundaries meet, but never in a way that changes sides.
    Unflagged(Relation),
    Traversed(Vec<Vec<Point>>),
}

struct Pass {
    subject: Vec<Point>,
    clip: Vec<Point>,
    outcome: Outcome,
}

fn clip_pass(subject: &[Point], clip: &[Point], op: ClipOp) -> Result<Pass, Error> {
    let mut ws = Workspace::new(subject.iter().copied(), clip.iter().copied())?;
    let subject = ws.ring_points(Ring::Subject);
    let clip = ws.ring_points(Ring::Clip);

    let found = ws.discover_intersections()?;
    ws.validate_links()?;
    let relation = ws.relation();
    if !found {
        log::debug!("no intersections, {relation:?}");
        return Ok(Pass {
            subject,
            clip,
            outcome: Outcome::Untouched(relation),
        });
    }

    ws.classify(op)?;
    #[cfg(feature = "slow-asserts")]
    ws.validate_classification()?;
    #[cfg(feature = "debug-svg")]
    {
        if let Err(e) = svg::save("classified.svg", &ws.dump_svg()) {
            log::warn!("failed to write classified.svg: {e}");
        }
    }

    if ws.intersections(Ring::Subject).next().is_none() {
        log::debug!("no flagged intersections, {relation:?}");
        return Ok(Pass {
            subject,
            clip,
            outcome: Outcome::Unflagged(relation),
        });
    }

    ws.close_rings()?;
    debug_assert_eq!(ws.stage(), Stage::Closed);
    let contours = ws.extract_all(op)?;
    Ok(Pass {
        subject,
        clip,
        outcome: Outcome::Traversed(contours),
    })
}

// The result of an operation between two polygons whose boundaries don't cross.
fn resolve(op: ClipOp, relation: Relation, a: Vec<Point>, b: Vec<Point>) -> Contours {
    let mut ret = Contours::default();
    match (op, relation) {
        (ClipOp::Union, Relation::SubjectInside) => {
            ret.push(Contour::new(b));
        }
        (ClipOp::Union, Relation::ClipInside | Relation::Equal) => {
            ret.push(Contour::new(a));
        }
        (ClipOp::Union, Relation::Disjoint) => {
            ret.push(Contour::new(a));
            ret.push(Contour::new(b));
        }
        (ClipOp::Intersection, Relation::SubjectInside | Relation::Equal) => {
            ret.push(Contour::new(a));
        }
        (ClipOp::Intersection, Relation::ClipInside) => {
            ret.push(Contour::new(b));
        }
        (ClipOp::Intersection, Relation::Disjoint) => {}
        (ClipOp::Difference, Relation::SubjectInside | Relation::Equal) => {}
        (ClipOp::Difference, Relation::ClipInside) => {
            let outer = ret.push(Contour::new(a));
            ret.push_hole(outer, b);
        }
        (ClipOp::Difference, Relation::Disjoint) => {
            ret.push(Contour::new(a));
        }
    }
    ret
}

fn to_points<P: Copy + Into<Point>>(ps: &[P]) -> Vec<Point> {
    ps.iter().map(|&p| p.into()).collect()
}

/// Runs the clipping algorithm on two simple polygons.
///
/// Each polygon is given by its vertices, and is implicitly closed. Either
/// orientation is fine.
///
/// This returns `Ok(None)` if the polygons' boundaries don't meet at all. In
/// that case, the polygons are either disjoint or nested, and it's up to the
/// caller to decide what the result should be (for example, by testing a
/// vertex of each polygon with [`containment::point_in_polygon`]).
/// [`binary_op`] does that for you.
///
/// The output contours follow the input polygons' boundaries. They can touch
/// each other at single points, and holes are nested inside the contours
/// around them.
pub fn boolean_op<P: Copy + Into<Point>>(
    subject: &[P],
    clip: &[P],
    op: BinaryOp,
) -> Result<Option<Contours>, Error> {
    let a = to_points(subject);
    let b = to_points(clip);

    let passes = match op {
        BinaryOp::Union => vec![clip_pass(&a, &b, ClipOp::Union)?],
        BinaryOp::Intersection => vec![clip_pass(&a, &b, ClipOp::Intersection)?],
        BinaryOp::Difference => vec![clip_pass(&a, &b, ClipOp::Difference)?],
        BinaryOp::Xor => vec![
            clip_pass(&a, &b, ClipOp::Difference)?,
            clip_pass(&b, &a, ClipOp::Difference)?,
        ],
    };

    if passes
        .iter()
        .all(|pass| matches!(pass.outcome, Outcome::Untouched(_)))
    {
        return Ok(None);
    }
    let mut ret = Contours::default();
    for pass in passes {
        if let Outcome::Traversed(contours) = pass.outcome {
            ret.append(Contours::from_rings(contours));
        }
    }
    Ok(Some(ret))
}

/// Computes a boolean operation between two simple polygons.
///
/// This is like [`boolean_op`], except that it also takes care of the cases
/// where the polygons' boundaries don't cross: polygons that are disjoint,
/// nested, or equal. When one polygon has to be cut out of the other, the
/// result includes a hole, which is a contour with a parent.
pub fn binary_op<P: Copy + Into<Point>>(
    subject: &[P],
    clip: &[P],
    op: BinaryOp,
) -> Result<Contours, Error> {
    let a = to_points(subject);
    let b = to_points(clip);

    let single = |a: &[Point], b: &[Point], op: ClipOp| -> Result<Contours, Error> {
        let pass = clip_pass(a, b, op)?;
        Ok(match pass.outcome {
            Outcome::Traversed(contours) => Contours::from_rings(contours),
            Outcome::Untouched(relation) | Outcome::Unflagged(relation) => {
                resolve(op, relation, pass.subject, pass.clip)
            }
        })
    };

    match op {
        BinaryOp::Union => single(&a, &b, ClipOp::Union),
        BinaryOp::Intersection => single(&a, &b, ClipOp::Intersection),
        BinaryOp::Difference => single(&a, &b, ClipOp::Difference),
        BinaryOp::Xor => {
            let mut ret = single(&a, &b, ClipOp::Difference)?;
            ret.append(single(&b, &a, ClipOp::Difference)?);
            Ok(ret)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
    }

    fn pts(ps: &[(f64, f64)]) -> Vec<Point> {
        to_points(ps)
    }

    #[test]
    fn overlapping_squares() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(2.0, 2.0, 4.0);

        let union = binary_op(&a, &b, BinaryOp::Union).unwrap();
        assert_eq!(union.len(), 1);
        assert_eq!(union.area(), 28.0);

        let intersection = binary_op(&a, &b, BinaryOp::Intersection).unwrap();
        assert_eq!(intersection.len(), 1);
        assert!(intersection.contours().next().unwrap().cyclically_equal(&pts(&[
            (4.0, 2.0),
            (2.0, 2.0),
            (2.0, 4.0),
            (4.0, 4.0),
        ])));

        let difference = binary_op(&a, &b, BinaryOp::Difference).unwrap();
        assert!(difference.contours().next().unwrap().cyclically_equal(&pts(&[
            (4.0, 2.0),
            (2.0, 2.0),
            (2.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
            (4.0, 0.0),
        ])));

        let xor = binary_op(&a, &b, BinaryOp::Xor).unwrap();
        assert_eq!(xor.len(), 2);
        assert_eq!(xor.area(), 24.0);
    }

    #[test]
    fn disjoint() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 5.0, 1.0);
        assert_eq!(boolean_op(&a, &b, BinaryOp::Union), Ok(None));
        assert_eq!(boolean_op(&a, &b, BinaryOp::Xor), Ok(None));

        assert_eq!(binary_op(&a, &b, BinaryOp::Union).unwrap().len(), 2);
        assert!(binary_op(&a, &b, BinaryOp::Intersection).unwrap().is_empty());
        let diff = binary_op(&a, &b, BinaryOp::Difference).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.contours().next().unwrap().points, pts(&a));
    }

    #[test]
    fn nested() {
        let big = square(0.0, 0.0, 4.0);
        let small = square(1.0, 1.0, 2.0);

        let union = binary_op(&small, &big, BinaryOp::Union).unwrap();
        assert_eq!(union.contours().next().unwrap().points, pts(&big));

        let diff = binary_op(&big, &small, BinaryOp::Difference).unwrap();
        assert_eq!(diff.grouped(), vec![vec![ContourIdx(0), ContourIdx(1)]]);
        assert!(!diff[ContourIdx(1)].outer);
        assert_eq!(diff.area(), 12.0);

        assert!(binary_op(&small, &big, BinaryOp::Difference).unwrap().is_empty());

        let xor = binary_op(&small, &big, BinaryOp::Xor).unwrap();
        assert_eq!(xor.len(), 2);
        assert_eq!(xor[ContourIdx(1)].parent, Some(ContourIdx(0)));
        assert_eq!(xor.area(), 12.0);
    }

    #[test]
    fn equal() {
        let a = square(0.0, 0.0, 4.0);
        // The same square, listed from a different starting point.
        let b = vec![(4.0, 4.0), (0.0, 4.0), (0.0, 0.0), (4.0, 0.0)];
        assert_matches!(boolean_op(&a, &b, BinaryOp::Union), Ok(Some(c)) if c.is_empty());
        assert_eq!(binary_op(&a, &b, BinaryOp::Union).unwrap().area(), 16.0);
        assert_eq!(binary_op(&a, &b, BinaryOp::Intersection).unwrap().area(), 16.0);
        assert!(binary_op(&a, &b, BinaryOp::Difference).unwrap().is_empty());
        assert!(binary_op(&a, &b, BinaryOp::Xor).unwrap().is_empty());
    }

    #[test]
    fn bad_input() {
        let a = square(0.0, 0.0, 4.0);
        assert_eq!(
            binary_op(&a, &[(0.0, 0.0), (1.0, 0.0)], BinaryOp::Union),
            Err(Error::TooFewPoints { len: 2 })
        );
        assert_eq!(
            binary_op(&a, &[(0.0, 0.0), (1.0, f64::NAN), (1.0, 1.0)], BinaryOp::Union),
            Err(Error::NaN)
        );
    }

    #[test]
    fn error_display() {
        let e = Error::from(GraphInconsistency::Unterminated {
            start: VertexIdx(3),
        });
        insta::assert_snapshot!(e, @"inconsistent vertex graph: traversal starting from v_3 didn't terminate");
    }

    // Polygons nested inside a star-shaped polygon, by shrinking it towards its center.
    #[test]
    fn shrunken_star() {
        arbtest::arbtest(|u| {
            let (center, outer) = crate::arbitrary::star_shaped_polygon(u)?;
            let inner: Vec<Point> = outer
                .iter()
                .map(|p| p.affine(&center, 0.5))
                .collect();
            let outer_area = Contour::new(outer.clone()).signed_area().abs();
            let inner_area = Contour::new(inner.clone()).signed_area().abs();
            let close = |x: f64, y: f64| (x - y).abs() <= 1e-6 * outer_area.max(1.0);

            let union = binary_op(&inner, &outer, BinaryOp::Union).unwrap();
            assert_eq!(union.len(), 1);
            assert!(close(union.area(), outer_area));

            let intersection = binary_op(&inner, &outer, BinaryOp::Intersection).unwrap();
            assert!(close(intersection.area(), inner_area));

            let diff = binary_op(&outer, &inner, BinaryOp::Difference).unwrap();
            assert!(close(diff.area(), outer_area - inner_area));
            Ok(())
        })
        .budget_ms(200);
    }

    // Pairs of star-shaped polygons, moved close enough together that they
    // usually overlap.
    #[test]
    fn areas_add_up() {
        arbtest::arbtest(|u| {
            let (center_a, a) = crate::arbitrary::star_shaped_polygon(u)?;
            let (center_b, b) = crate::arbitrary::star_shaped_polygon(u)?;
            let dx = crate::arbitrary::float_in_range(-100.0, 100.0, u)?;
            let dy = crate::arbitrary::float_in_range(-100.0, 100.0, u)?;
            let b: Vec<Point> = b
                .iter()
                .map(|p| Point::new(p.x - center_b.x + center_a.x + dx, p.y - center_b.y + center_a.y + dy))
                .collect();

            let area = |p: &[Point]| Contour::new(p.to_vec()).signed_area().abs();
            let (area_a, area_b) = (area(&a), area(&b));
            let close = |x: f64, y: f64| (x - y).abs() <= 1e-6 * (area_a + area_b);
            let op_area = |a: &[Point], b: &[Point], op: BinaryOp| binary_op(a, b, op).unwrap().area();

            let union = op_area(&a, &b, BinaryOp::Union);
            let intersection = op_area(&a, &b, BinaryOp::Intersection);
            let a_minus_b = op_area(&a, &b, BinaryOp::Difference);
            let xor = op_area(&a, &b, BinaryOp::Xor);

            assert!(
                close(union + intersection, area_a + area_b),
                "union {union}, intersection {intersection}, areas {area_a} and {area_b}"
            );
            assert!(
                close(a_minus_b, area_a - intersection),
                "difference {a_minus_b}, intersection {intersection}, area {area_a}"
            );
            assert!(close(xor, union - intersection), "xor {xor}");
            Ok(())
        })
        .budget_ms(200);
    }
}

//! Point-in-polygon testing.

use crate::geom::{classify_intersection, Intersection, Point};

/// Is `point` inside the closed polygon with vertices `poly`, using the even-odd rule?
///
/// A horizontal ray is cast from `point` to the right, past the polygon's
/// bounding box, and each edge is classified against it. Edges are half-open
/// (their start vertex excluded), so a vertex lying on the ray is reported
/// once, as a touch by the edge arriving at it. Whether that touch counts as
/// a crossing is decided by the first following edge that leaves the ray's
/// line: if it continues in the same vertical direction as the arriving
/// edge, the boundary passed through the ray; if it turns back, the boundary
/// only grazed it. Horizontal edges lying on the ray in between are skipped.
///
/// Points lying exactly on the boundary get a definite, but unspecified, answer.
pub fn point_in_polygon(poly: &[Point], point: &Point) -> bool {
    // Start the scan at a vertex off the ray's line, so that a touch is always
    // resolved before the scan wraps around.
    let Some(start) = poly.iter().position(|v| v.y != point.y) else {
        return false;
    };

    let max_x = poly.iter().map(|v| v.x).fold(point.x, f64::max);
    let far = Point::new(max_x + 1.0, point.y);

    let n = poly.len();
    let mut crossings = 0usize;
    // The vertical direction of the edge that touched the ray, if we haven't
    // yet seen where the boundary goes next.
    let mut pending_slope: Option<f64> = None;

    for i in 0..n {
        let a = &poly[(start + i) % n];
        let b = &poly[(start + i + 1) % n];
        let dy = b.y - a.y;

        if let Some(arriving) = pending_slope {
            if dy == 0.0 {
                continue;
            }
            if arriving * dy > 0.0 {
                crossings += 1;
            }
            pending_slope = None;
            continue;
        }

        match classify_intersection(a, b, point, &far) {
            Intersection::Cross { .. } => crossings += 1,
            Intersection::Touch { .. } => pending_slope = Some(dy),
            Intersection::None | Intersection::Coincide => {}
        }
    }

    crossings % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn poly(pts: &[(f64, f64)]) -> Vec<Point> {
        pts.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn rect(cx: f64, cy: f64, w: f64, h: f64) -> Vec<Point> {
        poly(&[
            (cx - w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy - h / 2.0),
            (cx + w / 2.0, cy + h / 2.0),
            (cx - w / 2.0, cy + h / 2.0),
        ])
    }

    #[test]
    fn ray_along_top_edge() {
        assert!(!point_in_polygon(&rect(4.0, 3.0, 2.0, 2.0), &Point::new(1.5, 4.0)));
    }

    #[test]
    fn ray_along_split_top_edge() {
        let p = poly(&[(3., 2.), (5., 2.), (5., 4.), (4., 4.), (3., 4.)]);
        assert!(!point_in_polygon(&p, &Point::new(1.5, 4.0)));
    }

    #[test]
    fn ray_through_diamond_corners() {
        let diamond = poly(&[(1., 2.), (2., 3.), (3., 2.), (2., 1.)]);
        assert!(point_in_polygon(&diamond, &Point::new(2.0, 2.0)));
        assert!(!point_in_polygon(&diamond, &Point::new(0.0, 2.0)));
    }

    #[test]
    fn ray_along_edge_then_back() {
        let p = poly(&[(6., 4.), (8., 4.), (4., 0.), (4., 4.)]);
        assert!(!point_in_polygon(&p, &Point::new(3.0, 4.0)));
    }

    #[test]
    fn ray_grazing_apex() {
        let tri = poly(&[(1., 2.), (3., 2.), (2., 4.)]);
        assert!(!point_in_polygon(&tri, &Point::new(0.0, 4.0)));
    }

    #[test]
    fn ray_through_reflex_corner() {
        let pokey = poly(&[(0., 0.), (2., 0.), (2., 2.), (3., 2.), (2., 3.), (0., 3.)]);
        assert!(point_in_polygon(&pokey, &Point::new(1.0, 2.0)));
    }

    #[test]
    fn boundary_points_are_deterministic() {
        let square = rect(2.0, 2.0, 4.0, 4.0);
        // On an edge.
        assert!(!point_in_polygon(&square, &Point::new(2.0, 0.0)));
        assert!(point_in_polygon(&square, &Point::new(0.0, 2.0)));
        assert!(!point_in_polygon(&square, &Point::new(4.0, 2.0)));
        // At a vertex.
        assert!(!point_in_polygon(&square, &Point::new(0.0, 0.0)));
        assert!(!point_in_polygon(&square, &Point::new(4.0, 4.0)));
    }

    #[test]
    fn degenerate_polygon() {
        let flat = poly(&[(0., 1.), (2., 1.), (4., 1.)]);
        assert!(!point_in_polygon(&flat, &Point::new(1.0, 1.0)));
    }

    // Axis-aligned rectangles, possibly with extra vertices in the middle of
    // their edges, against points whose rays often run through vertices.
    fn rect_with_splits(x0: i32, y0: i32, w: i32, h: i32, split: bool) -> Vec<Point> {
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, (x0 + w) as f64, (y0 + h) as f64);
        let ym = (y0 + y1) / 2.0;
        let xm = (x0 + x1) / 2.0;
        if split {
            poly(&[
                (x0, y0),
                (xm, y0),
                (x1, y0),
                (x1, ym),
                (x1, y1),
                (xm, y1),
                (x0, y1),
                (x0, ym),
            ])
        } else {
            poly(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
        }
    }

    proptest! {
        #[test]
        fn matches_rectangle_bounds(
            x0 in -10i32..10,
            y0 in -10i32..10,
            w in 1i32..10,
            h in 1i32..10,
            split in any::<bool>(),
            reverse in any::<bool>(),
            px in -30i32..30,
            py in -15i32..15,
        ) {
            let mut rect = rect_with_splits(x0, y0, 2 * w, 2 * h, split);
            if reverse {
                rect.reverse();
            }
            // Half-integer x keeps the point off the vertical edges; integer y
            // lines the ray up with vertices.
            let pt = Point::new(px as f64 + 0.5, py as f64);
            let (x1, y1) = ((x0 + 2 * w) as f64, (y0 + 2 * h) as f64);
            let inside_x = pt.x > x0 as f64 && pt.x < x1;
            prop_assume!(!(inside_x && (pt.y == y0 as f64 || pt.y == y1)));
            let inside = inside_x && pt.y > y0 as f64 && pt.y < y1;
            prop_assert_eq!(point_in_polygon(&rect, &pt), inside);
        }
    }
}

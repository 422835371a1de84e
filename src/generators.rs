//! Utilities for generating examples, benchmarks, and test cases.

use std::f64::consts::PI;

use crate::Point;

type Polygon = Vec<Point>;

fn poly(ps: &[(f64, f64)]) -> Polygon {
    ps.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

/// An axis-aligned rectangle centered at `(cx, cy)`, listed counter-clockwise
/// starting from the bottom-left corner.
pub fn rect(cx: f64, cy: f64, w: f64, h: f64) -> Polygon {
    let (x0, y0, x1, y1) = (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
    poly(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

/// Like [`rect`], but listed clockwise, starting from the bottom-left corner.
pub fn rect_cw(cx: f64, cy: f64, w: f64, h: f64) -> Polygon {
    let (x0, y0, x1, y1) = (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
    poly(&[(x0, y0), (x0, y1), (x1, y1), (x1, y0)])
}

/// A rectangle with a triangular spike poking out to the right, whose
/// reflex corner lines up with the rectangle's edges.
pub fn pokey() -> Polygon {
    poly(&[(0., 0.), (2., 0.), (2., 2.), (3., 2.), (2., 3.), (0., 3.)])
}

/// The example pair from Kim and Kim's paper on clipping degenerate polygons.
///
/// The first polygon is the subject, with several vertices lying on the
/// second polygon's boundary and one edge running along it.
pub fn kim_kim() -> (Polygon, Polygon) {
    let subject = poly(&[
        (2., 0.),
        (2., 1.),
        (0., 2.),
        (2., 3.),
        (2., 5.),
        (4., 6.),
        (2., 7.),
        (6., 7.),
        (9., 2.),
        (5., 2.),
        (5., -2.),
        (4., 0.),
    ]);
    let clip = poly(&[(0., 0.), (6., 0.), (6., 7.), (0., 4.)]);
    (subject, clip)
}

/// A star with `n` points, alternating between radius `outer` and `inner`.
pub fn star(center: Point, n: usize, inner: f64, outer: f64) -> Polygon {
    (0..2 * n)
        .map(|i| {
            let angle = i as f64 * PI / n as f64;
            let r = if i % 2 == 0 { outer } else { inner };
            Point::new(center.x + r * angle.cos(), center.y + r * angle.sin())
        })
        .collect()
}

/// A comb with `n` teeth, and a bar that crosses all of them.
///
/// ```text
///  _   _   _
/// | | | | | |
/// |-+-+-+-+-|
/// |-+-+-+-+-|
/// | |_| |_| |
/// |_________|
/// ```
///
/// If `slant` is non-zero, the right-hand end of the bar is raised by
/// `slant`, so that none of its edges are horizontal.
pub fn comb(n: usize, slant: f64) -> (Polygon, Polygon) {
    assert!(n >= 1);
    let right = 20.0 * (n - 1) as f64 + 10.0;

    let mut teeth = vec![Point::new(0.0, 0.0), Point::new(right, 0.0)];
    for i in (0..n).rev() {
        let x0 = 20.0 * i as f64;
        let x1 = x0 + 10.0;
        teeth.push(Point::new(x1, 100.0));
        teeth.push(Point::new(x0, 100.0));
        if i > 0 {
            teeth.push(Point::new(x0, 10.0));
            teeth.push(Point::new(x0 - 10.0, 10.0));
        }
    }

    let bar = poly(&[
        (-5.0, 40.0),
        (right + 5.0, 40.0 + slant),
        (right + 5.0, 60.0 + slant),
        (-5.0, 60.0),
    ]);
    (teeth, bar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Contour;

    #[test]
    fn orientations() {
        assert!(Contour::new(rect(0.0, 0.0, 2.0, 2.0)).signed_area() > 0.0);
        assert!(Contour::new(rect_cw(0.0, 0.0, 2.0, 2.0)).signed_area() < 0.0);
        assert_eq!(Contour::new(pokey()).signed_area(), 6.5);
    }

    #[test]
    fn comb_shape() {
        let (teeth, bar) = comb(3, 0.0);
        assert_eq!(teeth.len(), 4 * 3);
        assert_eq!(bar.len(), 4);
        // Three teeth of 10x90, on a 50x10 base.
        assert_eq!(Contour::new(teeth).signed_area(), 3.0 * 900.0 + 500.0);
    }
}

//! Utilities for fuzz and/or property testing using `arbitrary`.

use std::f64::consts::PI;

use arbitrary::Unstructured;

use crate::geom::Point;

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

fn point(u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(-1e3, 1e3, u)?,
        float_in_range(-1e3, 1e3, u)?,
    ))
}

/// Generate a point with small integer coordinates.
///
/// Polygons built out of these have lots of shared vertices and collinear
/// edges.
pub fn lattice_point(u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    let x: i8 = u.int_in_range(-8..=8)?;
    let y: i8 = u.int_in_range(-8..=8)?;
    Ok(Point::new(x as f64, y as f64))
}

/// Generate a simple polygon that is star-shaped with respect to a center point.
///
/// Returns the center and the polygon's vertices, in counter-clockwise order.
/// The polygon's vertices are on distinct rays from the center, and
/// neighboring rays are less than half a turn apart, so every segment from
/// the center to the boundary stays inside the polygon.
pub fn star_shaped_polygon(
    u: &mut Unstructured<'_>,
) -> Result<(Point, Vec<Point>), arbitrary::Error> {
    let center = point(u)?;
    let n: usize = u.int_in_range(4..=24)?;
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let jitter = float_in_range(0.25, 0.75, u)?;
        let angle = (i as f64 + jitter) / n as f64 * 2.0 * PI;
        let radius = float_in_range(1.0, 100.0, u)?;
        points.push(Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        ));
    }
    Ok((center, points))
}

/// Generate a rectangle with lattice corners, listed in either orientation.
pub fn lattice_rect(u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let p = lattice_point(u)?;
    let w: u8 = u.int_in_range(1..=8)?;
    let h: u8 = u.int_in_range(1..=8)?;
    let (x0, y0, x1, y1) = (p.x, p.y, p.x + w as f64, p.y + h as f64);
    let mut ret = vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ];
    if u.arbitrary()? {
        ret.reverse();
    }
    Ok(ret)
}

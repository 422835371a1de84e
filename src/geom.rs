//! Geometric primitives: points, and the segment predicates that the clipper
//! is built on.

use std::f64::consts::PI;

use kurbo::Rect;

/// Two coordinates closer than this are considered equal.
///
/// This is only used where the algorithm needs a tolerant comparison
/// (equality of segment endpoints, and choosing an axis to measure alpha
/// along). The intersection classifier itself uses exact comparisons.
pub const COMPARE_EPSILON: f64 = 1e-9;

/// A two-dimensional point.
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite());
        debug_assert!(y.is_finite());
        Point { x, y }
    }

    /// Compute an affine combination between `self` and `other`; that is, `(1 - t) * self + t * other`.
    pub fn affine(&self, other: &Self, t: f64) -> Self {
        Point {
            x: (1.0 - t) * self.x + t * other.x,
            y: (1.0 - t) * self.y + t * other.y,
        }
    }

    /// The point halfway between `self` and `other`.
    pub fn midpoint(&self, other: &Self) -> Self {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Are both coordinates within [`COMPARE_EPSILON`] of `other`'s?
    pub fn close_to(&self, other: &Self) -> bool {
        close(self.x, other.x) && close(self.y, other.y)
    }

    /// Converts to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    fn angle_from(&self, origin: &Point) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < COMPARE_EPSILON
}

/// How two segments meet.
///
/// Segments are half-open: the start point is excluded and the end point is
/// included. When every edge of a closed polygon is tested, each vertex
/// therefore gets reported at most once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intersection {
    /// The segments don't meet (or they meet only at an excluded start point).
    None,
    /// The segments cross at a point interior to both.
    Cross {
        /// Position along the first segment, strictly between 0 and 1.
        alpha_p: f64,
        /// Position along the second segment, strictly between 0 and 1.
        alpha_q: f64,
    },
    /// The end point of at least one segment lies on the other segment.
    ///
    /// At least one of the alphas is exactly 1.
    Touch {
        /// Position along the first segment.
        alpha_p: f64,
        /// Position along the second segment.
        alpha_q: f64,
    },
    /// The segments are collinear and overlap.
    Coincide,
}

const OUT_LEFT: u8 = 1 << 3;
const OUT_RIGHT: u8 = 1 << 2;
const OUT_BOTTOM: u8 = 1 << 1;
const OUT_TOP: u8 = 1 << 0;

// Cohen-Sutherland style region code of `p` relative to `window`.
fn outcode(p: &Point, window: &Rect) -> u8 {
    let mut code = 0;
    if p.x < window.x0 {
        code |= OUT_LEFT;
    }
    if p.x > window.x1 {
        code |= OUT_RIGHT;
    }
    if p.y < window.y0 {
        code |= OUT_BOTTOM;
    }
    if p.y > window.y1 {
        code |= OUT_TOP;
    }
    code
}

// The window-edge coordinate: a signed multiple of the distance from `a` to
// the line through `c` with direction `c - d`, measured relative to `b`.
fn window_edge_coord(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    (a.y - b.y) * (c.x - d.x) - (a.x - b.x) * (c.y - d.y)
}

/// Classifies how the segment `p1 -> p2` meets the segment `q1 -> q2`.
///
/// `p1` and `q1` are excluded from their segments, `p2` and `q2` are
/// included. See [`Intersection`] for the possible outcomes.
pub fn classify_intersection(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> Intersection {
    let window = Rect::from_points(q1.to_kurbo(), q2.to_kurbo());
    if outcode(p1, &window) & outcode(p2, &window) != 0 {
        return Intersection::None;
    }

    let wec_p1 = window_edge_coord(p1, q1, q2, q1);
    let wec_p2 = window_edge_coord(p2, q1, q2, q1);
    if wec_p1 * wec_p2 > 0.0 {
        return Intersection::None;
    }

    let wec_q1 = window_edge_coord(q1, p1, p2, p1);
    let wec_q2 = window_edge_coord(q2, p1, p2, p1);
    if wec_q1 * wec_q2 > 0.0 {
        return Intersection::None;
    }

    let alpha_p = wec_p1 / (wec_p1 - wec_p2);
    let alpha_q = wec_q1 / (wec_q1 - wec_q2);

    match (alpha_p.is_nan(), alpha_q.is_nan()) {
        (true, true) => return Intersection::Coincide,
        // Only possible for a segment of zero length.
        (true, false) | (false, true) => return Intersection::None,
        (false, false) => {}
    }

    if alpha_p == 0.0 || alpha_q == 0.0 {
        Intersection::None
    } else if alpha_p == 1.0 || alpha_q == 1.0 {
        Intersection::Touch { alpha_p, alpha_q }
    } else {
        Intersection::Cross { alpha_p, alpha_q }
    }
}

/// Which endpoints of two overlapping collinear segments `ab` and `cd`
/// lie on, or coincide with, the other segment.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Coincidence(u8);

impl Coincidence {
    /// `a` is strictly inside `cd`.
    pub const A_ON_CD: Coincidence = Coincidence(1 << 3);
    /// `b` is strictly inside `cd`.
    pub const B_ON_CD: Coincidence = Coincidence(1 << 2);
    /// `c` is strictly inside `ab`.
    pub const C_ON_AB: Coincidence = Coincidence(1 << 1);
    /// `d` is strictly inside `ab`.
    pub const D_ON_AB: Coincidence = Coincidence(1 << 0);
    /// `a` and `c` are the same point.
    pub const A_IS_C: Coincidence = Coincidence(1 << 7);
    /// `a` and `d` are the same point.
    pub const A_IS_D: Coincidence = Coincidence(1 << 6);
    /// `b` and `c` are the same point.
    pub const B_IS_C: Coincidence = Coincidence(1 << 5);
    /// `b` and `d` are the same point.
    pub const B_IS_D: Coincidence = Coincidence(1 << 4);

    const NAMES: [(Coincidence, &'static str); 8] = [
        (Self::A_ON_CD, "A_ON_CD"),
        (Self::B_ON_CD, "B_ON_CD"),
        (Self::C_ON_AB, "C_ON_AB"),
        (Self::D_ON_AB, "D_ON_AB"),
        (Self::A_IS_C, "A_IS_C"),
        (Self::A_IS_D, "A_IS_D"),
        (Self::B_IS_C, "B_IS_C"),
        (Self::B_IS_D, "B_IS_D"),
    ];

    /// The empty set.
    pub fn empty() -> Self {
        Coincidence(0)
    }

    /// Are all the bits of `other` set in `self`?
    pub fn contains(self, other: Coincidence) -> bool {
        self.0 & other.0 == other.0
    }

    /// Are no bits set?
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Coincidence {
    type Output = Coincidence;

    fn bitor(self, rhs: Coincidence) -> Coincidence {
        Coincidence(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Coincidence {
    fn bitor_assign(&mut self, rhs: Coincidence) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Debug for Coincidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = f.debug_set();
        for (bit, name) in Self::NAMES {
            if self.contains(bit) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

// Is `a` strictly between `c` and `d` in either coordinate? For collinear
// points, that's the same as being strictly inside the segment.
fn strictly_between(a: &Point, c: &Point, d: &Point) -> bool {
    let in_range = |v: f64, lo: f64, hi: f64| (v > lo && v < hi) || (v > hi && v < lo);
    in_range(a.x, c.x, d.x) || in_range(a.y, c.y, d.y)
}

/// Classifies the endpoints of two collinear, overlapping segments `ab` and `cd`.
pub fn line_coincidence_bits(a: &Point, b: &Point, c: &Point, d: &Point) -> Coincidence {
    debug_assert!(!a.close_to(b));
    debug_assert!(!c.close_to(d));

    let mut bits = Coincidence::empty();
    if strictly_between(a, c, d) {
        bits |= Coincidence::A_ON_CD;
    }
    if strictly_between(b, c, d) {
        bits |= Coincidence::B_ON_CD;
    }
    if strictly_between(c, a, b) {
        bits |= Coincidence::C_ON_AB;
    }
    if strictly_between(d, a, b) {
        bits |= Coincidence::D_ON_AB;
    }
    if a.close_to(c) {
        bits |= Coincidence::A_IS_C;
    }
    if b.close_to(c) {
        bits |= Coincidence::B_IS_C;
    }
    if a.close_to(d) {
        bits |= Coincidence::A_IS_D;
    }
    if b.close_to(d) {
        bits |= Coincidence::B_IS_D;
    }
    bits
}

/// The parametric position of `point` along the segment `start -> finish`.
///
/// `point` is assumed to lie on the segment. The position is measured along
/// `x` unless the segment is vertical, in which case it is measured along `y`.
/// Returns `None` for a zero-length segment.
pub fn calc_alpha(point: &Point, start: &Point, finish: &Point) -> Option<f64> {
    let dx = finish.x - start.x;
    let dy = finish.y - start.y;
    if !close(dx, 0.0) {
        Some((point.x - start.x) / dx)
    } else if !close(dy, 0.0) {
        Some((point.y - start.y) / dy)
    } else {
        None
    }
}

/// Does `point` lie on the closed segment `start -> finish`, up to [`COMPARE_EPSILON`]?
pub fn on_segment(point: &Point, start: &Point, finish: &Point) -> bool {
    let (dx, dy) = (finish.x - start.x, finish.y - start.y);
    let within = |v: f64, a: f64, b: f64| {
        a.min(b) - COMPARE_EPSILON <= v && v <= a.max(b) + COMPARE_EPSILON
    };
    if !within(point.x, start.x, finish.x) || !within(point.y, start.y, finish.y) {
        return false;
    }
    let cross = dx * (point.y - start.y) - dy * (point.x - start.x);
    cross.abs() <= COMPARE_EPSILON * dx.hypot(dy).max(1.0)
}

// Is the direction `t` within the counter-clockwise sweep from `a` to `b`?
fn angle_between(a: f64, mut b: f64, mut t: f64) -> bool {
    if b < a {
        b += 2.0 * PI;
    }
    if t < a {
        t += 2.0 * PI;
    }
    t <= b
}

/// Do two boundaries meeting at `at` run the same way around it?
///
/// Polygon A arrives from `a_prev` and leaves towards `a_next`; polygon B
/// arrives from `b_prev` and leaves towards `b_next`. The line
/// `a_prev -> at -> b_next` splits the plane into two sectors, and the
/// boundaries run the same way if `a_next` and `b_prev` are on the same side.
pub fn same_way(a_prev: &Point, a_next: &Point, b_prev: &Point, b_next: &Point, at: &Point) -> bool {
    let a_p = a_prev.angle_from(at);
    let a_n = a_next.angle_from(at);
    let b_p = b_prev.angle_from(at);
    let b_n = b_next.angle_from(at);

    angle_between(a_p, b_n, a_n) == angle_between(a_p, b_n, b_p)
}

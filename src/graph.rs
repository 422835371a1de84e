//! The vertex graph that both input polygons get merged into.
//!
//! Each polygon is a doubly-linked list of vertices. All the vertices of both
//! polygons, and every intersection vertex created along the way, live in a
//! single arena owned by a [`Workspace`], and the links between them are
//! arena indices. Intersection vertices come in pairs, one on each polygon,
//! joined by their `neighbor` links.
//!
//! The lists start out open: the head of each polygon has no `prev`, and its
//! last vertex has no `next`. They stay that way through intersection
//! discovery and classification, and are closed into cycles just before
//! traversal.

use crate::{geom::Point, validate::GraphInconsistency, Error};

/// An index into the vertex arena of a [`Workspace`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIdx(pub usize);

/// A vector indexed by [`VertexIdx`].
#[derive(Clone)]
pub struct VertexVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(VertexVec, VertexIdx, "v");

pub(crate) fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2)
        .map(|pair| (&pair[0], &pair[1]))
        .chain(xs.last().zip(xs.first()))
}

/// Which of the two input polygons a vertex belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Ring {
    /// The first operand.
    Subject,
    /// The second operand.
    Clip,
}

impl Ring {
    /// The other polygon.
    pub fn other(self) -> Ring {
        match self {
            Ring::Subject => Ring::Clip,
            Ring::Clip => Ring::Subject,
        }
    }
}

/// The classification of an intersection vertex.
///
/// Entry and exit are relative to the *other* polygon, when walking forward
/// along this vertex's polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Flag {
    /// Not a meaningful intersection, or already consumed by traversal.
    None,
    /// The boundary goes from outside the other polygon to inside it.
    Entry,
    /// The boundary goes from inside the other polygon to outside it.
    Exit,
    /// The boundary arrives from outside and leaves to the outside, touching
    /// the other polygon at this vertex.
    EntryExit,
    /// The boundary arrives from inside and leaves to the inside, touching
    /// the other polygon's boundary from within.
    ExitEntry,
}

impl Flag {
    /// Is this one of the two-sided flags, `EntryExit` or `ExitEntry`?
    pub fn is_double(self) -> bool {
        matches!(self, Flag::EntryExit | Flag::ExitEntry)
    }
}

/// A single polygon vertex, either original or created at an intersection.
#[derive(Clone, Debug)]
pub struct Vertex {
    /// Where it is.
    pub point: Point,
    /// The polygon that this vertex belongs to.
    pub ring: Ring,
    /// The following vertex on the same polygon.
    pub next: Option<VertexIdx>,
    /// The preceding vertex on the same polygon.
    pub prev: Option<VertexIdx>,
    /// Does this vertex represent an intersection between the two polygons?
    pub intersection: bool,
    /// The vertex on the other polygon that represents the same intersection.
    pub neighbor: Option<VertexIdx>,
    /// For vertices created on an edge, the relative position along that edge.
    ///
    /// This is zero for the original vertices of a polygon.
    pub alpha: f64,
    /// The classification, once it has been computed.
    pub flag: Flag,
    /// An adjacent vertex with the same flag, with which this one represents
    /// a single tangential touch.
    pub couple: Option<VertexIdx>,
    /// For two-sided flags, whether the polygons wind in opposite directions here.
    ///
    /// Informational only; traversal doesn't consult it.
    pub cross_change: bool,
}

impl Vertex {
    fn new(point: Point, ring: Ring) -> Self {
        Vertex {
            point,
            ring,
            next: None,
            prev: None,
            intersection: false,
            neighbor: None,
            alpha: 0.0,
            flag: Flag::None,
            couple: None,
            cross_change: false,
        }
    }
}

/// How far along a [`Workspace`] has been processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Freshly built from the input polygons.
    Built,
    /// Intersections have been found and linked.
    Discovered,
    /// Every intersection has been flagged.
    Classified,
    /// The polygon lists have been closed into cycles, ready for traversal.
    Closed,
}

/// The working graph of a single clipping operation.
///
/// A workspace is built from the two input polygons and then driven through
/// [`discover_intersections`](Workspace::discover_intersections),
/// [`classify`](Workspace::classify),
/// [`close_rings`](Workspace::close_rings), and finally
/// [`extract_contour`](Workspace::extract_contour) until that returns `None`.
#[derive(Clone, Debug)]
pub struct Workspace {
    pub(crate) verts: VertexVec<Vertex>,
    subject: VertexIdx,
    clip: VertexIdx,
    pub(crate) stage: Stage,
}

impl Workspace {
    /// Builds a workspace from the vertices of two simple polygons.
    ///
    /// The polygons are implicitly closed: the last point connects back to the
    /// first. Repeated consecutive points (including a last point that repeats
    /// the first) are dropped.
    pub fn new<P, Q>(
        subject: impl IntoIterator<Item = P>,
        clip: impl IntoIterator<Item = Q>,
    ) -> Result<Self, Error>
    where
        P: Into<Point>,
        Q: Into<Point>,
    {
        let mut ws = Workspace {
            verts: VertexVec::default(),
            subject: VertexIdx(0),
            clip: VertexIdx(0),
            stage: Stage::Built,
        };
        ws.subject = ws.push_ring(Ring::Subject, subject.into_iter().map(Into::into))?;
        ws.clip = ws.push_ring(Ring::Clip, clip.into_iter().map(Into::into))?;
        Ok(ws)
    }

    fn push_ring(
        &mut self,
        ring: Ring,
        points: impl Iterator<Item = Point>,
    ) -> Result<VertexIdx, Error> {
        let mut head = None;
        let mut tail: Option<VertexIdx> = None;
        let mut len = 0;
        for p in points {
            if p.x.is_nan() || p.y.is_nan() {
                return Err(Error::NaN);
            }
            if p.x.is_infinite() || p.y.is_infinite() {
                return Err(Error::Infinity);
            }
            if tail.is_some_and(|t| self.verts[t].point == p) {
                continue;
            }
            let v = self.append_point(ring, tail, p);
            head.get_or_insert(v);
            tail = Some(v);
            len += 1;
        }

        if let (Some(h), Some(t)) = (head, tail) {
            if len > 1 && self.verts[h].point == self.verts[t].point {
                self.remove_tail(t);
                len -= 1;
            }
        }
        match head {
            Some(h) if len >= 3 => Ok(h),
            _ => Err(Error::TooFewPoints { len }),
        }
    }

    // Detaches the last vertex of a list that is still being built. The
    // vertex stays in the arena, but nothing refers to it.
    fn remove_tail(&mut self, tail: VertexIdx) {
        if let Some(prev) = self.verts[tail].prev.take() {
            self.verts[prev].next = None;
        }
    }

    /// Appends a new original vertex after `tail`, or starts a new list if
    /// `tail` is `None`. Returns the new vertex, which is the list's new tail.
    pub(crate) fn append_point(
        &mut self,
        ring: Ring,
        tail: Option<VertexIdx>,
        point: Point,
    ) -> VertexIdx {
        let v = self.verts.push(Vertex::new(point, ring));
        if let Some(tail) = tail {
            debug_assert!(self.verts[tail].next.is_none());
            self.insert_after(tail, v);
        }
        v
    }

    /// Adds a new, unlinked intersection vertex to the arena.
    pub(crate) fn alloc_intersection(&mut self, ring: Ring, point: Point, alpha: f64) -> VertexIdx {
        let mut v = Vertex::new(point, ring);
        v.alpha = alpha;
        v.intersection = true;
        self.verts.push(v)
    }

    /// Splices the unlinked vertex `v` in immediately after `anchor`.
    pub(crate) fn insert_after(&mut self, anchor: VertexIdx, v: VertexIdx) {
        debug_assert!(self.verts[v].next.is_none() && self.verts[v].prev.is_none());

        let after = self.verts[anchor].next;
        self.verts[v].prev = Some(anchor);
        self.verts[v].next = after;
        if let Some(after) = after {
            self.verts[after].prev = Some(v);
        }
        self.verts[anchor].next = Some(v);
    }

    /// Inserts the intersection vertex `v` somewhere after the original vertex
    /// `p1` and before the original vertex `p2`, keeping the intersections on
    /// that edge sorted by increasing alpha.
    pub(crate) fn sorted_insert(
        &mut self,
        p1: VertexIdx,
        p2: VertexIdx,
        v: VertexIdx,
    ) -> Result<(), GraphInconsistency> {
        let alpha = self.verts[v].alpha;
        let mut j = p1;
        loop {
            let here = &self.verts[j];
            let fits_after = !here.intersection || here.alpha <= alpha;
            let fits_before = here.next.map_or(true, |n| {
                let n = &self.verts[n];
                !n.intersection || n.alpha >= alpha
            });
            if fits_after && fits_before {
                break;
            }
            match here.next {
                Some(n) if n != p2 => j = n,
                _ => return Err(GraphInconsistency::UnsortedAlpha { vertex: v }),
            }
        }
        self.insert_after(j, v);
        Ok(())
    }

    /// Makes `a` and `b` each other's neighbors.
    ///
    /// Linking a pair that is already linked is harmless, but either vertex
    /// being linked to some third vertex is an error.
    pub(crate) fn link_neighbors(
        &mut self,
        a: VertexIdx,
        b: VertexIdx,
    ) -> Result<(), GraphInconsistency> {
        for (x, y) in [(a, b), (b, a)] {
            if self.verts[x].neighbor.is_some_and(|n| n != y) {
                return Err(GraphInconsistency::ConflictingNeighbor { vertex: x });
            }
        }
        self.verts[a].neighbor = Some(b);
        self.verts[b].neighbor = Some(a);
        Ok(())
    }

    /// Severs the neighbor link of `v`, on both sides.
    pub(crate) fn unlink_neighbors(&mut self, v: VertexIdx) {
        if let Some(n) = self.verts[v].neighbor.take() {
            self.verts[n].neighbor = None;
        }
    }

    /// The stage that this workspace has reached.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn expect_stage(&self, expected: Stage) -> Result<(), GraphInconsistency> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(GraphInconsistency::PhaseOrder {
                expected,
                found: self.stage,
            })
        }
    }

    /// The first vertex of one of the polygons.
    pub fn head(&self, ring: Ring) -> VertexIdx {
        match ring {
            Ring::Subject => self.subject,
            Ring::Clip => self.clip,
        }
    }

    /// Looks up a vertex.
    pub fn vertex(&self, idx: VertexIdx) -> &Vertex {
        &self.verts[idx]
    }

    /// The location of a vertex.
    pub fn point(&self, idx: VertexIdx) -> Point {
        self.verts[idx].point
    }

    /// Iterates over the vertices of one polygon, in order, starting from its head.
    pub fn ring(&self, ring: Ring) -> RingIter<'_> {
        let head = self.head(ring);
        RingIter {
            ws: self,
            head,
            next: Some(head),
        }
    }

    /// The number of vertices (original and intersection) in one polygon.
    pub fn ring_len(&self, ring: Ring) -> usize {
        self.ring(ring).count()
    }

    /// The locations of all the vertices of one polygon, in order.
    pub fn ring_points(&self, ring: Ring) -> Vec<Point> {
        self.ring(ring).map(|v| self.verts[v].point).collect()
    }

    /// The vertex at position `n` of a polygon, counting from its head.
    pub fn nth(&self, ring: Ring, n: usize) -> Option<VertexIdx> {
        self.ring(ring).nth(n)
    }

    /// The last vertex of a polygon.
    pub fn last(&self, ring: Ring) -> VertexIdx {
        let head = self.head(ring);
        if let Some(prev) = self.verts[head].prev {
            // Already closed into a cycle.
            return prev;
        }
        let mut v = head;
        while let Some(n) = self.verts[v].next {
            if n == head {
                break;
            }
            v = n;
        }
        v
    }

    /// The vertex following `v`, wrapping from the end of an open list back to its head.
    pub fn wrapping_next(&self, v: VertexIdx) -> VertexIdx {
        let vert = &self.verts[v];
        vert.next.unwrap_or_else(|| self.head(vert.ring))
    }

    /// The vertex preceding `v`, wrapping from the head of an open list to its end.
    pub fn wrapping_prev(&self, v: VertexIdx) -> VertexIdx {
        let vert = &self.verts[v];
        vert.prev.unwrap_or_else(|| self.last(vert.ring))
    }

    /// Starting at `from` (inclusive), finds the first intersection vertex.
    ///
    /// Returns `None` upon reaching the end of an open list, or upon coming
    /// back around to `from` in a closed one.
    pub fn next_intersection(&self, from: VertexIdx) -> Option<VertexIdx> {
        let mut v = from;
        loop {
            if self.verts[v].intersection {
                return Some(v);
            }
            v = self.verts[v].next?;
            if v == from {
                return None;
            }
        }
    }

    /// Iterates over the intersection vertices of one polygon.
    pub fn intersections(&self, ring: Ring) -> impl Iterator<Item = VertexIdx> + '_ {
        self.ring(ring).filter(|&v| self.verts[v].intersection)
    }

    /// Closes both polygon lists into cycles, in preparation for traversal.
    pub fn close_rings(&mut self) -> Result<(), GraphInconsistency> {
        self.expect_stage(Stage::Classified)?;
        for ring in [Ring::Subject, Ring::Clip] {
            let head = self.head(ring);
            let last = self.last(ring);
            self.verts[last].next = Some(head);
            self.verts[head].prev = Some(last);
        }
        self.stage = Stage::Closed;
        Ok(())
    }

    /// Renders both polygons, marking their intersection vertices.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Circle, Path};

        let all: Vec<Point> = self.verts.iter().map(|(_, v)| v.point).collect();
        let min_x = all.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = all.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = all.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = all.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let pad = 1.0 + (max_x - min_x).max(max_y - min_y) / 16.0;
        let stroke_width = (max_x - min_x).max(max_y - min_y) / 256.0;

        let mut document = svg::Document::new().set(
            "viewBox",
            (
                min_x - pad,
                min_y - pad,
                max_x - min_x + 2.0 * pad,
                max_y - min_y + 2.0 * pad,
            ),
        );

        for (ring, color) in [(Ring::Subject, "red"), (Ring::Clip, "blue")] {
            let mut points = self.ring(ring).map(|v| self.verts[v].point);
            let Some(first) = points.next() else {
                continue;
            };
            let mut data = Data::new().move_to((first.x, first.y));
            for p in points {
                data = data.line_to((p.x, p.y));
            }
            data = data.close();
            document = document.add(
                Path::new()
                    .set("d", data)
                    .set("stroke", color)
                    .set("stroke-width", stroke_width)
                    .set("fill", "none")
                    .set("opacity", 0.5),
            );

            for v in self.intersections(ring) {
                let p = self.verts[v].point;
                let fill = match self.verts[v].flag {
                    Flag::None => "grey",
                    Flag::Entry => "green",
                    Flag::Exit => "orange",
                    Flag::EntryExit | Flag::ExitEntry => "purple",
                };
                document = document.add(
                    Circle::new()
                        .set("cx", p.x)
                        .set("cy", p.y)
                        .set("r", 2.0 * stroke_width)
                        .set("fill", fill),
                );
            }
        }
        document
    }
}

/// An iterator over the vertices of one polygon in a [`Workspace`].
///
/// Works the same whether or not the polygon's list has been closed.
pub struct RingIter<'a> {
    ws: &'a Workspace,
    head: VertexIdx,
    next: Option<VertexIdx>,
}

impl Iterator for RingIter<'_> {
    type Item = VertexIdx;

    fn next(&mut self) -> Option<VertexIdx> {
        let cur = self.next?;
        self.next = self.ws.verts[cur].next.filter(|&n| n != self.head);
        Some(cur)
    }
}

//! Minimal planar geometry for containment tests.
//!
//! Only what the `geojson-within` predicate needs: points, simple polygons
//! described by their outer ring, and the "within" relation (the first
//! geometry has no point in the exterior of the second and their
//! interiors meet).

/// Tolerance for collinearity tests.
const EPSILON: f64 = 1e-12;

/// A position on the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate (longitude in GeoJSON).
    pub x: f64,
    /// Vertical coordinate (latitude in GeoJSON).
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, to: Self, t: f64) -> Self {
        Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

/// Where a point lies relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside.
    Inside,
    /// On an edge or vertex.
    Boundary,
    /// Strictly outside.
    Outside,
}

/// Errors building a polygon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolygonError {
    /// Fewer than three distinct vertices after dropping the closing one.
    #[error("polygon ring needs at least three distinct positions")]
    DegenerateRing,
}

/// A simple polygon given by its outer ring (no holes).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon from ring vertices. A closing vertex equal to the
    /// first one (as GeoJSON requires) is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PolygonError::DegenerateRing`] if fewer than three vertices
    /// remain.
    pub fn new(mut ring: Vec<Point>) -> Result<Self, PolygonError> {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(PolygonError::DegenerateRing);
        }
        Ok(Self { ring })
    }

    /// Ring vertices without the closing duplicate.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.ring
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.ring
            .iter()
            .copied()
            .zip(self.ring.iter().copied().cycle().skip(1))
    }

    /// Classifies `p` against this polygon.
    #[must_use]
    pub fn locate(&self, p: Point) -> Location {
        if self.edges().any(|(a, b)| on_segment(p, a, b)) {
            return Location::Boundary;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        if inside {
            Location::Inside
        } else {
            Location::Outside
        }
    }

    /// Returns `true` if `other` lies entirely inside or on the boundary of
    /// this polygon.
    fn covers(&self, other: &Self) -> bool {
        if other
            .vertices()
            .iter()
            .any(|v| self.locate(*v) == Location::Outside)
        {
            return false;
        }
        other.edges().all(|(a, b)| self.covers_segment(a, b))
    }

    fn covers_segment(&self, a: Point, b: Point) -> bool {
        if self.edges().any(|(c, d)| crosses(a, b, c, d)) {
            return false;
        }
        // Without proper crossings the segment can only leave the polygon
        // at one of our vertices, so test between consecutive touch points.
        let mut cuts = vec![0.0, 1.0];
        cuts.extend(
            self.ring
                .iter()
                .filter(|v| on_segment(**v, a, b))
                .map(|v| segment_param(*v, a, b)),
        );
        cuts.sort_by(f64::total_cmp);
        cuts.windows(2).all(|w| match w {
            [t0, t1] => self.locate(a.lerp(b, (t0 + t1) / 2.0)) != Location::Outside,
            _ => true,
        })
    }
}

/// A decoded geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Point),
    /// A polygon without holes.
    Polygon(Polygon),
}

impl Geometry {
    /// Returns `true` if `self` is topologically within `other`.
    ///
    /// A point on a polygon's boundary is not within it; a polygon is never
    /// within a point.
    #[must_use]
    pub fn within(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Point(p), Self::Point(q)) => p == q,
            (Self::Point(p), Self::Polygon(area)) => area.locate(*p) == Location::Inside,
            (Self::Polygon(_), Self::Point(_)) => false,
            (Self::Polygon(inner), Self::Polygon(outer)) => outer.covers(inner),
        }
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let scale = (b.x - a.x).abs().max((b.y - a.y).abs()).max(1.0);
    cross(a, b, p).abs() <= EPSILON * scale * scale
        && p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

fn segment_param(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
}

/// Proper crossing: the segments meet at a single point interior to both.
fn crosses(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

use geo_types::{Coord, LineString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::raster::{BoundingBox, Point};

/// Winding of a polygon as seen on screen (y pointing down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    /// Zero signed area: fewer than 3 distinct vertices or all collinear.
    Degenerate,
}

/// Ordered vertex ring; the last vertex connects back to the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

#[inline]
pub(crate) fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges of the closed ring, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..if n < 2 { 0 } else { n }).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Number of pairwise distinct vertices.
    pub fn distinct_count(&self) -> usize {
        let mut v = self.vertices.clone();
        v.sort_unstable();
        v.dedup();
        v.len()
    }

    /// Twice the shoelace sum in raster coordinates. Positive for rings that
    /// run clockwise on screen.
    pub fn doubled_signed_area(&self) -> i64 {
        self.edges().map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64).sum()
    }

    pub fn signed_area(&self) -> f64 {
        self.doubled_signed_area() as f64 / 2.0
    }

    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    pub fn orientation(&self) -> Orientation {
        match self.doubled_signed_area() {
            0 => Orientation::Degenerate,
            a if a > 0 => Orientation::Clockwise,
            _ => Orientation::CounterClockwise,
        }
    }

    /// Length of the closed ring.
    pub fn perimeter(&self) -> f64 {
        self.edges()
            .map(|(a, b)| {
                let dx = (b.x - a.x) as f64;
                let dy = (b.y - a.y) as f64;
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }

    /// `perimeter^2 / (4 pi area)`: 1 for a disc, larger for everything else.
    /// `None` for zero-area rings.
    pub fn circularity(&self) -> Option<f64> {
        let area = self.area();
        if area <= 0.0 {
            return None;
        }
        let p = self.perimeter();
        Some(p * p / (4.0 * std::f64::consts::PI * area))
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (first, rest) = self.vertices.split_first()?;
        let mut b = BoundingBox::from_point(*first);
        for p in rest {
            b.include(*p);
        }
        Some(b)
    }

    /// Whether every turn of the ring goes the same way. Rings with fewer
    /// than 3 vertices count as convex.
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return true;
        }
        let mut sign = 0i64;
        for i in 0..n {
            let c = cross(
                self.vertices[i],
                self.vertices[(i + 1) % n],
                self.vertices[(i + 2) % n],
            );
            if c == 0 {
                continue;
            }
            if sign == 0 {
                sign = c.signum();
            } else if c.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Point-in-polygon test; points on the boundary count as inside.
    pub fn contains(&self, p: Point) -> bool {
        match self.vertices.len() {
            0 => return false,
            1 => return self.vertices[0] == p,
            _ => {}
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if cross(a, b, p) == 0
                && p.x >= a.x.min(b.x)
                && p.x <= a.x.max(b.x)
                && p.y >= a.y.min(b.y)
                && p.y <= a.y.max(b.y)
            {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                // x coordinate of the edge at height p.y, compared without division
                let lhs = (p.x - a.x) as i64 * (b.y - a.y) as i64;
                let rhs = (b.x - a.x) as i64 * (p.y - a.y) as i64;
                if (b.y > a.y && lhs < rhs) || (b.y < a.y && lhs > rhs) {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(
            self.vertices
                .iter()
                .map(|p| Coord {
                    x: p.x as f64,
                    y: p.y as f64,
                })
                .collect(),
        )
    }

    /// Convert to a geo-types polygon for geometric operations
    pub fn to_geo_polygon(&self) -> geo_types::Polygon<f64> {
        geo_types::Polygon::new(self.to_line_string(), vec![])
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(vertices: Vec<Point>) -> Self {
        Self::new(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn poly(points: &[(i32, i32)]) -> Polygon {
        Polygon::new(points.iter().map(|&p| p.into()).collect())
    }

    #[test]
    fn test_area_and_orientation() {
        let cw = poly(&[(0, 0), (4, 0), (4, 3), (0, 3)]);
        assert_eq!(cw.orientation(), Orientation::Clockwise);
        assert_approx_eq!(cw.signed_area(), 12.0);
        assert_approx_eq!(cw.area(), 12.0);
        assert_approx_eq!(cw.perimeter(), 14.0);

        let mut ccw = cw.clone();
        ccw.vertices.reverse();
        assert_eq!(ccw.orientation(), Orientation::CounterClockwise);
        assert_approx_eq!(ccw.area(), 12.0);

        assert_eq!(poly(&[(0, 0), (1, 1), (2, 2)]).orientation(), Orientation::Degenerate);
    }

    #[test]
    fn test_circularity() {
        let square = poly(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert_approx_eq!(square.circularity().unwrap(), 4.0 / std::f64::consts::PI);
        assert_eq!(poly(&[(0, 0), (3, 0)]).circularity(), None);
    }

    #[test]
    fn test_contains_boundary_and_interior() {
        let l_shape = poly(&[(0, 0), (4, 0), (4, 2), (2, 2), (2, 4), (0, 4)]);
        assert!(l_shape.contains(Point::new(1, 1)));
        assert!(l_shape.contains(Point::new(4, 1)));
        assert!(l_shape.contains(Point::new(2, 3)));
        assert!(!l_shape.contains(Point::new(3, 3)));
        assert!(!l_shape.contains(Point::new(5, 0)));
        assert!(!l_shape.is_convex());
        assert!(poly(&[(0, 0), (4, 0), (4, 2)]).is_convex());
    }

    #[test]
    fn test_distinct_and_bbox() {
        let p = poly(&[(1, 1), (3, 1), (1, 1)]);
        assert_eq!(p.distinct_count(), 2);
        let b = p.bounding_box().unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (1, 3, 1, 1));
        assert!(Polygon::default().bounding_box().is_none());
    }
}

use crate::{
    error::Result,
    polygon::{cross, Polygon},
    traits::PolygonProcessor,
};

/// Convex hull via Andrew's monotone chain.
#[derive(Debug, Clone, Default)]
pub struct ConvexHullBuilder;

impl PolygonProcessor for ConvexHullBuilder {
    fn process(&self, polygon: &Polygon) -> Result<Polygon> {
        Ok(convex_hull(polygon))
    }

    fn name(&self) -> &'static str {
        "convex_hull"
    }
}

/// Smallest convex polygon containing every vertex of `polygon`.
///
/// The hull starts at the lowest-x (then lowest-y) vertex and has the same
/// winding as external contours (clockwise on screen). Collinear vertices
/// are dropped unless they are hull endpoints. Inputs with fewer than 3
/// distinct vertices are returned unchanged.
pub fn convex_hull(polygon: &Polygon) -> Polygon {
    let mut points = polygon.vertices.clone();
    points.sort_unstable();
    points.dedup();
    if points.len() < 3 {
        return polygon.clone();
    }

    let mut lower = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    Polygon::new(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Orientation;
    use crate::raster::Point;

    fn poly(points: &[(i32, i32)]) -> Polygon {
        Polygon::new(points.iter().map(|&p| p.into()).collect())
    }

    #[test]
    fn test_hull_of_concave_polygon() {
        let l_shape = poly(&[(0, 0), (4, 0), (4, 2), (2, 2), (2, 4), (0, 4)]);
        let hull = convex_hull(&l_shape);
        assert_eq!(hull, poly(&[(0, 0), (4, 0), (4, 2), (2, 4), (0, 4)]));
        assert!(hull.is_convex());
        assert_eq!(hull.orientation(), Orientation::Clockwise);
        for p in &l_shape.vertices {
            assert!(hull.contains(*p));
        }
    }

    #[test]
    fn test_collinear_points_excluded() {
        let square = poly(&[(0, 0), (2, 0), (4, 0), (4, 4), (2, 4), (0, 4), (0, 2)]);
        let hull = convex_hull(&square);
        assert_eq!(hull, poly(&[(0, 0), (4, 0), (4, 4), (0, 4)]));

        let line = poly(&[(0, 0), (1, 1), (3, 3), (2, 2)]);
        assert_eq!(convex_hull(&line), poly(&[(0, 0), (3, 3)]));
    }

    #[test]
    fn test_degenerate_inputs_unchanged() {
        let single = poly(&[(3, 3)]);
        assert_eq!(convex_hull(&single), single);
        let segment = poly(&[(0, 0), (5, 2), (0, 0)]);
        assert_eq!(convex_hull(&segment), segment);
        assert_eq!(convex_hull(&Polygon::default()), Polygon::default());
    }

    #[test]
    fn test_hull_contains_scattered_points() {
        let mut state = 17u32;
        let points: Vec<Point> = (0..200)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let x = ((state >> 16) % 50) as i32;
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let y = ((state >> 16) % 50) as i32;
                Point::new(x, y)
            })
            .collect();
        let input = Polygon::new(points);
        let hull = convex_hull(&input);
        assert!(hull.len() >= 3);
        assert!(hull.is_convex());
        assert_eq!(hull.orientation(), Orientation::Clockwise);
        for p in &input.vertices {
            assert!(hull.contains(*p), "{p:?} outside hull");
        }
        // no three consecutive hull vertices are collinear
        let n = hull.len();
        for i in 0..n {
            let v = &hull.vertices;
            assert_ne!(cross(v[i], v[(i + 1) % n], v[(i + 2) % n]), 0);
        }
    }
}

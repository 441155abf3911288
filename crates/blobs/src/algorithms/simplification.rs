use tracing::warn;

use crate::{
    error::{BlobError, Result},
    polygon::{cross, Polygon},
    raster::Point,
    traits::PolygonProcessor,
};

/// Douglas-Peucker reduction of closed polygons.
#[derive(Debug, Clone)]
pub struct DouglasPeuckerSimplifier {
    pub tolerance: f64,
}

impl Default for DouglasPeuckerSimplifier {
    fn default() -> Self {
        Self { tolerance: 10.0 }
    }
}

impl PolygonProcessor for DouglasPeuckerSimplifier {
    fn process(&self, polygon: &Polygon) -> Result<Polygon> {
        if self.tolerance.is_nan() {
            return Err(BlobError::InvalidInput(
                "simplification tolerance must not be NaN".to_string(),
            ));
        }
        if self.tolerance.is_infinite() && self.tolerance > 0.0 {
            warn!("infinite simplification tolerance collapses every polygon to two vertices");
        }
        Ok(simplify_polygon(polygon, self.tolerance))
    }

    fn name(&self) -> &'static str {
        "douglas_peucker"
    }
}

fn distance_sq(a: Point, b: Point) -> i64 {
    let dx = (b.x - a.x) as i64;
    let dy = (b.y - a.y) as i64;
    dx * dx + dy * dy
}

/// Distance from `p` to the line through `a` and `b`, or to `a` when the
/// two coincide.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let len_sq = distance_sq(a, b);
    if len_sq == 0 {
        return (distance_sq(a, p) as f64).sqrt();
    }
    cross(a, b, p).abs() as f64 / (len_sq as f64).sqrt()
}

/// Keeps the vertices of `polygon` that lie at least `tolerance` away from
/// the chord of the span they belong to. The ring is split at vertex 0 and
/// at the vertex farthest from it, and both halves are reduced.
///
/// The result is a subset of the input in the same cyclic order. A
/// tolerance `<= 0` or a ring of fewer than 3 vertices is returned as is.
pub fn simplify_polygon(polygon: &Polygon, tolerance: f64) -> Polygon {
    let v = &polygon.vertices;
    let n = v.len();
    if tolerance.is_nan() || tolerance <= 0.0 || n < 3 {
        return polygon.clone();
    }

    // farthest from vertex 0, lowest index on ties
    let (far, far_dist) = (1..n)
        .map(|i| (i, distance_sq(v[0], v[i])))
        .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if far_dist == 0 {
        return polygon.clone();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[far] = true;

    // spans index an unrolled ring: position n is vertex 0 again
    let at = |i: usize| v[i % n];
    let mut spans = vec![(0, far), (far, n)];
    while let Some((a, b)) = spans.pop() {
        if b <= a + 1 {
            continue;
        }
        let (idx, dist) = (a + 1..b)
            .map(|i| (i, perpendicular_distance(at(i), at(a), at(b))))
            .fold((a, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist >= tolerance {
            keep[idx % n] = true;
            spans.push((a, idx));
            spans.push((idx, b));
        }
    }

    Polygon::new(
        v.iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(&p, _)| p)
            .collect(),
    )
}

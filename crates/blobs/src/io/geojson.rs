use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::{
    error::Result,
    polygon::Polygon,
    raster::Point,
    types::{BlobAnalysis, BlobShape},
};

/// Closed GeoJSON ring in pixel coordinates.
fn ring(polygon: &Polygon) -> Vec<Vec<f64>> {
    let mut coords: Vec<Vec<f64>> = polygon
        .vertices
        .iter()
        .map(|&p| position(p))
        .collect();
    if let Some(first) = coords.first().cloned() {
        coords.push(first);
    }
    coords
}

fn position(p: Point) -> Vec<f64> {
    vec![p.x as f64, p.y as f64]
}

/// Polygon when the outline encloses something, otherwise the `Point` or
/// `LineString` it degenerates to. GeoJSON rings need three distinct vertices.
/// `shape` must have a non-empty outline.
fn outline_geometry(shape: &BlobShape) -> Value {
    let outline = shape.outline();
    match outline.distinct_count() {
        0 | 1 => Value::Point(position(outline.vertices[0])),
        2 => {
            let mut points: Vec<Point> = Vec::with_capacity(2);
            for &p in &outline.vertices {
                if !points.contains(&p) {
                    points.push(p);
                }
            }
            Value::LineString(points.into_iter().map(position).collect())
        }
        _ => {
            let mut rings = vec![ring(outline)];
            rings.extend(
                shape
                    .holes
                    .iter()
                    .filter(|h| h.distinct_count() >= 3)
                    .map(ring),
            );
            Value::Polygon(rings)
        }
    }
}

fn number(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl BlobAnalysis {
    fn shape_feature(&self, shape: &BlobShape) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("label".to_string(), JsonValue::from(shape.label));
        properties.insert("has_holes".to_string(), JsonValue::Bool(shape.has_holes()));
        properties.insert("hole_count".to_string(), JsonValue::from(shape.holes.len()));
        properties.insert("polygon_area".to_string(), number(shape.outline().area()));
        if let Some(blob) = self.blobs.get(shape.label) {
            properties.insert("area".to_string(), JsonValue::from(blob.area));
            properties.insert(
                "centroid".to_string(),
                JsonValue::Array(blob.centroid.iter().map(|&c| number(c)).collect()),
            );
            properties.insert("angle".to_string(), number(blob.angle()));
            properties.insert("perimeter".to_string(), number(blob.perimeter()));
        }
        if let Some(hull) = &shape.hull {
            properties.insert(
                "hull".to_string(),
                JsonValue::Array(
                    ring(hull)
                        .into_iter()
                        .map(|c| JsonValue::Array(c.into_iter().map(number).collect()))
                        .collect(),
                ),
            );
        }

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(outline_geometry(shape))),
            id: Some(geojson::feature::Id::Number(shape.label.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// One feature per blob. Polygons list the outer ring first, then its holes.
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self
            .shapes
            .iter()
            .filter(|s| !s.outline().is_empty())
            .map(|s| self.shape_feature(s))
            .collect();

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("image_width".to_string(), JsonValue::from(self.image_width));
        foreign_members.insert("image_height".to_string(), JsonValue::from(self.image_height));
        foreign_members.insert("blob_count".to_string(), JsonValue::from(self.blobs.len()));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

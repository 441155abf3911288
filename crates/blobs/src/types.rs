use std::collections::BTreeMap;

use image::{GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    chain_code::Contour,
    error::{BlobError, Result},
    polygon::Polygon,
    raster::{BoundingBox, Label, LabelRaster, Point},
};

/// Raw spatial moments of a pixel set, up to second order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m20: f64,
    pub m02: f64,
}

impl Moments {
    pub fn add_pixel(&mut self, p: Point) {
        let (x, y) = (p.x as f64, p.y as f64);
        self.m00 += 1.0;
        self.m10 += x;
        self.m01 += y;
        self.m11 += x * y;
        self.m20 += x * x;
        self.m02 += y * y;
    }

    pub fn merge(&mut self, other: &Moments) {
        self.m00 += other.m00;
        self.m10 += other.m10;
        self.m01 += other.m01;
        self.m11 += other.m11;
        self.m20 += other.m20;
        self.m02 += other.m02;
    }

    pub fn centroid(&self) -> Option<[f64; 2]> {
        (self.m00 > 0.0).then(|| [self.m10 / self.m00, self.m01 / self.m00])
    }

    pub fn mu11(&self) -> f64 {
        if self.m00 > 0.0 {
            self.m11 - self.m10 * self.m01 / self.m00
        } else {
            0.0
        }
    }

    pub fn mu20(&self) -> f64 {
        if self.m00 > 0.0 {
            self.m20 - self.m10 * self.m10 / self.m00
        } else {
            0.0
        }
    }

    pub fn mu02(&self) -> f64 {
        if self.m00 > 0.0 {
            self.m02 - self.m01 * self.m01 / self.m00
        } else {
            0.0
        }
    }

    // second order normalized central moments: mu / m00^2
    pub fn nu11(&self) -> f64 {
        self.normalize(self.mu11())
    }

    pub fn nu20(&self) -> f64 {
        self.normalize(self.mu20())
    }

    pub fn nu02(&self) -> f64 {
        self.normalize(self.mu02())
    }

    fn normalize(&self, mu: f64) -> f64 {
        if self.m00 > 0.0 {
            mu / (self.m00 * self.m00)
        } else {
            0.0
        }
    }

    /// Orientation of the major axis in radians, in `(-pi/2, pi/2]`.
    /// Positive angles turn from +x towards +y (clockwise on screen).
    pub fn angle(&self) -> f64 {
        0.5 * (2.0 * self.mu11()).atan2(self.mu20() - self.mu02())
    }
}

/// A connected region of foreground pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Blob {
    pub label: Label,
    /// Pixel count.
    pub area: u64,
    pub bbox: BoundingBox,
    pub centroid: [f64; 2],
    pub moments: Moments,
    /// Clockwise outer boundary. `contour.start` is the topmost-leftmost pixel.
    pub contour: Contour,
    /// Counter-clockwise boundaries of the holes, in raster order of the holes.
    pub internal_contours: Vec<Contour>,
}

impl Blob {
    pub fn angle(&self) -> f64 {
        self.moments.angle()
    }

    pub fn hole_count(&self) -> usize {
        self.internal_contours.len()
    }

    /// Chain-code length of the outer boundary.
    pub fn perimeter(&self) -> f64 {
        self.contour.perimeter()
    }

    pub fn touches_border(&self, width: u32, height: u32) -> bool {
        self.bbox.touches_border(width, height)
    }

    fn pixels<'a>(&'a self, labels: &'a LabelRaster) -> impl Iterator<Item = Point> + 'a {
        let b = self.bbox;
        (b.min_y..=b.max_y)
            .flat_map(move |y| (b.min_x..=b.max_x).map(move |x| Point::new(x, y)))
            .filter(move |&p| labels.at(p) == Some(self.label))
    }

    /// Mean RGB colour of the blob's pixels in `image`.
    pub fn mean_color(&self, image: &RgbImage, labels: &LabelRaster) -> Result<[f64; 3]> {
        check_image_size(image.dimensions(), labels)?;
        let mut sum = [0.0f64; 3];
        let mut count = 0u64;
        for p in self.pixels(labels) {
            let px = image.get_pixel(p.x as u32, p.y as u32);
            for (s, &c) in sum.iter_mut().zip(px.0.iter()) {
                *s += c as f64;
            }
            count += 1;
        }
        if count == 0 {
            return Err(BlobError::InvariantViolation(format!(
                "blob {} has no pixels in the label raster",
                self.label
            )));
        }
        Ok(sum.map(|s| s / count as f64))
    }

    /// Mean gray level of the blob's pixels in `image`.
    pub fn mean_intensity(&self, image: &GrayImage, labels: &LabelRaster) -> Result<f64> {
        check_image_size(image.dimensions(), labels)?;
        let (sum, count) = self
            .pixels(labels)
            .fold((0.0f64, 0u64), |(s, c), p| {
                (s + image.get_pixel(p.x as u32, p.y as u32)[0] as f64, c + 1)
            });
        if count == 0 {
            return Err(BlobError::InvariantViolation(format!(
                "blob {} has no pixels in the label raster",
                self.label
            )));
        }
        Ok(sum / count as f64)
    }
}

fn check_image_size(image: (u32, u32), labels: &LabelRaster) -> Result<()> {
    if image != labels.dimensions() {
        return Err(BlobError::DimensionMismatch {
            expected: labels.dimensions(),
            actual: image,
        });
    }
    Ok(())
}

/// Blobs keyed by label, iterated in label order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlobSet {
    blobs: BTreeMap<Label, Blob>,
}

impl BlobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blob: Blob) -> Option<Blob> {
        self.blobs.insert(blob.label, blob)
    }

    pub fn remove(&mut self, label: Label) -> Option<Blob> {
        self.blobs.remove(&label)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn get(&self, label: Label) -> Option<&Blob> {
        self.blobs.get(&label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Blob> {
        self.blobs.values_mut()
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut BTreeMap<Label, Blob> {
        &mut self.blobs
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.blobs.keys().copied()
    }

    /// Sum of all blob areas.
    pub fn total_area(&self) -> u64 {
        self.blobs.values().map(|b| b.area).sum()
    }

    /// Keeps the blobs accepted by `keep`. Removed labels are cleared from
    /// `labels` when given, so the raster stays consistent with the set.
    /// Returns the removed labels.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&Blob) -> bool,
        labels: Option<&mut LabelRaster>,
    ) -> Vec<Label> {
        let removed: Vec<Label> = self
            .blobs
            .values()
            .filter(|b| !keep(b))
            .map(|b| b.label)
            .collect();
        for label in &removed {
            self.blobs.remove(label);
        }
        if let Some(labels) = labels {
            labels.clear_labels(&removed);
        }
        removed
    }

    /// Keeps blobs with `min_area <= area <= max_area` (no upper bound when
    /// `max_area` is `None`).
    pub fn filter_by_area(
        &mut self,
        min_area: u64,
        max_area: Option<u64>,
        labels: Option<&mut LabelRaster>,
    ) -> Vec<Label> {
        self.retain(
            |b| b.area >= min_area && max_area.is_none_or(|max| b.area <= max),
            labels,
        )
    }

    /// Keeps only the blob carrying `label`.
    pub fn retain_label(&mut self, label: Label, labels: Option<&mut LabelRaster>) -> Vec<Label> {
        self.retain(|b| b.label == label, labels)
    }

    /// Blob with the largest area; the lowest label wins ties.
    pub fn largest(&self) -> Option<&Blob> {
        self.blobs
            .values()
            .fold(None, |best: Option<&Blob>, b| match best {
                Some(cur) if cur.area >= b.area => Some(cur),
                _ => Some(b),
            })
    }
}

impl<'a> IntoIterator for &'a BlobSet {
    type Item = &'a Blob;
    type IntoIter = std::collections::btree_map::Values<'a, Label, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.values()
    }
}

impl IntoIterator for BlobSet {
    type Item = Blob;
    type IntoIter = std::collections::btree_map::IntoValues<Label, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.into_values()
    }
}

impl FromIterator<Blob> for BlobSet {
    fn from_iter<I: IntoIterator<Item = Blob>>(iter: I) -> Self {
        Self {
            blobs: iter.into_iter().map(|b| (b.label, b)).collect(),
        }
    }
}

/// Polygons derived from one blob's contours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlobShape {
    pub label: Label,
    /// Lossless polygon of the outer chain code.
    pub polygon: Polygon,
    /// Outer polygon after simplification, when the pipeline simplifies.
    pub simplified: Option<Polygon>,
    /// Convex hull of the simplified (or raw) outer polygon.
    pub hull: Option<Polygon>,
    /// One polygon per internal contour.
    pub holes: Vec<Polygon>,
}

impl BlobShape {
    /// Outer ring after all enabled reductions except the hull.
    pub fn outline(&self) -> &Polygon {
        self.simplified.as_ref().unwrap_or(&self.polygon)
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct BlobAnalysis {
    #[serde(skip)]
    pub labels: LabelRaster,
    pub blobs: BlobSet,
    pub shapes: Vec<BlobShape>,
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
}

impl BlobAnalysis {
    pub fn shape(&self, label: Label) -> Option<&BlobShape> {
        self.shapes.iter().find(|s| s.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn blob_from_points(label: Label, points: &[(i32, i32)]) -> Blob {
        let mut moments = Moments::default();
        let mut bbox = BoundingBox::from_point(points[0].into());
        for &p in points {
            moments.add_pixel(p.into());
            bbox.include(p.into());
        }
        Blob {
            label,
            area: points.len() as u64,
            bbox,
            centroid: moments.centroid().unwrap(),
            moments,
            contour: Contour::new(points[0].into(), vec![]),
            internal_contours: vec![],
        }
    }

    #[test]
    fn test_moments_of_horizontal_bar() {
        let blob = blob_from_points(1, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_approx_eq!(blob.centroid[0], 1.5);
        assert_approx_eq!(blob.centroid[1], 0.0);
        assert_approx_eq!(blob.moments.mu20(), 5.0);
        assert_approx_eq!(blob.moments.mu02(), 0.0);
        assert_approx_eq!(blob.angle(), 0.0);
    }

    #[test]
    fn test_moments_of_diagonal() {
        let blob = blob_from_points(1, &[(0, 0), (1, 1), (2, 2)]);
        assert_approx_eq!(blob.angle(), std::f64::consts::FRAC_PI_4);
        assert!(blob.moments.nu11() > 0.0);
    }

    #[test]
    fn test_merge_equals_accumulate() {
        let mut a = Moments::default();
        let mut b = Moments::default();
        let mut all = Moments::default();
        for (i, p) in [(0, 0), (3, 1), (2, 5), (7, 7)].into_iter().enumerate() {
            if i % 2 == 0 { a.add_pixel(p.into()) } else { b.add_pixel(p.into()) }
            all.add_pixel(p.into());
        }
        a.merge(&b);
        assert_eq!(a, all);
    }

    #[test]
    fn test_filter_by_area_and_largest() {
        let mut set: BlobSet = vec![
            blob_from_points(1, &[(0, 0)]),
            blob_from_points(2, &[(3, 0), (4, 0), (5, 0)]),
            blob_from_points(3, &[(0, 3), (1, 3), (2, 3)]),
        ]
        .into_iter()
        .collect();
        let mut labels = LabelRaster::from_vec(
            6,
            4,
            vec![
                1, 0, 0, 2, 2, 2, //
                0, 0, 0, 0, 0, 0, //
                0, 0, 0, 0, 0, 0, //
                3, 3, 3, 0, 0, 0,
            ],
        )
        .unwrap();

        assert_eq!(set.largest().map(|b| b.label), Some(2));
        let removed = set.filter_by_area(2, None, Some(&mut labels));
        assert_eq!(removed, vec![1]);
        assert_eq!(set.len(), 2);
        assert_eq!(labels.get(0, 0), Some(0));
        assert_eq!(labels.get(3, 0), Some(2));

        set.retain_label(3, Some(&mut labels));
        assert_eq!(set.labels().collect::<Vec<_>>(), vec![3]);
        assert_eq!(labels.get(3, 0), Some(0));
    }

    #[test]
    fn test_mean_color() {
        let labels = LabelRaster::from_vec(2, 1, vec![1, 0]).unwrap();
        let blob = blob_from_points(1, &[(0, 0)]);
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgb([10, 20, 30]));
        image.put_pixel(1, 0, image::Rgb([255, 255, 255]));
        assert_eq!(blob.mean_color(&image, &labels).unwrap(), [10.0, 20.0, 30.0]);

        let wrong = RgbImage::new(3, 1);
        assert!(matches!(
            blob.mean_color(&wrong, &labels),
            Err(BlobError::DimensionMismatch { .. })
        ));
    }
}

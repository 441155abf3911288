//! # Blob Labeling and Contour Library
//!
//! Connected-component analysis for binary images: every foreground region
//! gets a label, statistics, an outer chain-code contour and one contour per
//! hole. Contours convert to polygons that can be simplified and hulled.
//!
//! ## Core Features
//!
//! - **Labeling**: Two-pass raster labeling with 4- or 8-connectivity
//! - **Blob Statistics**: Area, bounding box, centroid, moments, orientation
//! - **Contour Tracing**: Freeman chain codes for outer boundaries and holes
//! - **Polygons**: Lossless conversion, Douglas-Peucker simplification, convex hulls
//! - **GeoJSON Support**: Export blob outlines to standard GeoJSON format
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blobs::Pipeline;
//! use image::open;
//!
//! let pipeline = Pipeline::builder()
//!     .with_simplification(10.0)
//!     .with_convex_hull()
//!     .build();
//!
//! // Non-zero pixels are foreground
//! let image = open("mask.png")?.to_luma8();
//! let result = pipeline.process_gray(&image)?;
//!
//! for blob in &result.blobs {
//!     println!("blob {} area {} centroid {:?}", blob.label, blob.area, blob.centroid);
//! }
//! result.save_geojson("output.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Individual Stages
//!
//! ```rust
//! use blobs::{BinaryRaster, Connectivity, ContourTracer, Labeler, RasterLabeler};
//!
//! let raster = BinaryRaster::from_ascii(&["##.", "##.", "..#"])?;
//! let mut labeling = RasterLabeler::new(Connectivity::Four).label(&raster)?;
//! assert_eq!(labeling.blob_count(), 2);
//!
//! ContourTracer::new(Connectivity::Four).trace_all(&labeling.labels, &mut labeling.blobs, false)?;
//! # Ok::<(), blobs::BlobError>(())
//! ```

pub mod algorithms;
pub mod chain_code;
pub mod contour;
pub mod error;
pub mod io;
pub mod labeling;
pub mod pipeline;
pub mod polygon;
pub mod raster;
pub mod registry;
pub mod traits;
pub mod types;
pub mod union_find;

pub use algorithms::*;
pub use chain_code::{Contour, Direction};
pub use contour::ContourTracer;
pub use error::{BlobError, Result};
pub use labeling::{Labeling, RasterLabeler};
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use polygon::{Orientation, Polygon};
pub use raster::{
    BACKGROUND, BinaryRaster, BoundingBox, Connectivity, Label, LabelRaster, Point, Raster,
};
pub use registry::BlobRegistry;
pub use traits::*;
pub use types::{Blob, BlobAnalysis, BlobSet, BlobShape, Moments};

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use image::{GrayImage, Luma};

    fn create_test_image() -> GrayImage {
        let mut img = GrayImage::new(100, 100);
        for y in 20..80 {
            for x in 20..80 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = Pipeline::builder().build();
        let result = pipeline.process_gray(&create_test_image()).expect("Should process successfully");

        assert_eq!(result.blobs.len(), 1);
        assert_eq!(result.image_width, 100);
        assert_eq!(result.image_height, 100);

        let blob = result.blobs.get(1).unwrap();
        assert_eq!(blob.area, 3600);
        assert_eq!(blob.bbox, BoundingBox { min_x: 20, min_y: 20, max_x: 79, max_y: 79 });
        assert_approx_eq!(blob.centroid[0], 49.5);
        assert_approx_eq!(blob.centroid[1], 49.5);
        assert_eq!(blob.contour.start, Point::new(20, 20));
        assert!(blob.internal_contours.is_empty());

        let shape = result.shape(1).unwrap();
        assert_eq!(shape.polygon.len(), 4);
        assert!(shape.simplified.is_none());
        assert!(shape.hull.is_none());
    }

    #[test]
    fn test_square_scenario() {
        let raster = BinaryRaster::from_ascii(&[
            ".....", //
            ".###.",
            ".###.",
            ".###.",
            ".....",
        ])
        .unwrap();
        let result = Pipeline::builder().build().process(&raster).unwrap();
        assert_eq!(result.blobs.len(), 1);

        let blob = result.blobs.get(1).unwrap();
        assert_eq!(blob.area, 9);
        assert_eq!(blob.bbox, BoundingBox { min_x: 1, min_y: 1, max_x: 3, max_y: 3 });
        assert_approx_eq!(blob.centroid[0], 2.0);
        assert_approx_eq!(blob.centroid[1], 2.0);
        assert_eq!(blob.contour.start, Point::new(1, 1));
        assert_eq!(blob.contour.len(), 8);
        assert!(blob.contour.is_closed());
        for x in 0..5 {
            for y in 0..5 {
                let expected = if (1..=3).contains(&x) && (1..=3).contains(&y) { 1 } else { 0 };
                assert_eq!(result.labels.get(x, y), Some(expected));
            }
        }
    }

    #[test]
    fn test_ring_scenario() {
        let raster = BinaryRaster::from_ascii(&[
            "#######", //
            "#######",
            "##...##",
            "##...##",
            "##...##",
            "#######",
            "#######",
        ])
        .unwrap();
        let result = Pipeline::builder().build().process(&raster).unwrap();
        let blob = result.blobs.get(1).unwrap();
        assert_eq!(blob.area, 40);
        assert_eq!(blob.internal_contours.len(), 1);
        assert_eq!(result.shape(1).unwrap().holes.len(), 1);

        let ring = BinaryRaster::from_ascii(&[
            "......", //
            ".####.",
            ".#..#.",
            ".#..#.",
            ".####.",
            "......",
        ])
        .unwrap();
        let result = Pipeline::builder().build().process(&ring).unwrap();
        assert_eq!(result.blobs.len(), 1);
        assert_eq!(result.blobs.get(1).unwrap().area, 12);
        assert_eq!(result.blobs.get(1).unwrap().hole_count(), 1);
    }

    #[test]
    fn test_all_background() {
        let raster = BinaryRaster::from_ascii(&["....", "....", "...."]).unwrap();
        let result = Pipeline::builder().with_convex_hull().build().process(&raster).unwrap();
        assert!(result.blobs.is_empty());
        assert!(result.shapes.is_empty());
        assert_eq!(result.labels.max_label(), BACKGROUND);
    }

    #[test]
    fn test_pipeline_with_simplification_and_hull() {
        // L-shaped blob: the notch survives simplification, not the hull
        let raster = BinaryRaster::from_ascii(&[
            "###.....", //
            "###.....",
            "###.....",
            "########",
            "########",
        ])
        .unwrap();
        let pipeline = Pipeline::builder()
            .with_simplification(0.5)
            .with_convex_hull()
            .parallel(true)
            .build();
        let result = pipeline.process(&raster).unwrap();
        let shape = result.shape(1).unwrap();

        let simplified = shape.simplified.as_ref().unwrap();
        assert_eq!(simplified, &shape.polygon);
        let hull = shape.hull.as_ref().unwrap();
        assert!(hull.is_convex());
        assert!(hull.len() < simplified.len());
        for p in &simplified.vertices {
            assert!(hull.contains(*p));
        }
    }

    #[test]
    fn test_pipeline_filters() {
        let raster = BinaryRaster::from_ascii(&[
            "#.......", //
            "........",
            "...###..",
            "...###..",
            "........",
            ".......#",
        ])
        .unwrap();
        let result = Pipeline::builder()
            .with_area_range(2, None)
            .build()
            .process(&raster)
            .unwrap();
        assert_eq!(result.blobs.labels().collect::<Vec<_>>(), vec![2]);
        assert_eq!(result.labels.get(0, 0), Some(BACKGROUND));
        assert_eq!(result.labels.get(7, 5), Some(BACKGROUND));
        assert_eq!(result.labels.get(3, 2), Some(2));

        let result = Pipeline::builder()
            .exclude_border_blobs()
            .build()
            .process(&raster)
            .unwrap();
        assert_eq!(result.blobs.len(), 1);
        assert!(result.blobs.get(2).is_some());
    }

    #[test]
    fn test_area_filter_drops_many_specks() {
        // 4-connected checkerboard specks around one solid block
        let mut raster = BinaryRaster::new(120, 80).unwrap();
        for y in 0..80u32 {
            for x in 0..120u32 {
                let block = (40..60).contains(&x) && (30..50).contains(&y);
                raster.set(x, y, block || (x + y) % 2 == 0);
            }
        }
        let unfiltered = Pipeline::builder()
            .connectivity(Connectivity::Four)
            .build()
            .process(&raster)
            .unwrap();
        assert!(unfiltered.blobs.len() > 4000);

        let result = Pipeline::builder()
            .connectivity(Connectivity::Four)
            .with_area_range(20, None)
            .build()
            .process(&raster)
            .unwrap();
        assert_eq!(result.blobs.len(), 1);
        let block = result.blobs.iter().next().unwrap();
        assert_eq!(block.bbox, BoundingBox { min_x: 39, min_y: 29, max_x: 60, max_y: 50 });
        assert_eq!(result.labels.as_slice().iter().filter(|&&l| l != BACKGROUND).count() as u64, block.area);
        assert!(block.internal_contours.is_empty());
    }

    #[test]
    fn test_connectivity_choice() {
        let raster = BinaryRaster::from_ascii(&["#.", ".#"]).unwrap();
        let eight = Pipeline::builder().build().process(&raster).unwrap();
        assert_eq!(eight.blobs.len(), 1);
        let four = Pipeline::builder()
            .connectivity(Connectivity::Four)
            .build()
            .process(&raster)
            .unwrap();
        assert_eq!(four.blobs.len(), 2);
    }

    #[test]
    fn test_geojson_export() {
        let pipeline = Pipeline::builder().build();
        let result = pipeline.process_gray(&create_test_image()).unwrap();
        let geojson = result.to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), 1);
        assert!(!Pipeline::builder().build().info().is_empty());
    }
}

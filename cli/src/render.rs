//! Overlay drawing of analysis results on the source image.

use std::collections::HashMap;

use blobs::{BlobAnalysis, BlobError, Contour, Label, Polygon};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::{FillMode, RenderOptions};

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const HOLE_COLOR: Rgb<u8> = Rgb([0, 160, 255]);
pub const POLYGON_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const HULL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const CENTROID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Stable pseudo-random colour for a label, never too dark.
pub fn label_color(label: Label) -> Rgb<u8> {
    let h = label.wrapping_mul(2_654_435_761);
    Rgb([(h >> 24) as u8 | 0x40, (h >> 16) as u8 | 0x40, (h >> 8) as u8 | 0x40])
}

fn draw_chain(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    for p in contour.pixels() {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
            canvas.put_pixel(p.x as u32, p.y as u32, color);
        }
    }
}

fn draw_polygon(canvas: &mut RgbImage, polygon: &Polygon, color: Rgb<u8>) {
    for (a, b) in polygon.edges() {
        draw_line_segment_mut(canvas, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
    }
}

/// Draws the enabled layers over a copy of `source`, which must have the
/// size of the analysed raster.
pub fn render(
    source: &RgbImage,
    analysis: &BlobAnalysis,
    options: &RenderOptions,
) -> blobs::Result<RgbImage> {
    if source.dimensions() != analysis.labels.dimensions() {
        return Err(BlobError::DimensionMismatch {
            expected: analysis.labels.dimensions(),
            actual: source.dimensions(),
        });
    }
    let mut canvas = source.clone();

    let fills: HashMap<Label, Rgb<u8>> = match options.fill {
        FillMode::None => HashMap::new(),
        FillMode::Label => analysis
            .blobs
            .iter()
            .map(|b| (b.label, label_color(b.label)))
            .collect(),
        FillMode::MeanColor => analysis
            .blobs
            .iter()
            .map(|b| {
                let mean = b.mean_color(source, &analysis.labels)?;
                Ok((b.label, Rgb(mean.map(|c| c.round().clamp(0.0, 255.0) as u8))))
            })
            .collect::<blobs::Result<_>>()?,
    };
    if !fills.is_empty() {
        for (p, label) in analysis.labels.enumerate() {
            if let Some(&color) = fills.get(&label) {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
    }

    for blob in &analysis.blobs {
        if options.bounding_boxes {
            let rect = Rect::at(blob.bbox.min_x, blob.bbox.min_y)
                .of_size(blob.bbox.width(), blob.bbox.height());
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
        if options.contours {
            draw_chain(&mut canvas, &blob.contour, CONTOUR_COLOR);
            for hole in &blob.internal_contours {
                draw_chain(&mut canvas, hole, HOLE_COLOR);
            }
        }
    }

    for shape in &analysis.shapes {
        if options.polygons {
            draw_polygon(&mut canvas, shape.outline(), POLYGON_COLOR);
        }
        if options.hulls {
            if let Some(hull) = &shape.hull {
                draw_polygon(&mut canvas, hull, HULL_COLOR);
            }
        }
    }

    if options.centroids {
        for blob in &analysis.blobs {
            let [cx, cy] = blob.centroid;
            draw_cross_mut(&mut canvas, CENTROID_COLOR, cx.round() as i32, cy.round() as i32);
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobs::{BinaryRaster, Pipeline};

    fn square_scene() -> (RgbImage, BlobAnalysis) {
        let raster = BinaryRaster::from_ascii(&[
            "........", //
            "........",
            "..####..",
            "..####..",
            "..####..",
            "..####..",
            "........",
            "........",
        ])
        .unwrap();
        let source = RgbImage::from_fn(8, 8, |x, y| {
            if raster.get(x as i32, y as i32) == Some(true) {
                Rgb([10, 20, 30])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let analysis = Pipeline::builder().with_convex_hull().build().process(&raster).unwrap();
        (source, analysis)
    }

    fn only(fill: FillMode, contours: bool) -> RenderOptions {
        RenderOptions {
            fill,
            contours,
            polygons: false,
            hulls: false,
            bounding_boxes: false,
            centroids: false,
        }
    }

    #[test]
    fn test_label_fill_and_contours() {
        let (source, analysis) = square_scene();
        let out = render(&source, &analysis, &only(FillMode::Label, true)).unwrap();
        assert_eq!(*out.get_pixel(3, 3), label_color(1));
        assert_eq!(*out.get_pixel(2, 2), CONTOUR_COLOR);
        assert_eq!(*out.get_pixel(5, 4), CONTOUR_COLOR);
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_mean_color_fill() {
        let (source, analysis) = square_scene();
        let out = render(&source, &analysis, &only(FillMode::MeanColor, false)).unwrap();
        assert_eq!(*out.get_pixel(4, 4), Rgb([10, 20, 30]));
        assert_eq!(out, source);
    }

    #[test]
    fn test_hull_and_centroid_layers() {
        let (source, analysis) = square_scene();
        let options = RenderOptions { fill: FillMode::None, ..RenderOptions::default() };
        let out = render(&source, &analysis, &options).unwrap();
        // hull drawn last among outlines
        assert_eq!(*out.get_pixel(2, 2), HULL_COLOR);
        // centroid (3.5, 3.5) rounds to (4, 4)
        assert_eq!(*out.get_pixel(4, 4), CENTROID_COLOR);
    }

    #[test]
    fn test_size_mismatch() {
        let (_, analysis) = square_scene();
        let small = RgbImage::new(4, 4);
        assert!(matches!(
            render(&small, &analysis, &RenderOptions::default()),
            Err(BlobError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_label_colors_differ() {
        assert_ne!(label_color(1), label_color(2));
        assert_eq!(label_color(7), label_color(7));
    }
}

//! Two-pass connected-component labeling.

use image::GrayImage;
use tracing::debug;

use crate::{
    error::Result,
    raster::{BinaryRaster, Connectivity, LabelRaster, Point, BACKGROUND},
    registry::BlobRegistry,
    traits::Labeler,
    types::BlobSet,
    union_find::UnionFind,
};

/// Label raster plus one blob per label. Contours are empty until traced.
#[derive(Debug, Clone)]
pub struct Labeling {
    pub labels: LabelRaster,
    pub blobs: BlobSet,
    pub connectivity: Connectivity,
}

impl Labeling {
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Number of pixels carrying a blob label.
    pub fn labeled_pixels(&self) -> u64 {
        self.blobs.total_area()
    }
}

/// Raster-scan labeler resolving label equivalences with a [`UnionFind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterLabeler {
    pub connectivity: Connectivity,
}

impl RasterLabeler {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    /// Neighbours already visited when the scan reaches a pixel.
    fn visited_neighbours(&self) -> &'static [(i32, i32)] {
        match self.connectivity {
            Connectivity::Four => &[(-1, 0), (0, -1)],
            Connectivity::Eight => &[(-1, 0), (-1, -1), (0, -1), (1, -1)],
        }
    }

    /// Labels a thresholded grayscale image; non-zero pixels are foreground.
    pub fn label_gray(&self, image: &GrayImage) -> Result<Labeling> {
        self.label(&BinaryRaster::from_gray(image)?)
    }
}

impl Labeler for RasterLabeler {
    fn label(&self, raster: &BinaryRaster) -> Result<Labeling> {
        let (width, height) = raster.dimensions();
        let neighbours = self.visited_neighbours();

        let mut provisional = LabelRaster::new(width, height)?;
        let mut sets = UnionFind::new();
        let mut registry = BlobRegistry::new();

        // first pass: provisional labels and equivalences
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if raster.get(x, y) != Some(true) {
                    continue;
                }
                let mut label = BACKGROUND;
                for &(dx, dy) in neighbours {
                    let n = provisional.get(x + dx, y + dy).unwrap_or(BACKGROUND);
                    if n == BACKGROUND {
                        continue;
                    }
                    if label == BACKGROUND {
                        label = n;
                    } else if n != label {
                        sets.union(label, n);
                    }
                }
                if label == BACKGROUND {
                    label = sets.make_set();
                }
                provisional.set(x as u32, y as u32, label);
                registry.observe(label, Point::new(x, y));
            }
        }

        let provisional_count = sets.len();
        let finalized = registry.finalize(&mut sets);

        // second pass: canonical, compacted labels
        let labels = provisional.map(|l| finalized.relabel[l as usize]);

        debug!(
            width,
            height,
            connectivity = %self.connectivity,
            provisional = provisional_count,
            blobs = finalized.blobs.len(),
            "labeled raster"
        );

        Ok(Labeling {
            labels,
            blobs: finalized.blobs,
            connectivity: self.connectivity,
        })
    }
}

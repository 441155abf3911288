pub mod builder;

use image::GrayImage;
use tracing::{debug, debug_span};

use crate::{
    contour::ContourTracer,
    error::Result,
    raster::BinaryRaster,
    traits::{BlobFilter, Labeler, PolygonProcessor},
    types::{BlobAnalysis, BlobShape},
};

/// Label -> filter -> trace -> polygonize -> simplify -> hull.
pub struct Pipeline {
    labeler: Box<dyn Labeler>,
    filters: Vec<Box<dyn BlobFilter>>,
    simplifier: Option<Box<dyn PolygonProcessor>>,
    hull_builder: Option<Box<dyn PolygonProcessor>>,
    parallel: bool,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        labeler: Box<dyn Labeler>,
        filters: Vec<Box<dyn BlobFilter>>,
        simplifier: Option<Box<dyn PolygonProcessor>>,
        hull_builder: Option<Box<dyn PolygonProcessor>>,
        parallel: bool,
    ) -> Self {
        Self {
            labeler,
            filters,
            simplifier,
            hull_builder,
            parallel,
        }
    }

    /// Process a thresholded grayscale image; non-zero pixels are foreground.
    pub fn process_gray(&self, image: &GrayImage) -> Result<BlobAnalysis> {
        self.process(&BinaryRaster::from_gray(image)?)
    }

    /// Run every stage on a binary raster
    pub fn process(&self, raster: &BinaryRaster) -> Result<BlobAnalysis> {
        let _span = debug_span!("pipeline", width = raster.width(), height = raster.height()).entered();

        // Step 1: label connected components
        let labeling = self.labeler.label(raster)?;
        let tracer = ContourTracer::new(labeling.connectivity);
        let mut labels = labeling.labels;
        let mut blobs = labeling.blobs;

        // Step 2: drop rejected blobs from both the set and the raster
        if !self.filters.is_empty() {
            let reference = labels.clone();
            let removed = blobs.retain(
                |blob| self.filters.iter().all(|f| f.keep(blob, &reference)),
                Some(&mut labels),
            );
            debug!(removed = removed.len(), kept = blobs.len(), "filtered blobs");
        }

        // Step 3: trace contours on the final raster
        tracer.trace_all(&labels, &mut blobs, self.parallel)?;

        // Step 4: polygons
        let mut shapes = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            let polygon = blob.contour.to_polygon();
            let simplified = self
                .simplifier
                .as_ref()
                .map(|s| s.process(&polygon))
                .transpose()?;
            let hull = self
                .hull_builder
                .as_ref()
                .map(|h| h.process(simplified.as_ref().unwrap_or(&polygon)))
                .transpose()?;
            shapes.push(BlobShape {
                label: blob.label,
                holes: blob.internal_contours.iter().map(|c| c.to_polygon()).collect(),
                polygon,
                simplified,
                hull,
            });
        }

        Ok(BlobAnalysis {
            image_width: labels.width(),
            image_height: labels.height(),
            labels,
            blobs,
            shapes,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let stage = |p: &Option<Box<dyn PolygonProcessor>>| p.as_ref().map_or("none", |p| p.name());
        format!(
            "Pipeline: {} filters, simplifier: {}, hull: {}, parallel tracing: {}",
            self.filters.len(),
            stage(&self.simplifier),
            stage(&self.hull_builder),
            self.parallel
        )
    }
}

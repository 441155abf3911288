use crate::{
    algorithms::{AreaFilter, BorderFilter, ConvexHullBuilder, DouglasPeuckerSimplifier},
    labeling::RasterLabeler,
    pipeline::Pipeline,
    raster::Connectivity,
    traits::{BlobFilter, Labeler, PolygonProcessor},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    labeler: Option<Box<dyn Labeler>>,
    connectivity: Connectivity,
    filters: Vec<Box<dyn BlobFilter>>,
    simplifier: Option<Box<dyn PolygonProcessor>>,
    hull_builder: Option<Box<dyn PolygonProcessor>>,
    parallel: bool,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            labeler: None,
            connectivity: Connectivity::default(),
            filters: Vec::new(),
            simplifier: None,
            hull_builder: None,
            parallel: false,
        }
    }

    /// Set the labeler (replaces the default [`RasterLabeler`])
    pub fn set_labeler<L>(mut self, labeler: L) -> Self
    where
        L: Labeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Connectivity of the default labeler; ignored once a labeler is set
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Add a blob filter; a blob survives only if every filter keeps it
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: BlobFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Keep blobs with `min_area <= area <= max_area`
    pub fn with_area_range(self, min_area: u64, max_area: Option<u64>) -> Self {
        self.add_filter(AreaFilter { min_area, max_area })
    }

    /// Drop blobs touching the image edge
    pub fn exclude_border_blobs(self) -> Self {
        self.add_filter(BorderFilter)
    }

    /// Set the polygon simplifier (replaces any existing one)
    pub fn set_simplifier<P>(mut self, simplifier: P) -> Self
    where
        P: PolygonProcessor + 'static,
    {
        self.simplifier = Some(Box::new(simplifier));
        self
    }

    /// Add Douglas-Peucker simplification of every outline
    pub fn with_simplification(self, tolerance: f64) -> Self {
        self.set_simplifier(DouglasPeuckerSimplifier { tolerance })
    }

    /// Compute the convex hull of every (simplified) outline
    pub fn with_convex_hull(mut self) -> Self {
        self.hull_builder = Some(Box::new(ConvexHullBuilder));
        self
    }

    /// Trace contours of different blobs on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let connectivity = self.connectivity;
        let labeler = self
            .labeler
            .unwrap_or_else(|| Box::new(RasterLabeler::new(connectivity)));

        Pipeline::new(
            labeler,
            self.filters,
            self.simplifier,
            self.hull_builder,
            self.parallel,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

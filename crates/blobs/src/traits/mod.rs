use crate::{
    error::Result,
    labeling::Labeling,
    polygon::Polygon,
    raster::{BinaryRaster, LabelRaster},
    types::Blob,
};

/// Trait for connected-component labeling algorithms
pub trait Labeler: Send + Sync {
    /// Label every connected foreground region of a binary raster
    fn label(&self, raster: &BinaryRaster) -> Result<Labeling>;
}

/// Trait for deciding which labeled blobs survive into the analysis
pub trait BlobFilter: Send + Sync {
    /// Whether the blob is kept; `labels` is the raster it was labeled in
    fn keep(&self, blob: &Blob, labels: &LabelRaster) -> bool;
}

/// Trait for polygon post-processing (simplification, hulls)
pub trait PolygonProcessor: Send + Sync {
    /// Derive a new polygon from a blob outline
    fn process(&self, polygon: &Polygon) -> Result<Polygon>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

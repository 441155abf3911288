use crate::{
    raster::{Label, LabelRaster},
    traits::BlobFilter,
    types::Blob,
};

/// Keeps blobs whose pixel count lies in `min_area..=max_area`.
#[derive(Debug, Clone)]
pub struct AreaFilter {
    pub min_area: u64,
    pub max_area: Option<u64>,
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            min_area: 1,
            max_area: None,
        }
    }
}

impl BlobFilter for AreaFilter {
    fn keep(&self, blob: &Blob, _labels: &LabelRaster) -> bool {
        blob.area >= self.min_area && self.max_area.is_none_or(|max| blob.area <= max)
    }
}

/// Drops blobs touching the raster edge; their true extent is unknown.
#[derive(Debug, Clone, Default)]
pub struct BorderFilter;

impl BlobFilter for BorderFilter {
    fn keep(&self, blob: &Blob, labels: &LabelRaster) -> bool {
        !blob.touches_border(labels.width(), labels.height())
    }
}

/// Keeps a single label.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    pub label: Label,
}

impl BlobFilter for LabelFilter {
    fn keep(&self, blob: &Blob, _labels: &LabelRaster) -> bool {
        blob.label == self.label
    }
}

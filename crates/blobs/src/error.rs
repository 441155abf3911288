use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Raster dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Labeling and tracing disagree about the raster contents. Only a bug
    /// in this crate produces it.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, BlobError>;

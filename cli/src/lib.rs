pub mod render;

use blobs::{BoundingBox, Connectivity, Pipeline};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rectangular region of interest in image pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn to_bbox(&self) -> Result<BoundingBox, ConfigError> {
        BoundingBox::from_origin_size(self.x, self.y, self.width, self.height)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Parses `x,y,width,height`.
impl FromStr for Roi {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let invalid = || ConfigError::Invalid(format!("expected x,y,width,height, got '{s}'"));
        let [x, y, w, h] = parts.as_slice() else {
            return Err(invalid());
        };
        Ok(Roi {
            x: x.parse().map_err(|_| invalid())?,
            y: y.parse().map_err(|_| invalid())?,
            width: w.parse().map_err(|_| invalid())?,
            height: h.parse().map_err(|_| invalid())?,
        })
    }
}

/// How blob pixels are filled in the overlay.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillMode {
    /// Leave the source image visible
    None,
    /// One colour per label
    #[default]
    Label,
    /// Mean colour of the blob in the source image
    MeanColor,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    pub fill: FillMode,
    /// Chain-code contours, external and internal
    pub contours: bool,
    /// Simplified outline polygons
    pub polygons: bool,
    pub hulls: bool,
    pub bounding_boxes: bool,
    pub centroids: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fill: FillMode::Label,
            contours: true,
            polygons: true,
            hulls: true,
            bounding_boxes: false,
            centroids: true,
        }
    }
}

/// Command-line values that take precedence over a configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub threshold: Option<u8>,
    pub connectivity: Option<Connectivity>,
    /// Also enables simplification
    pub tolerance: Option<f64>,
    pub roi: Option<Roi>,
    pub min_area: Option<u64>,
    pub max_area: Option<u64>,
    pub no_simplify: bool,
    pub no_hull: bool,
    pub parallel: bool,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Gray levels above this value are foreground
    pub threshold: u8,
    pub connectivity: Connectivity,
    pub simplify: bool,
    /// Douglas-Peucker tolerance in pixels
    pub tolerance: f64,
    pub convex_hull: bool,
    pub min_area: u64,
    pub max_area: Option<u64>,
    pub exclude_border: bool,
    pub roi: Option<Roi>,
    /// Trace blobs on the rayon thread pool
    pub parallel: bool,
    pub render: RenderOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 100,
            connectivity: Connectivity::Eight,
            simplify: true,
            tolerance: 10.0,
            convex_hull: true,
            min_area: 1,
            max_area: None,
            exclude_border: false,
            roi: None,
            parallel: false,
            render: RenderOptions::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    /// Auto-detect file format and save configuration
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml_file(path),
            Some("json") => self.to_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&schemars::schema_for!(AnalysisConfig))?)
    }

    /// Reject values no analysis can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be a finite, non-negative number, got {}",
                self.tolerance
            )));
        }
        if let Some(max) = self.max_area {
            if max < self.min_area {
                return Err(ConfigError::Invalid(format!(
                    "max_area ({max}) is smaller than min_area ({})",
                    self.min_area
                )));
            }
        }
        if let Some(roi) = &self.roi {
            roi.to_bbox()?;
        }
        Ok(())
    }

    /// Apply command-line overrides, then validate the result
    pub fn apply(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(connectivity) = overrides.connectivity {
            self.connectivity = connectivity;
        }
        if let Some(tolerance) = overrides.tolerance {
            self.tolerance = tolerance;
            self.simplify = true;
        }
        if overrides.no_simplify {
            self.simplify = false;
        }
        if overrides.no_hull {
            self.convex_hull = false;
        }
        if let Some(roi) = overrides.roi {
            self.roi = Some(roi);
        }
        if let Some(min_area) = overrides.min_area {
            self.min_area = min_area;
        }
        if let Some(max_area) = overrides.max_area {
            self.max_area = Some(max_area);
        }
        self.parallel |= overrides.parallel;
        self.validate()
    }

    /// Build the blob pipeline this configuration describes
    pub fn pipeline(&self) -> Pipeline {
        let mut builder = Pipeline::builder()
            .connectivity(self.connectivity)
            .parallel(self.parallel);
        if self.min_area > 1 || self.max_area.is_some() {
            builder = builder.with_area_range(self.min_area, self.max_area);
        }
        if self.exclude_border {
            builder = builder.exclude_border_blobs();
        }
        if self.simplify {
            builder = builder.with_simplification(self.tolerance);
        }
        if self.convex_hull {
            builder = builder.with_convex_hull();
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.threshold, 100);
        assert_eq!(config.tolerance, 10.0);
        assert_eq!(config.connectivity, Connectivity::Eight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalysisConfig {
            threshold: 80,
            connectivity: Connectivity::Four,
            roi: Some(Roi { x: 100, y: 100, width: 800, height: 500 }),
            max_area: Some(5000),
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("connectivity = \"four\""));
        assert_eq!(AnalysisConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json(r#"{ "threshold": 50, "render": { "fill": "mean_color" } }"#).unwrap();
        assert_eq!(config.threshold, 50);
        assert_eq!(config.tolerance, 10.0);
        assert_eq!(config.render.fill, FillMode::MeanColor);
        assert!(config.render.contours);
    }

    #[test]
    fn test_validation() {
        let config = AnalysisConfig { tolerance: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = AnalysisConfig { min_area: 10, max_area: Some(5), ..Default::default() };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            roi: Some(Roi { x: 0, y: 0, width: 0, height: 4 }),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(matches!(
            AnalysisConfig::from_file("config.yaml"),
            Err(ConfigError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_roi_parsing() {
        assert_eq!(
            "100, 100,800,500".parse::<Roi>().unwrap(),
            Roi { x: 100, y: 100, width: 800, height: 500 }
        );
        assert!("1,2,3".parse::<Roi>().is_err());
        assert!("a,b,c,d".parse::<Roi>().is_err());
        assert_eq!("mean_color".parse::<FillMode>().unwrap(), FillMode::MeanColor);
    }

    #[test]
    fn test_config_pipeline() {
        let config = AnalysisConfig { min_area: 2, simplify: false, ..Default::default() };
        let raster = blobs::BinaryRaster::from_ascii(&["#...", "..##", "..##"]).unwrap();
        let analysis = config.pipeline().process(&raster).unwrap();
        assert_eq!(analysis.blobs.len(), 1);
        let shape = &analysis.shapes[0];
        assert!(shape.simplified.is_none());
        assert!(shape.hull.is_some());
    }

    #[test]
    fn test_overrides() {
        let mut config = AnalysisConfig { simplify: false, ..Default::default() };
        config
            .apply(&Overrides { tolerance: Some(2.5), max_area: Some(50), ..Default::default() })
            .unwrap();
        assert!(config.simplify);
        assert_eq!(config.tolerance, 2.5);
        assert_eq!(config.max_area, Some(50));
        assert!(config.convex_hull);

        config
            .apply(&Overrides { no_simplify: true, no_hull: true, ..Default::default() })
            .unwrap();
        assert!(!config.simplify);
        assert!(!config.convex_hull);
        let raster = blobs::BinaryRaster::from_ascii(&["##", "##"]).unwrap();
        let shape = config.pipeline().process(&raster).unwrap().shapes.remove(0);
        assert!(shape.simplified.is_none() && shape.hull.is_none());

        let bad = Overrides { min_area: Some(100), ..Default::default() };
        assert!(config.apply(&bad).is_err());
    }

    #[test]
    fn test_schema() {
        let schema = AnalysisConfig::json_schema().unwrap();
        assert!(schema.contains("threshold"));
    }
}

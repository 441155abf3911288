use blobs::{BinaryRaster, BlobAnalysis, BoundingBox, Connectivity};
use clap::{Args, Parser, Subcommand};
use cli::{AnalysisConfig, Overrides, Roi, render};
use color_eyre::eyre::{Result, eyre};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label blobs in an image, report their statistics and draw them
    Analyze(AnalyzeArgs),
    /// Write a configuration file with default values
    InitConfig {
        /// Path of the configuration file (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the input image
    #[arg(short, long)]
    input: PathBuf,
    /// Configuration file (.toml or .json); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Gray levels above this value are foreground
    #[arg(long)]
    threshold: Option<u8>,
    /// Pixel adjacency: four or eight
    #[arg(long)]
    connectivity: Option<Connectivity>,
    /// Douglas-Peucker tolerance in pixels; enables simplification
    #[arg(long, conflicts_with = "no_simplify")]
    tolerance: Option<f64>,
    /// Keep the lossless contour polygons
    #[arg(long)]
    no_simplify: bool,
    /// Skip convex hulls
    #[arg(long)]
    no_hull: bool,
    /// Region of interest as x,y,width,height
    #[arg(long)]
    roi: Option<Roi>,
    #[arg(long)]
    min_area: Option<u64>,
    #[arg(long)]
    max_area: Option<u64>,
    /// Trace contours in parallel
    #[arg(long)]
    parallel: bool,
    /// Overlay image to write
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// GeoJSON file to write
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Full analysis (blobs and polygons) as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

impl AnalyzeArgs {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        config.apply(&Overrides {
            threshold: self.threshold,
            connectivity: self.connectivity,
            tolerance: self.tolerance,
            roi: self.roi,
            min_area: self.min_area,
            max_area: self.max_area,
            no_simplify: self.no_simplify,
            no_hull: self.no_hull,
            parallel: self.parallel,
        })?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze(args) => analyze(args)?,
        Commands::InitConfig { output } => {
            AnalysisConfig::default().to_file(output)?;
            info!("Configuration saved to: {:?}", output);
        }
        Commands::Schema => println!("{}", AnalysisConfig::json_schema()?),
    }

    Ok(())
}

fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = args.config()?;
    debug!(?config, "effective configuration");

    let image = image::open(&args.input)?;
    info!("Input image: {:?} ({}x{})", args.input, image.width(), image.height());

    let binary = imageproc::contrast::threshold(&image.to_luma8(), config.threshold);
    let mut raster = BinaryRaster::from_gray(&binary)?;
    let mut source = image.to_rgb8();

    if let Some(roi) = &config.roi {
        let frame = BoundingBox::from_origin_size(0, 0, source.width(), source.height())?;
        let region = frame
            .intersect(&roi.to_bbox()?)
            .ok_or_else(|| eyre!("region of interest {roi:?} lies outside the image"))?;
        raster = raster.crop(&region)?;
        source = image::imageops::crop_imm(
            &source,
            region.min_x as u32,
            region.min_y as u32,
            region.width(),
            region.height(),
        )
        .to_image();
        info!("Region of interest: {:?}", region);
    }

    let pipeline = config.pipeline();
    info!("{}", pipeline.info());
    let analysis = pipeline.process(&raster)?;
    report(&analysis, &source)?;

    if let Some(output) = &args.output {
        render::render(&source, &analysis, &config.render)?.save(output)?;
        info!("Overlay saved to: {:?}", output);
    }
    if let Some(path) = &args.geojson {
        analysis.save_geojson(path)?;
        info!("GeoJSON saved to: {:?}", path);
    }
    if let Some(path) = &args.json {
        write_json(&analysis, path)?;
        info!("Analysis saved to: {:?}", path);
    }

    Ok(())
}

fn report(analysis: &BlobAnalysis, source: &RgbImage) -> Result<()> {
    info!(
        "Found {} blobs covering {} pixels",
        analysis.blobs.len(),
        analysis.blobs.total_area()
    );
    for blob in &analysis.blobs {
        let [r, g, b] = blob.mean_color(source, &analysis.labels)?;
        let [cx, cy] = blob.centroid;
        info!(
            "Blob #{}: area={} centroid=({:.1}, {:.1}) angle={:.1}° mean color=({:.0}, {:.0}, {:.0}) contour={} steps holes={}",
            blob.label,
            blob.area,
            cx,
            cy,
            blob.angle().to_degrees(),
            r,
            g,
            b,
            blob.contour.len(),
            blob.hole_count(),
        );
        if let Some(shape) = analysis.shape(blob.label) {
            info!(
                "  polygon: {} vertices, simplified: {}, hull: {}",
                shape.polygon.len(),
                shape.simplified.as_ref().map_or(0, |p| p.len()),
                shape.hull.as_ref().map_or(0, |p| p.len()),
            );
        }
    }
    if let Some(largest) = analysis.blobs.largest() {
        info!("Largest blob: #{} ({} pixels)", largest.label, largest.area);
    }
    Ok(())
}

fn write_json(analysis: &BlobAnalysis, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(analysis)?)?;
    Ok(())
}

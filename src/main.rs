use clap::{Parser, ValueEnum};
use quadseek::{DetConfig, EngineError, Frame, PixelFormat, ScreenReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quadseek")]
#[command(about = "quadseek - find square regions in a screenshot", long_about = None)]
struct Cli {
    /// Input image path
    image: PathBuf,

    /// Upper Canny threshold for the edge level
    #[arg(long)]
    thresh: Option<f32>,

    /// Number of threshold levels
    #[arg(long)]
    levels: Option<u32>,

    /// JSON file with detector settings; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON output with quads and bounding boxes
    Json,
    /// Plain text, one `x y width height` line per region
    Text,
    /// TSV format: min_x\tmin_y\tmax_x\tmax_y\tx1,y1,x2,y2,x3,y3,x4,y4
    Tsv,
}

fn load_config(cli: &Cli) -> Result<DetConfig, EngineError> {
    let mut cfg = match &cli.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => DetConfig::default(),
    };
    if let Some(thresh) = cli.thresh {
        cfg.thresh = thresh;
    }
    if let Some(levels) = cli.levels {
        cfg.levels = levels;
    }
    Ok(cfg)
}

/// Repack a decoded image as the BGRX rows a screen capture delivers.
fn to_bgrx(img: &image::RgbImage) -> Vec<u8> {
    let mut data = Vec::with_capacity(img.width() as usize * img.height() as usize * 4);
    for p in img.pixels() {
        data.extend_from_slice(&[p[2], p[1], p[0], 0]);
    }
    data
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let reader = ScreenReader::new(cfg)?;

    // Load image
    let img = image::open(&cli.image).map_err(EngineError::from)?.to_rgb8();
    info!(path = %cli.image.display(), width = img.width(), height = img.height(), "image loaded");

    let pixels = to_bgrx(&img);
    let frame = Frame::new(&pixels, img.width(), img.height(), PixelFormat::Bgr888).map_err(EngineError::from)?;

    let quads = reader.detect_squares(&frame);

    // Output results
    match cli.format {
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "quads": quads.iter().map(|q| q.points.iter().map(|p| serde_json::json!({"x": p.x, "y": p.y})).collect::<Vec<_>>()).collect::<Vec<_>>(),
                "regions": quads.iter().map(|q| q.bounding_box()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Text => {
            for quad in &quads {
                let b = quad.bounding_box();
                println!("{} {} {} {}", b.min_x, b.min_y, b.width(), b.height());
            }
        }
        OutputFormat::Tsv => {
            for quad in &quads {
                let b = quad.bounding_box();
                let p = &quad.points;
                let pts_str = format!(
                    "{},{},{},{},{},{},{},{}",
                    p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y,
                );
                println!("{}\t{}\t{}\t{}\t{}", b.min_x, b.min_y, b.max_x, b.max_y, pts_str);
            }
        }
    }

    Ok(())
}

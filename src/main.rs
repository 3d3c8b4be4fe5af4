use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use texture_qa::{config::Config, frame::Frame, qa::SceneElement, TextureQaError};

#[derive(Parser)]
#[command(
    name = "texture-qa",
    version,
    about = "Apply a stylistic texture to a frame and dial it back until the text stays legible",
    long_about = "texture-qa applies grain, feathering, posterization and an optional halftone screen to a rendered frame, checks text contrast and safe-area placement, and weakens the texture step by step until the frame passes or the retry budget runs out."
)]
struct Cli {
    /// Input image (PNG or JPEG)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image path
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene placement JSON: an array of elements or an object with an `elements` array
    #[arg(short, long)]
    placement: Option<PathBuf>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured retry budget
    #[arg(long)]
    max_retries: Option<u32>,

    /// Write the attempt audit trail as JSON
    #[arg(long)]
    audit: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting texture-qa v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", cli.input);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(friendly)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate().map_err(friendly)?;

    let texture = config.texture_config().map_err(friendly)?;
    let controller = config.controller().map_err(friendly)?;
    let seed = cli.seed.unwrap_or(config.seed);
    let max_retries = cli.max_retries.unwrap_or(config.dialback.max_retries);

    let placement = match &cli.placement {
        Some(path) => Some(load_placement(path)?),
        None => None,
    };
    if placement.is_none() {
        warn!("No placement given; only the texture is applied, QA has nothing to check");
    }

    let image = image::open(&cli.input)
        .with_context(|| format!("Failed to open input image {:?}", cli.input))?;
    let frame = Frame::from(image.to_rgba8());
    info!("Frame: {}x{}", frame.width(), frame.height());

    let outcome = controller.run(&frame, placement.as_deref(), &texture, seed, max_retries);

    if let Some(record) = outcome.final_attempt() {
        info!(
            "Final config {} after {} attempt(s): ok={}",
            record.signature.short(),
            outcome.attempts_used(),
            record.result.ok()
        );
        for fail in record.result.fails() {
            warn!("QA failure: {}", fail);
        }
        for warning in record.result.warnings() {
            info!("QA warning: {}", warning);
        }
    }

    if let Some(audit_path) = &cli.audit {
        let json = serde_json::to_string_pretty(&outcome.report())?;
        std::fs::write(audit_path, json)
            .with_context(|| format!("Failed to write audit trail {:?}", audit_path))?;
        info!("Audit trail saved to: {:?}", audit_path);
    }

    let succeeded = outcome.succeeded;
    save_frame(&outcome.frame, &cli.output)?;

    if succeeded {
        info!("Done! Output saved to: {:?}", cli.output);
    } else {
        warn!(
            "Retry budget exhausted; the last attempt was saved to {:?}",
            cli.output
        );
    }
    Ok(())
}

fn load_placement(path: &Path) -> Result<Vec<SceneElement>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read placement file {:?}", path))?;
    let elements = SceneElement::parse_scene(&content)
        .with_context(|| format!("Placement file {:?} is not valid scene JSON", path))?;
    info!("Loaded {} scene element(s)", elements.len());
    Ok(elements)
}

fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let is_jpeg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);

    // JPEG has no alpha channel
    let saved = if is_jpeg {
        frame.to_rgb_image().save(path)
    } else {
        frame.as_image().save(path)
    };
    saved.with_context(|| format!("Failed to save output image {:?}", path))
}

fn friendly(err: TextureQaError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

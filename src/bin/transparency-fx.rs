use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use transparency_fx::session::settings::DEFAULT_OPACITY;
use transparency_fx::{
    Config, EffectMode, ModeKind, PrecomputedMask, Processor, ProviderError, ProviderHandle,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to process (JPEG, PNG or WebP)
    image: PathBuf,

    /// Segmentation mask for the image, same size, white = subject
    #[arg(short, long)]
    mask: PathBuf,

    /// RGBA cutout whose alpha marks the subject in `full` mode
    #[arg(long)]
    cutout: Option<PathBuf>,

    /// Effect: full, semi, soft, subject or custom
    #[arg(long)]
    mode: Option<ModeKind>,

    /// Background opacity percent for `custom` mode (1-99); implies custom
    #[arg(long)]
    opacity: Option<u8>,

    /// Directory the PNG is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the processing timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seconds) = args.timeout {
        config.processing_timeout_seconds = seconds;
        config.validate().context("Invalid timeout")?;
    }

    let kind = args.mode.unwrap_or(if args.opacity.is_some() {
        ModeKind::Custom
    } else {
        ModeKind::Full
    });
    let mode = EffectMode::from_kind(kind, args.opacity.unwrap_or(DEFAULT_OPACITY))
        .context("Invalid effect settings")?;

    let mask = image::open(&args.mask)
        .with_context(|| format!("Failed to read mask {}", args.mask.display()))?
        .into_luma8();
    let mut precomputed = PrecomputedMask::new(mask);
    if let Some(path) = &args.cutout {
        let cutout = image::open(path)
            .with_context(|| format!("Failed to read cutout {}", path.display()))?
            .into_rgba8();
        precomputed = precomputed.with_cutout(cutout);
    }

    let provider = ProviderHandle::init(&config.model, |_| {
        Ok::<_, ProviderError>(precomputed)
    })
    .context("Failed to initialize mask provider")?;
    let processor = Processor::new(&config, provider);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let processed = match processor.process(&bytes, mode).await {
        Ok(processed) => processed,
        Err(error) => {
            tracing::error!("Error processing image: {error}");
            anyhow::bail!(error.user_message());
        }
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let output = args.output_dir.join(&processed.file_name);
    std::fs::write(&output, &processed.png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        "Wrote {}x{} {} image to {}",
        processed.width,
        processed.height,
        processed.mode,
        output.display()
    );
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise INFO, or DEBUG with `--debug`
fn init_tracing(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

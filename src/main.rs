mod dataset;
mod error;
mod marks;
mod media;
mod utils;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::dataset::pipeline::ExtractionPipeline;
use crate::marks::events;
use crate::marks::timeline::{Timeline, DEFAULT_FRAME_RATE};
use crate::media::{ffmpeg, mimetype};
use crate::utils::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a reviewed video into a labeled, deduplicated image dataset", long_about = None)]
struct Args {
    /// Source video the reviewer marked
    #[arg(short, long)]
    video: PathBuf,

    /// JSON file with the reviewer's mark events
    #[arg(short, long)]
    marks: PathBuf,

    /// Dataset directory name, created under the source path
    #[arg(short, long)]
    dataset: Option<String>,

    /// Optional key=value config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hamming-distance threshold for near-duplicate grouping
    #[arg(long)]
    hash_threshold: Option<u32>,

    /// Working directory for relative paths and the dataset root
    #[arg(long)]
    source_path: Option<PathBuf>,

    /// Downscale every extracted frame by this factor before partitioning
    #[arg(long)]
    resize_factor: Option<f32>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = resolve_config(&args)?;
    info!("dataset root: {}", config.output_root().display());

    if let Some(factor) = args.resize_factor {
        if !(factor > 0.0 && factor <= 1.0) {
            bail!("--resize-factor must be in (0, 1], got {factor}");
        }
    }

    // Relative inputs are taken from the configured source path; absolute
    // paths pass through `join` untouched.
    let video = config.source_path.join(&args.video);
    let marks = config.source_path.join(&args.marks);

    if !video.is_file() {
        bail!("video not found: {}", video.display());
    }
    if !mimetype::is_video(&video).context("failed to sniff input type")? {
        bail!("{} does not look like a video file", video.display());
    }

    let encoded = ffmpeg::ensure_fixed_rate(&video, DEFAULT_FRAME_RATE)
        .context("fixed-rate transcode failed")?;

    let timeline = Timeline::default();
    let mark_events = events::load_events(&marks)
        .with_context(|| format!("failed to read marks from {}", marks.display()))?;
    let board = events::replay(&mark_events, &timeline)?;

    if board.is_empty() {
        warn!("mark file contains no events; nothing will be extracted");
    }
    for (class, range) in board.marked() {
        info!("class {}: {}", class, range);
    }

    fs::create_dir_all(config.output_root())
        .with_context(|| format!("failed to create {}", config.output_root().display()))?;
    // Record the resolved settings with the dataset so a rerun can reuse them.
    if let Err(e) = config.save(&config.output_root().join("framesift.conf")) {
        warn!("could not record config: {e}");
    }

    let pipeline = ExtractionPipeline {
        rate: timeline.rate(),
        hash_threshold: config.hash_threshold,
        resize_factor: args.resize_factor,
    };
    let summary = pipeline.run(&encoded, &board, &config.output_root())?;

    info!(
        "done: {} frames extracted, {} classes, {} true / {} false copies, {} near-duplicates dropped",
        summary.frames_extracted,
        summary.classes,
        summary.positives,
        summary.negatives,
        summary.deduped
    );
    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// File config first (when given), then CLI flags on top. A dataset name has
/// to come from one of the two.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match (&args.config, &args.dataset) {
        (Some(path), _) => {
            Config::load(path).with_context(|| format!("failed to load {}", path.display()))?
        }
        (None, Some(name)) => Config::new(name.clone()),
        (None, None) => bail!("a dataset name is required (--dataset or --config)"),
    };

    if let Some(name) = &args.dataset {
        config.dataset_name = name.clone();
    }
    if let Some(threshold) = args.hash_threshold {
        config.hash_threshold = threshold;
    }
    if let Some(path) = &args.source_path {
        config.source_path = path.clone();
    }
    Ok(config)
}

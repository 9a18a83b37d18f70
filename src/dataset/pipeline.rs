use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::dataset::dedupe::DuplicateFilter;
use crate::dataset::partition;
use crate::error::Result;
use crate::marks::tracker::MarkBoard;
use crate::media::{ffmpeg, resize};

/// One extraction run: plan how many frames the marks need, pull them with
/// the external extractor, optionally downscale, then partition into buckets
/// with per-bucket deduplication. Stages run synchronously and in order;
/// any failure aborts the rest of the run.
pub struct ExtractionPipeline {
    pub rate: u32,
    pub hash_threshold: u32,
    pub resize_factor: Option<f32>,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub frames_extracted: u64,
    pub classes: usize,
    pub positives: u64,
    pub negatives: u64,
    pub deduped: u64,
}

impl ExtractionPipeline {
    pub fn run(&self, video: &Path, board: &MarkBoard, output_root: &Path) -> Result<RunSummary> {
        let total = board.last_frame_needed();
        if total == 0 {
            // Nothing marked past frame 0: request no frames, build no
            // buckets. Frame 0 has no extracted file, so a lone mark there
            // takes the same exit.
            info!("no frames marked; nothing to extract");
            return Ok(RunSummary::default());
        }

        let frames_dir = staging_dir(video);
        ffmpeg::extract_frames(video, &frames_dir, total, self.rate)?;

        if let Some(factor) = self.resize_factor {
            resize::downscale_frames(&frames_dir, total, factor)?;
        }

        let filter = DuplicateFilter::new(self.hash_threshold);
        let parts = partition::partition(&frames_dir, board, output_root, &filter)?;

        Ok(RunSummary {
            frames_extracted: total,
            classes: parts.classes,
            positives: parts.positives,
            negatives: parts.negatives,
            deduped: parts.deduped,
        })
    }
}

/// Extracted stills stage in an `image/` directory next to the video.
pub fn staging_dir(video: &Path) -> PathBuf {
    video.parent().unwrap_or(Path::new(".")).join("image")
}

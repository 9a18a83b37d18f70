use std::path::Path;

use image::imageops::FilterType;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::error::{Error, Result};
use crate::media::ffmpeg::FRAME_EXT;

/// Downscales one still in place by `factor`, keeping the aspect ratio.
pub fn downscale(path: &Path, factor: f32) -> Result<()> {
    let img = image::open(path).map_err(|e| Error::Image {
        path: path.to_path_buf(),
        source: e,
    })?;
    let width = scaled(img.width(), factor);
    let height = scaled(img.height(), factor);
    img.resize_exact(width, height, FilterType::Triangle)
        .save(path)
        .map_err(|e| Error::Image {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Downscales every extracted frame `1..=count`. Any failure aborts the run;
/// the later stages never see a half-resized frame set.
pub fn downscale_frames(dir: &Path, count: u64, factor: f32) -> Result<()> {
    info!("downscaling {} frames by {}", count, factor);
    let bar = ProgressBar::new(count);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} resized") {
        bar.set_style(style);
    }
    for ordinal in 1..=count {
        downscale(&dir.join(format!("{ordinal}.{FRAME_EXT}")), factor)?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(())
}

fn scaled(dim: u32, factor: f32) -> u32 {
    ((dim as f32 * factor).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn halves_both_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8, y as u8, 0]))
            .save(&path)
            .unwrap();

        downscale(&path, 0.5).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (32, 24));
    }

    #[test]
    fn never_collapses_below_one_pixel() {
        assert_eq!(scaled(3, 0.1), 1);
        assert_eq!(scaled(1000, 0.25), 250);
    }

    #[test]
    fn missing_frame_surfaces_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = downscale(&dir.path().join("9.jpg"), 0.5).unwrap_err();
        assert!(err.to_string().contains("9.jpg"));
    }
}

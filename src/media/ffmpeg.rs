use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{Error, Result};

/// Extension the extraction collaborator writes still frames with.
pub const FRAME_EXT: &str = "jpg";

const ENCODED_SUFFIX: &str = "_encoded";

/// Re-encodes `input` to the sibling `<stem>_encoded.<ext>` file at the fixed
/// rate and returns its path. An input already carrying the suffix is used
/// as-is without touching ffmpeg.
pub fn ensure_fixed_rate(input: &Path, rate: u32) -> Result<PathBuf> {
    match encoded_target(input) {
        None => Ok(input.to_path_buf()),
        Some(target) => {
            info!("re-encoding {} at {} fps", input.display(), rate);
            run_tool("ffmpeg", encode_args(input, &target, rate))?;
            Ok(target)
        }
    }
}

/// Pulls exactly `count` sequentially numbered stills (`1.jpg` .. `count.jpg`)
/// out of a fixed-rate video into `out_dir`.
pub fn extract_frames(video: &Path, out_dir: &Path, count: u64, rate: u32) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    info!("extracting {} frames from {}", count, video.display());
    run_tool("ffmpeg", extract_args(video, out_dir, count, rate))
}

/// Sibling path the fixed-rate copy goes to, or `None` when `input` already
/// is one.
fn encoded_target(input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem.ends_with(ENCODED_SUFFIX) {
        return None;
    }
    let ext = input.extension().and_then(|s| s.to_str()).unwrap_or("mp4");
    Some(input.with_file_name(format!("{stem}{ENCODED_SUFFIX}.{ext}")))
}

fn encode_args(input: &Path, output: &Path, rate: u32) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-r".into(),
        rate.to_string().into(),
        output.into(),
    ]
}

fn extract_args(video: &Path, out_dir: &Path, count: u64, rate: u32) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        video.into(),
        "-vf".into(),
        format!("fps={rate}").into(),
        "-frames:v".into(),
        count.to_string().into(),
        out_dir.join(format!("%d.{FRAME_EXT}")).into(),
    ]
}

/// Runs a collaborator to completion. stderr is captured so a failure can be
/// reported with the tool's own diagnostics.
fn run_tool(tool: &'static str, args: Vec<OsString>) -> Result<()> {
    let output = Command::new(tool)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::ExternalTool {
            tool,
            detail: format!("failed to launch: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ExternalTool {
            tool,
            detail: format!("{}: {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_target_adds_suffix_next_to_input() {
        let target = encoded_target(Path::new("/videos/clip.mp4")).unwrap();
        assert_eq!(target, PathBuf::from("/videos/clip_encoded.mp4"));
    }

    #[test]
    fn already_encoded_input_is_reused() {
        assert_eq!(encoded_target(Path::new("/videos/clip_encoded.mp4")), None);
    }

    #[test]
    fn extract_requests_exactly_the_needed_frames() {
        let args = extract_args(Path::new("v.mp4"), Path::new("image"), 37, 120);
        assert!(args.contains(&OsString::from("-frames:v")));
        assert!(args.contains(&OsString::from("37")));
        assert!(args.contains(&OsString::from("fps=120")));
        let pattern = args.last().unwrap().to_string_lossy().into_owned();
        assert!(pattern.ends_with("%d.jpg"), "pattern was {pattern}");
    }

    #[test]
    fn encode_pins_the_output_rate() {
        let args = encode_args(Path::new("in.avi"), Path::new("in_encoded.avi"), 120);
        assert!(args.contains(&OsString::from("-r")));
        assert!(args.contains(&OsString::from("120")));
    }
}

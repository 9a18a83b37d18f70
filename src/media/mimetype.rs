use std::path::Path;

use crate::error::Result;

pub fn detect_mimetype(path: &Path) -> Result<String> {
    let kind = infer::get_from_path(path)?;
    match kind {
        Some(k) => Ok(k.mime_type().to_string()),
        None => Ok("application/octet-stream".to_string()),
    }
}

/// Gate run before any external tool: only video input is accepted.
pub fn is_video(path: &Path) -> Result<bool> {
    Ok(detect_mimetype(path)?.starts_with("video/"))
}

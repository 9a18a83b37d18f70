use std::path::PathBuf;
use thiserror::Error;

use crate::marks::tracker::ClassId;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort an extraction run. There is no partial-success mode:
/// a half-built dataset is worse than a visible failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A required external collaborator exited with a failure status.
    /// `detail` carries the tool's own diagnostic output.
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: &'static str, detail: String },

    /// A frame file expected for a marked index was absent at copy time.
    #[error("frame {ordinal} for class {class} is missing at {}", path.display())]
    MissingFrame {
        class: ClassId,
        ordinal: u64,
        path: PathBuf,
    },

    #[error("class id {0} is out of range (0-15)")]
    InvalidClass(u8),

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("malformed mark file: {0}")]
    MarkFile(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_HASH_THRESHOLD: u32 = 10;

/// Run configuration. CLI flags override anything loaded from a file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dataset directory name, created under the source path.
    pub dataset_name: String,
    /// Hamming-distance threshold for near-duplicate grouping.
    pub hash_threshold: u32,
    /// Working directory for relative paths and the dataset root.
    pub source_path: PathBuf,
}

impl Config {
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            hash_threshold: DEFAULT_HASH_THRESHOLD,
            source_path: PathBuf::from("."),
        }
    }

    /// Loads a `key=value` config file. `DATASET_NAME` is required; the
    /// other keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut dataset_name = None;
        let mut hash_threshold = DEFAULT_HASH_THRESHOLD;
        let mut source_path = PathBuf::from(".");

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "DATASET_NAME" => dataset_name = Some(value.trim().to_string()),
                    "HASH_THRESHOLD" => {
                        hash_threshold = value.trim().parse().map_err(|_| {
                            Error::Config(format!("invalid HASH_THRESHOLD: {}", value.trim()))
                        })?;
                    }
                    "SOURCE_PATH" => source_path = PathBuf::from(value.trim()),
                    _ => {}
                }
            }
        }

        let dataset_name = dataset_name
            .ok_or_else(|| Error::Config(format!("{}: DATASET_NAME missing", path.display())))?;

        Ok(Self {
            dataset_name,
            hash_threshold,
            source_path,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "DATASET_NAME={}", self.dataset_name)?;
        writeln!(file, "HASH_THRESHOLD={}", self.hash_threshold)?;
        writeln!(file, "SOURCE_PATH={}", self.source_path.display())?;
        Ok(())
    }

    /// Where the per-class bucket tree is built.
    pub fn output_root(&self) -> PathBuf {
        self.source_path.join(&self.dataset_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framesift.conf");

        let mut config = Config::new("gestures");
        config.hash_threshold = 6;
        config.source_path = PathBuf::from("/data/session");
        config.save(&path)?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.dataset_name, "gestures");
        assert_eq!(loaded.hash_threshold, 6);
        assert_eq!(loaded.source_path, PathBuf::from("/data/session"));
        assert_eq!(loaded.output_root(), PathBuf::from("/data/session/gestures"));

        Ok(())
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framesift.conf");
        fs::write(&path, "# comment\nDATASET_NAME=blinks\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.dataset_name, "blinks");
        assert_eq!(config.hash_threshold, DEFAULT_HASH_THRESHOLD);
        assert_eq!(config.source_path, PathBuf::from("."));
    }

    #[test]
    fn missing_dataset_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framesift.conf");
        fs::write(&path, "HASH_THRESHOLD=4\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framesift.conf");
        fs::write(&path, "DATASET_NAME=x\nHASH_THRESHOLD=soon\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }
}

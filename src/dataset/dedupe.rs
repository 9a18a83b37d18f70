use std::fs;
use std::path::{Path, PathBuf};

use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// How many visually-alike frames one group may keep.
pub const GROUP_CAP: usize = 40;

/// Thins a false bucket by perceptual similarity: one forward greedy pass
/// groups each unassigned file with every later file within `threshold`
/// Hamming distance of it, then each group keeps its first `cap` members.
///
/// Grouping is anchor-to-member only, never member-to-member. A file can sit
/// in a group while being dissimilar to other members; that non-transitivity
/// is the intended behavior, not something to replace with real clustering.
pub struct DuplicateFilter {
    hasher: Hasher,
    threshold: u32,
    cap: usize,
}

impl DuplicateFilter {
    pub fn new(threshold: u32) -> Self {
        Self::with_cap(threshold, GROUP_CAP)
    }

    pub fn with_cap(threshold: u32, cap: usize) -> Self {
        Self {
            hasher: HasherConfig::new().hash_alg(HashAlg::Mean).to_hasher(),
            threshold,
            cap,
        }
    }

    /// Deletes near-duplicate overflow from one bucket directory in place and
    /// returns how many files went. Files are visited in ascending numeric
    /// filename order, so the survivors of a group are always its earliest
    /// frames.
    pub fn filter_bucket(&self, dir: &Path) -> Result<usize> {
        let files = numbered_files(dir);
        if files.len() <= 1 {
            return Ok(0);
        }

        // Hash computation is order-preserving data parallelism; grouping
        // below stays sequential because assignment feeds later anchor scans.
        let hashes = files
            .par_iter()
            .map(|path| self.hash_file(path))
            .collect::<Result<Vec<_>>>()?;

        let mut assigned = vec![false; files.len()];
        let mut removed = 0usize;

        for anchor in 0..files.len() {
            if assigned[anchor] {
                continue;
            }
            assigned[anchor] = true;
            let mut group = vec![anchor];

            for candidate in anchor + 1..files.len() {
                if assigned[candidate] {
                    continue;
                }
                if hashes[anchor].dist(&hashes[candidate]) <= self.threshold {
                    assigned[candidate] = true;
                    group.push(candidate);
                }
            }

            for &overflow in group.iter().skip(self.cap) {
                fs::remove_file(&files[overflow])?;
                removed += 1;
            }
            debug!(
                "group anchored at {}: {} members, {} dropped",
                files[anchor].display(),
                group.len(),
                group.len().saturating_sub(self.cap)
            );
        }

        Ok(removed)
    }

    fn hash_file(&self, path: &Path) -> Result<ImageHash> {
        let img = image::open(path).map_err(|e| Error::Image {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(self.hasher.hash_image(&img))
    }
}

/// Files in `dir` whose stem is a frame ordinal, sorted numerically.
/// `10` sorts after `9`, not after `1`.
fn numbered_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(u64, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let ordinal = e
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())?;
            Some((ordinal, e.into_path()))
        })
        .collect();
    files.sort_by_key(|(ordinal, _)| *ordinal);
    files.into_iter().map(|(_, path)| path).collect()
}

use std::fs;
use std::ops::{Range, RangeInclusive};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::dataset::dedupe::DuplicateFilter;
use crate::error::{Error, Result};
use crate::marks::tracker::{ClassId, MarkBoard};
use crate::media::ffmpeg::FRAME_EXT;

/// One marked class's share of the extracted frames: its span goes to the
/// `true` bucket, the gap since the previous marked class's span start goes
/// to the `false` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    pub class: ClassId,
    /// Inclusive marked span.
    pub positives: RangeInclusive<u64>,
    /// Half-open background interval; empty when the cursor already sits at
    /// or past this class's span start.
    pub negatives: Range<u64>,
}

/// Folds the board into per-class bucket assignments, threading the cursor
/// as an accumulator. Classes are visited in ascending id order; unmarked
/// classes are skipped without advancing the cursor. The cursor moves to the
/// span *start*, not its end: frames inside a span stay out of the class's
/// own false bucket only because they are in its true bucket.
pub fn bucket_plan(board: &MarkBoard) -> Vec<BucketPlan> {
    let mut plans = Vec::new();
    let mut start = 1u64;
    for (class, range) in board.classes() {
        let Some((lo, hi)) = range.bounds() else {
            continue;
        };
        plans.push(BucketPlan {
            class,
            positives: lo..=hi,
            negatives: start..lo,
        });
        start = lo;
    }
    plans
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PartitionSummary {
    /// Classes that produced a bucket pair.
    pub classes: usize,
    pub positives: u64,
    pub negatives: u64,
    /// Files the duplicate filter deleted out of the false buckets.
    pub deduped: u64,
}

/// Distributes extracted frames into per-class `true`/`false` buckets under
/// `output_root`, running the duplicate filter on each false bucket before
/// the next class is processed. Bucket directories are rebuilt from scratch;
/// frames are copied, never moved, so a rerun against the same extracted
/// frames reproduces identical true buckets.
pub fn partition(
    frames_dir: &Path,
    board: &MarkBoard,
    output_root: &Path,
    filter: &DuplicateFilter,
) -> Result<PartitionSummary> {
    let mut summary = PartitionSummary::default();

    for plan in bucket_plan(board) {
        let class_dir = output_root.join(plan.class.to_string());
        let true_dir = class_dir.join("true");
        let false_dir = class_dir.join("false");
        reset_dir(&true_dir)?;
        reset_dir(&false_dir)?;

        for ordinal in plan.positives.clone() {
            copy_frame(frames_dir, ordinal, &true_dir, plan.class)?;
            summary.positives += 1;
        }
        for ordinal in plan.negatives.clone() {
            copy_frame(frames_dir, ordinal, &false_dir, plan.class)?;
            summary.negatives += 1;
        }

        let removed = filter.filter_bucket(&false_dir)?;
        summary.deduped += removed as u64;
        summary.classes += 1;

        info!(
            "class {}: {} true, {} false ({} dropped as near-duplicates)",
            plan.class,
            plan.positives.end() - plan.positives.start() + 1,
            plan.negatives.end.saturating_sub(plan.negatives.start),
            removed
        );
    }

    Ok(summary)
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn copy_frame(frames_dir: &Path, ordinal: u64, dest: &Path, class: ClassId) -> Result<()> {
    let name = format!("{ordinal}.{FRAME_EXT}");
    let src = frames_dir.join(&name);
    if !src.is_file() {
        return Err(Error::MissingFrame {
            class,
            ordinal,
            path: src,
        });
    }
    fs::copy(&src, dest.join(&name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn class(id: u8) -> ClassId {
        ClassId::new(id).unwrap()
    }

    /// class0 -> {10,11,12}, class2 -> {20}, everything else unmarked.
    fn example_board() -> MarkBoard {
        let mut board = MarkBoard::new();
        board.mark(class(0), 10);
        board.mark(class(0), 12);
        board.mark(class(2), 20);
        board
    }

    fn write_frames(dir: &Path, count: u64) {
        let img = image::RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 0])
        });
        img.save(dir.join("1.jpg")).unwrap();
        let bytes = fs::read(dir.join("1.jpg")).unwrap();
        for ordinal in 2..=count {
            fs::write(dir.join(format!("{ordinal}.jpg")), &bytes).unwrap();
        }
    }

    fn listing(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn names(ordinals: impl IntoIterator<Item = u64>) -> BTreeSet<String> {
        ordinals.into_iter().map(|n| format!("{n}.jpg")).collect()
    }

    #[test]
    fn plan_threads_the_cursor_through_marked_classes() {
        let plans = bucket_plan(&example_board());
        assert_eq!(
            plans,
            vec![
                BucketPlan {
                    class: class(0),
                    positives: 10..=12,
                    negatives: 1..10,
                },
                BucketPlan {
                    class: class(2),
                    positives: 20..=20,
                    negatives: 10..20,
                },
            ]
        );
    }

    #[test]
    fn plan_is_empty_for_an_unmarked_board() {
        assert!(bucket_plan(&MarkBoard::new()).is_empty());
    }

    #[test]
    fn cursor_can_move_backwards_leaving_an_empty_gap() {
        let mut board = MarkBoard::new();
        board.mark(class(0), 15);
        board.mark(class(1), 5);

        let plans = bucket_plan(&board);
        assert_eq!(plans[0].negatives, 1..15);
        // Class 1 starts before the cursor; its background interval is empty
        // and the cursor settles at its span start.
        assert_eq!(plans[1].negatives, 15..5);
        assert_eq!(plans[1].negatives.clone().count(), 0);
    }

    #[test]
    fn partitions_the_worked_example() {
        let frames = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_frames(frames.path(), 20);

        // Identical frames all land in one hash group; a large cap keeps
        // every file so the bucket contents stay inspectable.
        let filter = DuplicateFilter::with_cap(0, 1000);
        let summary =
            partition(frames.path(), &example_board(), out.path(), &filter).unwrap();

        assert_eq!(listing(&out.path().join("0/true")), names(10..=12));
        assert_eq!(listing(&out.path().join("0/false")), names(1..=9));
        assert_eq!(listing(&out.path().join("2/true")), names([20]));
        assert_eq!(listing(&out.path().join("2/false")), names(10..=19));
        assert!(!out.path().join("1").exists());

        assert_eq!(summary.classes, 2);
        assert_eq!(summary.positives, 4);
        assert_eq!(summary.negatives, 19);
        assert_eq!(summary.deduped, 0);
    }

    #[test]
    fn missing_frame_is_surfaced_with_context() {
        let frames = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_frames(frames.path(), 20);
        fs::remove_file(frames.path().join("11.jpg")).unwrap();

        let filter = DuplicateFilter::with_cap(0, 1000);
        let err = partition(frames.path(), &example_board(), out.path(), &filter)
            .unwrap_err();

        match err {
            Error::MissingFrame {
                class: c,
                ordinal,
                path,
            } => {
                assert_eq!(c, class(0));
                assert_eq!(ordinal, 11);
                assert_eq!(path, frames.path().join("11.jpg"));
            }
            other => panic!("expected MissingFrame, got {other:?}"),
        }
    }

    #[test]
    fn rerun_reproduces_identical_true_buckets() {
        let frames = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_frames(frames.path(), 20);

        let board = example_board();
        let filter = DuplicateFilter::with_cap(0, 1000);
        partition(frames.path(), &board, out.path(), &filter).unwrap();

        let before: Vec<(PathBuf, Vec<u8>)> = (10..=12)
            .map(|n| {
                let p = out.path().join(format!("0/true/{n}.jpg"));
                let bytes = fs::read(&p).unwrap();
                (p, bytes)
            })
            .collect();

        partition(frames.path(), &board, out.path(), &filter).unwrap();

        for (path, bytes) in before {
            assert_eq!(fs::read(&path).unwrap(), bytes);
        }
        assert_eq!(listing(&out.path().join("0/true")), names(10..=12));
    }
}

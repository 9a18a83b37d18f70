use std::fmt;

use crate::error::Error;

pub const CLASS_COUNT: usize = 16;

/// One of the 16 label classes a reviewer can mark, rendered externally as a
/// single hex digit (`0`-`F`). Bucket directories are named after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u8);

impl ClassId {
    pub fn new(id: u8) -> Result<Self, Error> {
        if usize::from(id) >= CLASS_COUNT {
            return Err(Error::InvalidClass(id));
        }
        Ok(Self(id))
    }

    /// All classes in ascending id order.
    pub fn all() -> impl Iterator<Item = ClassId> {
        (0..CLASS_COUNT as u8).map(ClassId)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Current edit state of one class's frame range: at most two anchor values
/// ever exist, and a span keeps `lo <= hi` by construction, so the derived
/// range is always a single contiguous run. There is no unmark; a class
/// never returns to `Empty` once touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkedRange {
    #[default]
    Empty,
    Point(u64),
    Span {
        lo: u64,
        hi: u64,
    },
}

impl MarkedRange {
    /// Apply one mark event at `frame` and return the successor state.
    ///
    /// With two anchors present, a mark below the low anchor moves the low
    /// anchor down; anything else replaces the high anchor, even when that
    /// shrinks the span.
    pub fn mark(self, frame: u64) -> Self {
        match self {
            MarkedRange::Empty => MarkedRange::Point(frame),
            MarkedRange::Point(a) => MarkedRange::Span {
                lo: a.min(frame),
                hi: a.max(frame),
            },
            MarkedRange::Span { lo, hi } => {
                if frame < lo {
                    MarkedRange::Span { lo: frame, hi }
                } else {
                    MarkedRange::Span { lo, hi: frame }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MarkedRange::Empty)
    }

    /// Inclusive `(lo, hi)` bounds of the derived range, `None` when unmarked.
    pub fn bounds(&self) -> Option<(u64, u64)> {
        match *self {
            MarkedRange::Empty => None,
            MarkedRange::Point(a) => Some((a, a)),
            MarkedRange::Span { lo, hi } => Some((lo, hi)),
        }
    }
}

impl fmt::Display for MarkedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MarkedRange::Empty => write!(f, "unmarked"),
            MarkedRange::Point(a) => write!(f, "{a}"),
            MarkedRange::Span { lo, hi } => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Mark state for all 16 classes, mutated only by mark events.
#[derive(Debug, Clone, Default)]
pub struct MarkBoard {
    ranges: [MarkedRange; CLASS_COUNT],
}

impl MarkBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, class: ClassId, frame: u64) {
        let slot = &mut self.ranges[class.index()];
        *slot = slot.mark(frame);
    }

    pub fn range(&self, class: ClassId) -> MarkedRange {
        self.ranges[class.index()]
    }

    /// All classes with their ranges, in ascending id order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, MarkedRange)> + '_ {
        ClassId::all().map(|c| (c, self.ranges[c.index()]))
    }

    /// Classes that have at least one mark, in ascending id order.
    pub fn marked(&self) -> impl Iterator<Item = (ClassId, MarkedRange)> + '_ {
        self.classes().filter(|(_, r)| !r.is_empty())
    }

    /// Highest frame ordinal any class needs, 0 when nothing is marked.
    /// Extraction never has to pull past this.
    pub fn last_frame_needed(&self) -> u64 {
        self.ranges
            .iter()
            .filter_map(|r| r.bounds().map(|(_, hi)| hi))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(MarkedRange::is_empty)
    }
}

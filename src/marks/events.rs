use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::marks::timeline::Timeline;
use crate::marks::tracker::{ClassId, MarkBoard};

/// One mark event from the review surface: a class and the playback position
/// at which the reviewer pressed it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkEvent {
    pub class: u8,
    pub position_ms: u64,
}

/// Reads a JSON array of mark events.
pub fn load_events(path: &Path) -> Result<Vec<MarkEvent>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Replays events in order through the position-to-frame mapping into a
/// fresh board. Event order matters: anchors are edited, not accumulated.
pub fn replay(events: &[MarkEvent], timeline: &Timeline) -> Result<MarkBoard> {
    let mut board = MarkBoard::new();
    for event in events {
        let class = ClassId::new(event.class)?;
        board.mark(class, timeline.frame_of(event.position_ms));
    }
    Ok(board)
}

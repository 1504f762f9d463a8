//! Presentation / audio collaborator seam.

use crate::lane::Lane;
use crate::note::NoteId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMark {
    Hit,
    Miss,
}

/// Everything the core asks of the shell. Notes are keyed by their [`NoteId`];
/// the shell keeps whatever visual handle it needs behind that id.
pub trait Display {
    fn render_note(&mut self, id: NoteId, lane: Lane, height: f64);
    fn set_note_position(&mut self, id: NoteId, y: f64);
    fn mark_note(&mut self, id: NoteId, mark: NoteMark);
    /// Remove the marker once `after_ms` has elapsed (cosmetic delay only).
    fn remove_note(&mut self, id: NoteId, after_ms: f64);
    fn play_cue(&mut self, lane: Lane);
    fn clear_lane(&mut self, lane: Lane);
    fn show_score(&mut self, score: i64);
    fn show_countdown(&mut self, seconds: u32);
    fn show_game_over(&mut self, final_score: i64);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DisplayEvent {
    Render { id: NoteId, lane: Lane, height: f64 },
    Position { id: NoteId, y: f64 },
    Mark { id: NoteId, mark: NoteMark },
    Remove { id: NoteId, after_ms: f64 },
    Cue(Lane),
    ClearLane(Lane),
    Score(i64),
    Countdown(u32),
    GameOver(i64),
}

/// Display that appends every call to an event log.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub events: Vec<DisplayEvent>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_score(&self) -> Option<i64> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Score(s) => Some(*s),
            _ => None,
        })
    }

    pub fn last_countdown(&self) -> Option<u32> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Countdown(s) => Some(*s),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&DisplayEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Display for RecordingDisplay {
    fn render_note(&mut self, id: NoteId, lane: Lane, height: f64) {
        self.events.push(DisplayEvent::Render { id, lane, height });
    }
    fn set_note_position(&mut self, id: NoteId, y: f64) {
        self.events.push(DisplayEvent::Position { id, y });
    }
    fn mark_note(&mut self, id: NoteId, mark: NoteMark) {
        self.events.push(DisplayEvent::Mark { id, mark });
    }
    fn remove_note(&mut self, id: NoteId, after_ms: f64) {
        self.events.push(DisplayEvent::Remove { id, after_ms });
    }
    fn play_cue(&mut self, lane: Lane) {
        self.events.push(DisplayEvent::Cue(lane));
    }
    fn clear_lane(&mut self, lane: Lane) {
        self.events.push(DisplayEvent::ClearLane(lane));
    }
    fn show_score(&mut self, score: i64) {
        self.events.push(DisplayEvent::Score(score));
    }
    fn show_countdown(&mut self, seconds: u32) {
        self.events.push(DisplayEvent::Countdown(seconds));
    }
    fn show_game_over(&mut self, final_score: i64) {
        self.events.push(DisplayEvent::GameOver(final_score));
    }
}

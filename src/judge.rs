//! Hit judgement for a single key press.

use crate::config::GameConfig;
use crate::lane::Lane;
use crate::note::{Note, NoteId, NoteRegistry};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Judgement {
    /// The closest note's body overlapped the hit line.
    Hit {
        id: NoteId,
        accuracy: f64,
        points: i64,
    },
    /// The closest note exists but does not overlap the hit line. It stays in play.
    OutOfRange { id: NoteId },
    /// No note in the lane at all.
    Empty,
}

impl Judgement {
    /// Score change for this outcome.
    pub fn score_delta(&self, miss_penalty: i64) -> i64 {
        match *self {
            Judgement::Hit { points, .. } => points,
            Judgement::OutOfRange { .. } | Judgement::Empty => -miss_penalty,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Scoring {
    pub base: i64,
    pub bonus: i64,
}

impl Scoring {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            base: cfg.hit_points_base,
            bonus: cfg.hit_points_bonus,
        }
    }

    pub fn points(&self, accuracy: f64) -> i64 {
        (self.base as f64 + accuracy * self.bonus as f64).round() as i64
    }
}

/// Note in `lane` whose top edge is nearest the hit line. Ties go to the
/// earliest-created note.
pub fn closest_in_lane(registry: &NoteRegistry, lane: Lane, hit_line: f64) -> Option<&Note> {
    registry.in_lane(lane).fold(None, |best: Option<&Note>, n| match best {
        Some(b) if (b.y - hit_line).abs() <= (n.y - hit_line).abs() => Some(b),
        _ => Some(n),
    })
}

/// 1.0 when the note's center sits on the hit line, falling linearly to 0.0
/// at half the note's height away.
pub fn accuracy(note: &Note, hit_line: f64) -> f64 {
    let half = note.height / 2.0;
    (1.0 - (note.center() - hit_line).abs() / half).max(0.0)
}

/// Edges are inclusive.
pub fn overlaps(note: &Note, hit_line: f64) -> bool {
    note.top() <= hit_line && hit_line <= note.bottom()
}

/// Judge a press in `lane`. Pure: the caller applies the outcome.
pub fn judge(registry: &NoteRegistry, lane: Lane, hit_line: f64, scoring: Scoring) -> Judgement {
    let Some(note) = closest_in_lane(registry, lane, hit_line) else {
        return Judgement::Empty;
    };
    if !overlaps(note, hit_line) {
        return Judgement::OutOfRange { id: note.id };
    }
    let accuracy = accuracy(note, hit_line);
    Judgement::Hit {
        id: note.id,
        accuracy,
        points: scoring.points(accuracy),
    }
}

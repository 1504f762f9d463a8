//! Falling notes and the registry that owns them.

use crate::lane::Lane;

/// Identity of a note. Ids come from a per-registry counter that survives
/// `clear()`, so a stale id from a previous session can never alias a live note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "note#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub lane: Lane,
    /// Pixels from the top of the play area to the note's top edge.
    pub y: f64,
    /// Fixed at spawn.
    pub height: f64,
    /// Timestamp (ms) of the last frame observed before the note was created.
    pub spawn_time: f64,
    /// False for every note in the registry: a hit takes the note out at once,
    /// so the miss sweep only ever sees unhit notes.
    pub hit_registered: bool,
}

impl Note {
    pub fn top(&self) -> f64 {
        self.y
    }
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
    pub fn center(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Active notes in creation order.
#[derive(Debug, Default)]
pub struct NoteRegistry {
    notes: Vec<Note>,
    next_id: u64,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a note at the top of `lane` and return its id.
    pub fn spawn(&mut self, lane: Lane, height: f64, spawn_time: f64) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.notes.push(Note {
            id,
            lane,
            y: 0.0,
            height,
            spawn_time,
            hit_registered: false,
        });
        id
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.notes.iter_mut()
    }

    pub fn in_lane(&self, lane: Lane) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.lane == lane)
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let idx = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(idx))
    }

    /// Remove every note matching `pred` and return them in creation order.
    /// Single pass; survivors keep their relative order.
    pub fn take_where(&mut self, mut pred: impl FnMut(&Note) -> bool) -> Vec<Note> {
        let (taken, kept): (Vec<Note>, Vec<Note>) =
            std::mem::take(&mut self.notes).into_iter().partition(|n| pred(n));
        self.notes = kept;
        taken
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

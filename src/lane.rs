//! The four playfield lanes and their key bindings.

/// One of the four vertical tracks. Each lane is bound to a single key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    S,
    D,
    J,
    K,
}

impl Lane {
    /// Left-to-right order; also the order used for uniform random lane picks.
    pub const ALL: [Lane; 4] = [Lane::S, Lane::D, Lane::J, Lane::K];

    /// Map a `KeyboardEvent.key` value to a lane. Case-insensitive; anything
    /// other than a single s/d/j/k character yields `None`.
    pub fn from_key(key: &str) -> Option<Lane> {
        let mut chars = key.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match c.to_ascii_uppercase() {
            'S' => Some(Lane::S),
            'D' => Some(Lane::D),
            'J' => Some(Lane::J),
            'K' => Some(Lane::K),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn symbol(self) -> char {
        match self {
            Lane::S => 'S',
            Lane::D => 'D',
            Lane::J => 'J',
            Lane::K => 'K',
        }
    }

    /// DOM id of the lane column (`col-s`, `col-d`, ...).
    pub fn column_id(self) -> &'static str {
        match self {
            Lane::S => "col-s",
            Lane::D => "col-d",
            Lane::J => "col-j",
            Lane::K => "col-k",
        }
    }

    /// Audio asset played on a successful hit in this lane.
    pub fn cue_asset(self) -> &'static str {
        match self {
            Lane::S => "sound-s.mp3",
            Lane::D => "sound-d.mp3",
            Lane::J => "sound-j.mp3",
            Lane::K => "sound-k.mp3",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

//! Per-frame fall and the miss sweep.

use crate::clock::FrameLimiter;
use crate::config::GameConfig;
use crate::note::{Note, NoteRegistry};

#[derive(Clone, Debug)]
pub struct MotionEngine {
    limiter: FrameLimiter,
    speed: f64,
}

/// Result of an applied motion update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionStep {
    /// Notes that fell past `hit_line + height` this update, already removed
    /// from the registry, in creation order.
    pub expired: Vec<Note>,
}

impl MotionStep {
    /// Expired notes that still owe the miss penalty.
    pub fn penalized(&self) -> impl Iterator<Item = &Note> {
        self.expired.iter().filter(|n| !n.hit_registered)
    }
}

impl MotionEngine {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            limiter: FrameLimiter::new(cfg.frame_interval_ms),
            speed: cfg.fall_speed_px,
        }
    }

    /// Advance every note by one step if the frame limiter allows it, then
    /// pull out the notes that are past the hit line. Returns `None` when this
    /// tick was rate-limited away.
    pub fn advance(
        &mut self,
        registry: &mut NoteRegistry,
        hit_line: f64,
        now: f64,
    ) -> Option<MotionStep> {
        if !self.limiter.try_advance(now) {
            return None;
        }
        for note in registry.iter_mut() {
            note.y += self.speed;
        }
        let expired = registry.take_where(|n| n.y > hit_line + n.height);
        Some(MotionStep { expired })
    }

    pub fn reset(&mut self) {
        self.limiter.reset();
    }
}

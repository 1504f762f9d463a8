//! Session controller: owns every piece of mutable game state and routes the
//! three inbound events (frame, spawn timer, key press) to the engines.
//!
//! Phases: `Idle` until the first `start()`, `Running` while the countdown has
//! time left, `Ended` once it runs out. `reset()` returns to `Running` from any
//! phase. Each (re)start takes a fresh generation from a process-wide counter;
//! callbacks stamped with any other [`Ticket`] are ignored, so nothing
//! scheduled by a previous game, or by a replaced session, can touch the
//! current one.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace};
use rand::rngs::SmallRng;

use crate::clock::{Scheduler, TaskHandle, Ticket};
use crate::config::GameConfig;
use crate::display::{Display, NoteMark};
use crate::judge::{self, Judgement, Scoring};
use crate::lane::Lane;
use crate::motion::MotionEngine;
use crate::note::NoteRegistry;
use crate::spawn::{SpawnOutcome, SpawnPolicy};

/// Next game generation. Zero is never issued; it marks a session that has
/// not started.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

/// Per-session outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: u32,
    /// Notes that fell past the hit line.
    pub misses: u32,
    /// Presses in a lane with no notes.
    pub stray_presses: u32,
    /// Presses whose closest note did not overlap the hit line.
    pub early_late_presses: u32,
    pub spawned: u32,
    pub spawn_skips: u32,
}

pub struct Session<D: Display, S: Scheduler> {
    config: GameConfig,
    display: D,
    scheduler: S,
    rng: SmallRng,
    registry: NoteRegistry,
    spawner: SpawnPolicy,
    motion: MotionEngine,
    scoring: Scoring,
    hit_line: f64,
    phase: Phase,
    score: i64,
    start_time: Option<f64>, // first frame timestamp of this game
    last_frame_at: f64,
    last_countdown: Option<u32>,
    generation: u64,
    pending_frame: Option<TaskHandle>,
    pending_spawn: Option<TaskHandle>,
    tally: Tally,
}

impl<D: Display, S: Scheduler> Session<D, S> {
    /// Build an idle session for a play area `play_height` pixels tall.
    pub fn new(config: GameConfig, play_height: f64, display: D, scheduler: S, rng: SmallRng) -> Self {
        Self {
            hit_line: config.hit_line_y(play_height),
            spawner: SpawnPolicy::new(&config),
            motion: MotionEngine::new(&config),
            scoring: Scoring::new(&config),
            config,
            display,
            scheduler,
            rng,
            registry: NoteRegistry::new(),
            phase: Phase::Idle,
            score: 0,
            start_time: None,
            last_frame_at: 0.0,
            last_countdown: None,
            generation: 0,
            pending_frame: None,
            pending_spawn: None,
            tally: Tally::default(),
        }
    }

    /// Idle -> Running. Ignored once a game has been started.
    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.begin();
        }
    }

    /// Zero everything and start a fresh game, whatever the current phase.
    pub fn reset(&mut self) {
        self.begin();
    }

    fn begin(&mut self) {
        self.cancel_pending();
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        self.registry.clear();
        for lane in Lane::ALL {
            self.display.clear_lane(lane);
        }
        self.score = 0;
        self.tally = Tally::default();
        self.start_time = None;
        self.last_frame_at = 0.0;
        self.last_countdown = None;
        self.motion.reset();
        self.phase = Phase::Running;
        info!(
            "game {} started ({} ms, hit line at {:.1}px)",
            self.generation, self.config.duration_ms, self.hit_line
        );

        self.display.show_score(self.score);
        self.update_countdown(self.countdown_seconds());

        let ticket = self.ticket();
        self.pending_frame = Some(self.scheduler.request_frame(ticket));
        self.schedule_next_spawn();
    }

    /// Cancel both callback chains and stop, leaving the display as is. Used
    /// when the shell discards this session.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        self.phase = Phase::Ended;
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.pending_spawn.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn schedule_next_spawn(&mut self) {
        let delay = self.spawner.roll_delay(&mut self.rng);
        let ticket = self.ticket();
        self.pending_spawn = Some(self.scheduler.schedule_spawn(delay, ticket));
    }

    fn end(&mut self) {
        self.phase = Phase::Ended;
        self.cancel_pending();
        self.display.show_game_over(self.score);
        info!(
            "game {} over: score {} (hits {}, misses {}, stray {}, early/late {})",
            self.generation,
            self.score,
            self.tally.hits,
            self.tally.misses,
            self.tally.stray_presses,
            self.tally.early_late_presses
        );
    }

    fn is_current(&self, ticket: Ticket, what: &str) -> bool {
        if ticket != self.ticket() {
            debug!(
                "ignoring stale {what} from game {} (current {})",
                ticket.0, self.generation
            );
            return false;
        }
        true
    }

    fn apply_score(&mut self, delta: i64) {
        self.score += delta;
        self.display.show_score(self.score);
    }

    fn update_countdown(&mut self, seconds: u32) {
        if self.last_countdown != Some(seconds) {
            self.last_countdown = Some(seconds);
            self.display.show_countdown(seconds);
        }
    }

    /// Frame callback. Runs the countdown, then motion and the miss sweep,
    /// then asks for the next frame.
    pub fn on_frame(&mut self, ticket: Ticket, now: f64) {
        if !self.is_current(ticket, "frame") {
            return;
        }
        self.pending_frame = None;
        if self.phase != Phase::Running {
            return;
        }
        self.last_frame_at = now;
        let start = *self.start_time.get_or_insert(now);
        let elapsed = now - start;
        let remaining = (self.config.duration_ms - elapsed).max(0.0);
        self.update_countdown((remaining / 1000.0).floor() as u32);
        if elapsed >= self.config.duration_ms {
            self.end();
            return;
        }

        if let Some(step) = self.motion.advance(&mut self.registry, self.hit_line, now) {
            for note in self.registry.iter() {
                self.display.set_note_position(note.id, note.y);
            }
            for note in step.penalized() {
                debug!("{} in lane {} missed", note.id, note.lane);
                self.tally.misses += 1;
                self.apply_score(-self.config.miss_penalty);
            }
            for note in &step.expired {
                self.display.set_note_position(note.id, note.y);
                self.display.mark_note(note.id, NoteMark::Miss);
                self.display
                    .remove_note(note.id, self.config.miss_removal_delay_ms);
            }
        }

        self.pending_frame = Some(self.scheduler.request_frame(ticket));
    }

    /// Spawn-timer callback. Makes one spawn attempt and re-arms the timer.
    pub fn on_spawn_timer(&mut self, ticket: Ticket) {
        if !self.is_current(ticket, "spawn timer") {
            return;
        }
        self.pending_spawn = None;
        if self.phase != Phase::Running {
            return;
        }
        match self
            .spawner
            .attempt(&mut self.registry, &mut self.rng, self.last_frame_at)
        {
            SpawnOutcome::Spawned { id, lane, height } => {
                self.tally.spawned += 1;
                self.display.render_note(id, lane, height);
                self.display.set_note_position(id, 0.0);
            }
            SpawnOutcome::Blocked { lane } => {
                trace!("spawn skipped: lane {lane} is crowded");
                self.tally.spawn_skips += 1;
            }
        }
        self.schedule_next_spawn();
    }

    /// Key callback. Unrecognised keys and presses outside a running game
    /// return `None` and change nothing; every other press changes the score
    /// exactly once.
    pub fn on_key_press(&mut self, key: &str, timestamp: f64) -> Option<Judgement> {
        let lane = Lane::from_key(key)?;
        if self.phase != Phase::Running {
            return None;
        }
        let judgement = judge::judge(&self.registry, lane, self.hit_line, self.scoring);
        debug!("press {lane} at {timestamp:.1}ms -> {judgement:?}");
        match judgement {
            Judgement::Hit { id, .. } => {
                self.registry.remove(id);
                self.tally.hits += 1;
                self.display.mark_note(id, NoteMark::Hit);
                self.display.play_cue(lane);
                self.display
                    .remove_note(id, self.config.hit_removal_delay_ms);
            }
            Judgement::OutOfRange { .. } => self.tally.early_late_presses += 1,
            Judgement::Empty => self.tally.stray_presses += 1,
        }
        self.apply_score(judgement.score_delta(self.config.miss_penalty));
        Some(judgement)
    }

    /// Whole seconds left on the clock, as shown to the player.
    pub fn countdown_seconds(&self) -> u32 {
        let elapsed = self.start_time.map_or(0.0, |s| self.last_frame_at - s);
        ((self.config.duration_ms - elapsed).max(0.0) / 1000.0).floor() as u32
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn hit_line(&self) -> f64 {
        self.hit_line
    }

    pub fn registry(&self) -> &NoteRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

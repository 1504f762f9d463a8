// Integration tests (native) for the `keyfall` crate.
// These drive a full session through the scheduler / display seams with a
// simulated clock, so they run under `cargo test` on the host.

use keyfall::clock::{ManualScheduler, Ticket};
use keyfall::display::{DisplayEvent, NoteMark, RecordingDisplay};
use keyfall::judge::Judgement;
use keyfall::{GameConfig, Lane, Phase, Session};
use rand::SeedableRng;
use rand::rngs::SmallRng;

type TestSession = Session<RecordingDisplay, ManualScheduler>;

const FRAME_MS: f64 = 20.0;

fn new_session(seed: u64) -> TestSession {
    Session::new(
        GameConfig::default(),
        600.0,
        RecordingDisplay::new(),
        ManualScheduler::new(),
        SmallRng::seed_from_u64(seed),
    )
}

/// Simulated browser: frames every `FRAME_MS`, spawn timers at their delay.
struct Clock {
    now: f64,
    spawn_due: Option<(f64, Ticket)>,
}

impl Clock {
    fn new() -> Self {
        Self {
            now: 0.0,
            spawn_due: None,
        }
    }

    /// Advance until `until` ms or until the session stops asking for frames.
    /// `check` runs after every delivered callback.
    fn run(&mut self, s: &mut TestSession, until: f64, mut check: impl FnMut(&TestSession)) {
        while self.now < until {
            self.now += FRAME_MS;
            loop {
                if self.spawn_due.is_none() {
                    if let Some(task) = s.scheduler_mut().take_spawn() {
                        self.spawn_due = Some((self.now - FRAME_MS + task.delay_ms, task.ticket));
                    }
                }
                match self.spawn_due {
                    Some((due, ticket)) if due <= self.now => {
                        self.spawn_due = None;
                        s.on_spawn_timer(ticket);
                        check(s);
                    }
                    _ => break,
                }
            }
            match s.scheduler_mut().take_frame() {
                Some(task) => {
                    s.on_frame(task.ticket, self.now);
                    check(s);
                }
                None => break,
            }
        }
    }
}

fn assert_spacing(s: &TestSession) {
    for lane in Lane::ALL {
        let crowded = s.registry().in_lane(lane).filter(|n| n.y < 100.0).count();
        assert!(crowded <= 1, "lane {lane} has {crowded} notes above the spacing line");
    }
}

#[test]
fn untouched_game_runs_out_the_clock() {
    let mut s = new_session(5);
    s.start();
    let mut clock = Clock::new();
    clock.run(&mut s, 40_000.0, assert_spacing);

    assert_eq!(s.phase(), Phase::Ended);
    assert!(!s.is_running());
    assert!(s.score() <= 0);
    assert_eq!(s.score(), -5 * s.tally().misses as i64);
    assert!(s.tally().misses > 0);
    assert_eq!(s.display().last_countdown(), Some(0));
    assert_eq!(s.countdown_seconds(), 0);
    assert!(s.display().events.contains(&DisplayEvent::GameOver(s.score())));
    // The loop stops asking for frames and spawn attempts.
    assert!(s.scheduler().pending_frames().is_empty());
    assert!(s.scheduler().pending_spawns().is_empty());
    // Game over happens on the first frame at or past 30s after the first frame.
    assert!(clock.now >= 30_000.0 + FRAME_MS && clock.now < 30_000.0 + 3.0 * FRAME_MS);
}

#[test]
fn no_state_changes_after_game_over() {
    let mut s = new_session(9);
    s.start();
    Clock::new().run(&mut s, 40_000.0, |_| {});
    let score = s.score();
    let events = s.display().events.len();
    assert_eq!(s.on_key_press("s", 40_000.0), None);
    s.on_frame(s.ticket(), 40_020.0);
    s.on_spawn_timer(s.ticket());
    assert_eq!(s.score(), score);
    assert_eq!(s.display().events.len(), events);
}

#[test]
fn spawned_notes_fall_three_pixels_per_applied_update() {
    let mut s = new_session(21);
    s.start();
    let mut clock = Clock::new();
    while s.registry().is_empty() {
        clock.run(&mut s, clock.now + FRAME_MS, |_| {});
    }
    // The spawn step also delivers a frame, so the note may already be one step down.
    let note = s.registry().iter().next().unwrap().clone();
    assert!(note.y <= 3.0);
    // Every 20ms frame is an applied update.
    clock.run(&mut s, clock.now + 10.0 * FRAME_MS, |_| {});
    let moved = s.registry().get(note.id).expect("still falling");
    assert_eq!(moved.y, note.y + 30.0);
}

#[test]
fn press_in_empty_lane_costs_exactly_five() {
    let mut s = new_session(1);
    s.start();
    assert_eq!(s.on_key_press("K", 0.0), Some(Judgement::Empty));
    assert_eq!(s.score(), -5);
    assert_eq!(
        s.display()
            .count(|e| matches!(e, DisplayEvent::Remove { .. })),
        0
    );
}

#[test]
fn every_recognised_press_changes_the_score_once() {
    let mut s = new_session(77);
    s.start();
    let mut clock = Clock::new();
    clock.run(&mut s, 4_000.0, |_| {});
    for key in ["s", "D", "j", "K"] {
        let before = s.score();
        let scores_before = s.display().count(|e| matches!(e, DisplayEvent::Score(_)));
        let judgement = s.on_key_press(key, clock.now).expect("recognised key");
        let scores_after = s.display().count(|e| matches!(e, DisplayEvent::Score(_)));
        assert_eq!(scores_after, scores_before + 1);
        assert_eq!(s.score() - before, judgement.score_delta(5));
        if let Judgement::Hit { id, .. } = judgement {
            assert!(s.display().events.contains(&DisplayEvent::Mark {
                id,
                mark: NoteMark::Hit
            }));
        }
    }
}

#[test]
fn reset_mid_game_isolates_the_new_session() {
    let mut s = new_session(13);
    s.start();
    let mut clock = Clock::new();
    clock.run(&mut s, 6_000.0, assert_spacing);
    assert!(s.score() < 0, "some notes should have been missed by now");
    assert!(!s.registry().is_empty());

    let old_ticket = s.ticket();
    let old_frame = s.scheduler().pending_frames()[0];
    s.display_mut().clear();
    s.reset();

    assert_eq!(s.phase(), Phase::Running);
    assert_eq!(s.score(), 0);
    assert!(s.registry().is_empty());
    assert_eq!(s.display().last_countdown(), Some(30));
    assert_eq!(s.display().last_score(), Some(0));
    for lane in Lane::ALL {
        assert!(s.display().events.contains(&DisplayEvent::ClearLane(lane)));
    }
    assert!(s.scheduler().cancelled.contains(&old_frame.handle));
    assert_ne!(s.ticket(), old_ticket);

    // Callbacks from the old game that slip through cancellation are no-ops.
    s.on_spawn_timer(old_ticket);
    s.on_frame(old_ticket, 6_020.0);
    assert!(s.registry().is_empty());
    assert_eq!(s.score(), 0);

    // Only one frame and one spawn timer are live, both for the new game.
    assert_eq!(s.scheduler().pending_frames().len(), 1);
    assert_eq!(s.scheduler().pending_spawns().len(), 1);
    assert_eq!(s.scheduler().pending_spawns()[0].ticket, s.ticket());

    // The new game's countdown starts from its own first frame.
    let mut clock = Clock {
        now: clock.now,
        spawn_due: None,
    };
    clock.run(&mut s, clock.now + 1_000.0, assert_spacing);
    assert_eq!(s.countdown_seconds(), 29);
    assert_eq!(s.score(), 0);
}

#[test]
fn reset_after_game_over_starts_again() {
    let mut s = new_session(3);
    s.start();
    let mut clock = Clock::new();
    clock.run(&mut s, 40_000.0, |_| {});
    assert_eq!(s.phase(), Phase::Ended);
    s.reset();
    assert!(s.is_running());
    assert_eq!(s.tally(), Default::default());
    assert_eq!(s.scheduler().pending_frames().len(), 1);
}

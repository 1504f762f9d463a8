//! Frame pacing and the scheduler seam.
//!
//! The game runs two independent callback chains: a display-synchronised frame
//! chain and a chain of one-shot spawn timers. Both are requested through the
//! [`Scheduler`] trait so the browser shell and the deterministic test double
//! can be swapped freely. Every request carries a [`Ticket`] naming the session
//! generation that issued it; a callback whose ticket no longer matches is stale.

/// Caps applied motion updates to roughly one per `interval_ms`.
#[derive(Clone, Debug)]
pub struct FrameLimiter {
    interval_ms: f64,
    last_applied_ms: f64, // timestamp of last applied update, 0 before the first
}

impl FrameLimiter {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_applied_ms: 0.0,
        }
    }

    /// Returns true (and records `now`) when enough time has passed since the
    /// last applied update.
    pub fn try_advance(&mut self, now: f64) -> bool {
        if now - self.last_applied_ms >= self.interval_ms {
            self.last_applied_ms = now;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_applied_ms = 0.0;
    }
}

/// Session generation stamp attached to every scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Frame,
    SpawnTimer,
}

/// Cancelable reference to one outstanding callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub kind: TaskKind,
    pub id: i32,
}

pub trait Scheduler {
    /// Ask for one frame callback; the shell must deliver it to
    /// `Session::on_frame` together with `ticket`.
    fn request_frame(&mut self, ticket: Ticket) -> TaskHandle;
    /// Ask for one timer callback after `delay_ms`; delivered to
    /// `Session::on_spawn_timer`.
    fn schedule_spawn(&mut self, delay_ms: f64, ticket: Ticket) -> TaskHandle;
    /// Cancel an outstanding callback. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TaskHandle);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingTask {
    pub handle: TaskHandle,
    pub ticket: Ticket,
    /// Zero for frame requests.
    pub delay_ms: f64,
}

/// Scheduler that only records requests; tests decide when callbacks fire.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: i32,
    frames: Vec<PendingTask>,
    spawns: Vec<PendingTask>,
    pub cancelled: Vec<TaskHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, kind: TaskKind) -> TaskHandle {
        self.next_id += 1;
        TaskHandle {
            kind,
            id: self.next_id,
        }
    }

    /// Pop the oldest outstanding frame request, as if the browser fired it.
    pub fn take_frame(&mut self) -> Option<PendingTask> {
        (!self.frames.is_empty()).then(|| self.frames.remove(0))
    }

    /// Pop the oldest outstanding spawn timer, as if it elapsed.
    pub fn take_spawn(&mut self) -> Option<PendingTask> {
        (!self.spawns.is_empty()).then(|| self.spawns.remove(0))
    }

    pub fn pending_frames(&self) -> &[PendingTask] {
        &self.frames
    }

    pub fn pending_spawns(&self) -> &[PendingTask] {
        &self.spawns
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self, ticket: Ticket) -> TaskHandle {
        let handle = self.issue(TaskKind::Frame);
        self.frames.push(PendingTask {
            handle,
            ticket,
            delay_ms: 0.0,
        });
        handle
    }

    fn schedule_spawn(&mut self, delay_ms: f64, ticket: Ticket) -> TaskHandle {
        let handle = self.issue(TaskKind::SpawnTimer);
        self.spawns.push(PendingTask {
            handle,
            ticket,
            delay_ms,
        });
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.frames.retain(|t| t.handle != handle);
        self.spawns.retain(|t| t.handle != handle);
        self.cancelled.push(handle);
    }
}

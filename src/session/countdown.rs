use std::time::{Duration, Instant};

use crate::session::attempt::AttemptState;

/// Remaining time at or below this is rendered as urgent.
pub const URGENT_THRESHOLD_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Less than a whole second elapsed, or the clock is stopped.
    Idle,
    Updated { seconds_remaining: u64, urgent: bool },
    /// The clock just reached zero. Reported exactly once.
    Expired,
}

/// Wall-clock countdown over the attempt's `seconds_remaining`. Event-queue
/// ticks arrive faster than once a second; elapsed time between ticks is
/// converted into whole-second decrements, so a stalled loop catches up
/// without the remaining value ever increasing.
pub struct Countdown {
    phase: Phase,
    last_mark: Option<Instant>,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            phase: Phase::Running,
            last_mark: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Idempotent. Also called when a user submission wins the race against
    /// expiry, so no stray tick fires after finalization.
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    pub fn tick(&mut self, attempt: &mut AttemptState, now: Instant) -> TickOutcome {
        if self.phase == Phase::Stopped {
            return TickOutcome::Idle;
        }
        let mark = self.last_mark.get_or_insert(now);
        let elapsed = now.saturating_duration_since(*mark).as_secs();
        if elapsed == 0 {
            return TickOutcome::Idle;
        }
        *mark += Duration::from_secs(elapsed);

        let decrement = elapsed.min(attempt.seconds_remaining);
        attempt.seconds_remaining -= decrement;

        if attempt.seconds_remaining == 0 {
            self.phase = Phase::Stopped;
            return TickOutcome::Expired;
        }
        TickOutcome::Updated {
            seconds_remaining: attempt.seconds_remaining,
            urgent: attempt.seconds_remaining <= URGENT_THRESHOLD_SECS,
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

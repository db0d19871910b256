use std::time::Instant;

/// Per-question stopwatch. Holds the entry timestamp for whichever question is
/// current; the accumulated ledger lives on the attempt so repeat visits add
/// up rather than overwrite.
///
/// All timestamps are passed in so the controllers (and tests) decide what
/// "now" means.
pub struct TimeTracker {
    entered_at: Option<Instant>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self { entered_at: None }
    }

    pub fn enter(&mut self, now: Instant) {
        self.entered_at = Some(now);
    }

    /// Whole seconds since the last `enter`, rounded to nearest, and the entry
    /// is cleared. Returns 0 when nothing was entered.
    pub fn leave(&mut self, now: Instant) -> u64 {
        let Some(start) = self.entered_at.take() else {
            return 0;
        };
        now.saturating_duration_since(start).as_secs_f64().round() as u64
    }
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

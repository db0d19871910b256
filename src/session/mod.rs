pub mod attempt;
pub mod countdown;
pub mod navigation;
pub mod question;
pub mod status;
pub mod submission;
pub mod timing;

use std::collections::HashMap;
use std::time::Instant;

pub use attempt::AttemptState;
pub use countdown::{Countdown, TickOutcome, format_mmss};
pub use question::{ChoiceKey, Question, QuestionId};
pub use status::QuestionStatus;
pub use submission::FallbackSummary;
use timing::TimeTracker;

/// Update requests the session emits for the view layer, drained once per
/// frame. Three classes: a navigation rebuild, a single palette-button patch,
/// and a selection-visual patch. The view must apply selection and
/// single-button patches without rebuilding the question area: answering is
/// the highest-frequency event and must not disturb scroll position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewPatch {
    Navigation {
        previous_index: usize,
        current_index: usize,
    },
    PaletteButton {
        index: usize,
        status: QuestionStatus,
        is_current: bool,
    },
    Selection {
        choice: Option<ChoiceKey>,
    },
    Timer {
        seconds_remaining: u64,
        urgent: bool,
    },
}

/// Persistence seam. Implementations must return immediately; outcomes come
/// back through the event queue, or nowhere at all for the best-effort answer
/// stream. The final submit payload is the authoritative record; a lost
/// interim sync is never retried.
pub trait AttemptSync {
    fn sync_answer(&self, attempt_id: i64, question_id: QuestionId, key: ChoiceKey);
    fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: &HashMap<QuestionId, ChoiceKey>,
        time_spent: &HashMap<QuestionId, u64>,
    );
}

/// The running exam: attempt state plus the countdown, the per-question
/// stopwatch, the submission latch, and the queue of pending view patches.
pub struct ExamSession {
    pub attempt: AttemptState,
    pub(crate) countdown: Countdown,
    pub(crate) tracker: TimeTracker,
    pub(crate) submitting: bool,
    pub(crate) expired: bool,
    pub(crate) patches: Vec<ViewPatch>,
    pub(crate) fallback: Option<FallbackSummary>,
}

impl ExamSession {
    pub fn new(
        questions: Vec<Question>,
        attempt_id: Option<i64>,
        duration_minutes: u64,
        now: Instant,
    ) -> Self {
        Self::with_duration_secs(questions, attempt_id, duration_minutes * 60, now)
    }

    pub fn with_duration_secs(
        questions: Vec<Question>,
        attempt_id: Option<i64>,
        seconds: u64,
        now: Instant,
    ) -> Self {
        let attempt = AttemptState::new(questions, attempt_id, seconds);
        let mut tracker = TimeTracker::new();
        tracker.enter(now);
        Self {
            attempt,
            countdown: Countdown::new(),
            tracker,
            submitting: false,
            expired: false,
            patches: Vec::new(),
            fallback: None,
        }
    }

    pub fn take_patches(&mut self) -> Vec<ViewPatch> {
        std::mem::take(&mut self.patches)
    }

    /// True once the finalize sequence has started (latch set).
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// True when the countdown, not the user, triggered the finalize.
    pub fn clock_expired(&self) -> bool {
        self.expired
    }

    /// Set only in fallback (untracked) mode, at finalize time.
    pub fn fallback_summary(&self) -> Option<FallbackSummary> {
        self.fallback
    }

    /// Drive the countdown from an event-queue tick. On expiry the session
    /// finalizes itself; the return value tells the shell the clock fired.
    pub fn tick(&mut self, now: Instant, sync: &dyn AttemptSync) -> bool {
        match self.countdown.tick(&mut self.attempt, now) {
            TickOutcome::Idle => false,
            TickOutcome::Updated {
                seconds_remaining,
                urgent,
            } => {
                self.patches.push(ViewPatch::Timer {
                    seconds_remaining,
                    urgent,
                });
                false
            }
            TickOutcome::Expired => {
                self.patches.push(ViewPatch::Timer {
                    seconds_remaining: 0,
                    urgent: true,
                });
                self.expired = true;
                self.submit(None, now, sync);
                true
            }
        }
    }

    pub(crate) fn push_palette_patch(&mut self, index: usize) {
        let Some(status) = self.attempt.status_at(index) else {
            return;
        };
        self.patches.push(ViewPatch::PaletteButton {
            index,
            status,
            is_current: index == self.attempt.current_index(),
        });
    }
}

use std::time::Instant;

use crate::session::question::ChoiceKey;
use crate::session::{AttemptSync, ExamSession};

/// Local result shown when the attempt ran untracked (the start handshake
/// failed, or the session was offline from the start).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackSummary {
    pub total: usize,
    pub attempted: usize,
    pub unanswered: usize,
}

impl ExamSession {
    /// Finalize the attempt. Idempotent: the latch flips before anything else
    /// happens, in particular before any worker thread is spawned, so a
    /// countdown expiry and a user submit racing through the event queue
    /// produce at most one finalize call. The second invocation returns
    /// without touching anything.
    ///
    /// `view_choice` is the view layer's currently displayed selection, folded
    /// into the payload when the state has no answer for the current question.
    /// No interim sync is issued for it; the finalize payload carries it.
    pub fn submit(&mut self, view_choice: Option<ChoiceKey>, now: Instant, sync: &dyn AttemptSync) {
        if self.submitting {
            return;
        }
        self.submitting = true;
        self.countdown.stop();

        self.bank_current_time(now);

        let id = self.attempt.current_question_id();
        if self.attempt.answer_of(id).is_none() {
            if let Some(key) = view_choice {
                self.attempt.set_answer(id, key);
                self.attempt.visit(id);
            }
        }

        self.attempt.submitted = true;

        match self.attempt.attempt_id {
            Some(attempt_id) => {
                sync.submit_attempt(attempt_id, self.attempt.answers(), self.attempt.time_ledger());
            }
            None => {
                let total = self.attempt.question_count();
                let attempted = self.attempt.answered_count();
                self.fallback = Some(FallbackSummary {
                    total,
                    attempted,
                    unanswered: total - attempted,
                });
            }
        }
    }
}

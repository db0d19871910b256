use std::time::Instant;

use crate::session::question::{ChoiceKey, QuestionId};
use crate::session::{AttemptSync, ExamSession, ViewPatch};

impl ExamSession {
    /// Move the current-question pointer. Out-of-range targets and the
    /// already-current index are silent no-ops: no time accounting runs and
    /// no patch is emitted. Otherwise the departing question's visit duration
    /// is banked, the target becomes visited, and the view gets a navigation
    /// rebuild plus palette patches for both affected buttons.
    pub fn go_to(&mut self, index: usize, now: Instant) {
        if self.attempt.submitted || index >= self.attempt.question_count() {
            return;
        }
        let previous = self.attempt.current_index;
        if index == previous {
            return;
        }

        self.bank_current_time(now);
        self.attempt.current_index = index;
        if let Some(id) = self.attempt.question_id_at(index) {
            self.attempt.visit(id);
        }
        self.tracker.enter(now);

        self.patches.push(ViewPatch::Navigation {
            previous_index: previous,
            current_index: index,
        });
        self.push_palette_patch(previous);
        self.push_palette_patch(index);
    }

    pub fn previous(&mut self, now: Instant) {
        let current = self.attempt.current_index;
        if current > 0 {
            self.go_to(current - 1, now);
        }
    }

    /// Advance to the next question, first committing a selection the view
    /// layer shows but the state never received. The reconciliation only
    /// fires when the question has no recorded answer; a committed answer is
    /// never overwritten here.
    pub fn save_and_next(
        &mut self,
        view_choice: Option<ChoiceKey>,
        now: Instant,
        sync: &dyn AttemptSync,
    ) {
        if self.attempt.submitted {
            return;
        }
        let id = self.attempt.current_question_id();
        if self.attempt.answer_of(id).is_none() {
            if let Some(key) = view_choice {
                self.commit_choice(id, key, sync);
            }
        }
        let next = self.attempt.current_index + 1;
        if next < self.attempt.question_count() {
            self.go_to(next, now);
        }
    }

    /// Flag the current question for review and advance. The status change is
    /// patched before the navigation so the palette button updates even when
    /// this is the last question and no move follows.
    pub fn mark_for_review(&mut self, now: Instant) {
        if self.attempt.submitted {
            return;
        }
        let id = self.attempt.current_question_id();
        self.attempt.mark(id);
        self.attempt.visit(id);
        self.push_palette_patch(self.attempt.current_index);

        let next = self.attempt.current_index + 1;
        if next < self.attempt.question_count() {
            self.go_to(next, now);
        }
    }

    /// Drop the current question's answer. Local state only: the server keeps
    /// any interim sync it already received, and the final submit payload is
    /// what counts. The mark, if any, survives.
    pub fn clear_response(&mut self) {
        if self.attempt.submitted {
            return;
        }
        let id = self.attempt.current_question_id();
        if self.attempt.clear_answer(id).is_some() {
            self.patches.push(ViewPatch::Selection { choice: None });
            self.push_palette_patch(self.attempt.current_index);
        }
    }

    /// Record an answer. The highest-frequency operation: it emits only the
    /// selection patch and one palette button, never a navigation rebuild.
    pub fn select_choice(&mut self, question_id: QuestionId, key: ChoiceKey, sync: &dyn AttemptSync) {
        if self.attempt.submitted {
            return;
        }
        self.commit_choice(question_id, key, sync);
    }

    pub(crate) fn commit_choice(
        &mut self,
        question_id: QuestionId,
        key: ChoiceKey,
        sync: &dyn AttemptSync,
    ) {
        self.attempt.set_answer(question_id, key);
        self.attempt.visit(question_id);
        if let Some(attempt_id) = self.attempt.attempt_id {
            sync.sync_answer(attempt_id, question_id, key);
        }
        self.patches.push(ViewPatch::Selection { choice: Some(key) });
        if let Some(index) = self.attempt.index_of(question_id) {
            self.push_palette_patch(index);
        }
    }

    pub(crate) fn bank_current_time(&mut self, now: Instant) {
        let id = self.attempt.current_question_id();
        let seconds = self.tracker.leave(now);
        self.attempt.add_time(id, seconds);
    }
}

use std::collections::{HashMap, HashSet};

use crate::session::question::{ChoiceKey, Question, QuestionId};
use crate::session::status::QuestionStatus;

/// Mutable state of one test attempt: the answer map, visit and mark sets,
/// per-question time ledger, the countdown value, and the attempt identity.
/// `attempt_id` is absent when the start handshake failed and the session runs
/// untracked. Once `submitted` flips the state is frozen; every mutating
/// entry point in the session checks it.
pub struct AttemptState {
    questions: Vec<Question>,
    pub(crate) current_index: usize,
    answers: HashMap<QuestionId, ChoiceKey>,
    visited: HashSet<QuestionId>,
    marked: HashSet<QuestionId>,
    time_spent: HashMap<QuestionId, u64>,
    pub attempt_id: Option<i64>,
    pub(crate) seconds_remaining: u64,
    pub(crate) submitted: bool,
}

impl AttemptState {
    /// `questions` must be non-empty; an empty paper never reaches the
    /// session (the loader treats it as "no questions available").
    pub fn new(questions: Vec<Question>, attempt_id: Option<i64>, seconds_remaining: u64) -> Self {
        debug_assert!(!questions.is_empty());
        let mut visited = HashSet::new();
        if let Some(first) = questions.first() {
            // The first question is on screen from the start.
            visited.insert(first.id);
        }
        Self {
            questions,
            current_index: 0,
            answers: HashMap::new(),
            visited,
            marked: HashSet::new(),
            time_spent: HashMap::new(),
            attempt_id,
            seconds_remaining,
            submitted: false,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_question_id(&self) -> QuestionId {
        self.current_question().id
    }

    pub fn question_id_at(&self, index: usize) -> Option<QuestionId> {
        self.questions.get(index).map(|q| q.id)
    }

    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn answer_of(&self, id: QuestionId) -> Option<ChoiceKey> {
        self.answers.get(&id).copied()
    }

    pub fn is_marked(&self, id: QuestionId) -> bool {
        self.marked.contains(&id)
    }

    pub fn is_visited(&self, id: QuestionId) -> bool {
        self.visited.contains(&id)
    }

    pub fn time_spent_on(&self, id: QuestionId) -> u64 {
        self.time_spent.get(&id).copied().unwrap_or(0)
    }

    pub fn answers(&self) -> &HashMap<QuestionId, ChoiceKey> {
        &self.answers
    }

    pub fn time_ledger(&self) -> &HashMap<QuestionId, u64> {
        &self.time_spent
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Derived on every call, never stored: the flags change out from under
    /// any cached value between renders.
    pub fn status_of(&self, id: QuestionId) -> QuestionStatus {
        QuestionStatus::resolve(
            self.answers.contains_key(&id),
            self.marked.contains(&id),
            self.visited.contains(&id),
        )
    }

    pub fn status_at(&self, index: usize) -> Option<QuestionStatus> {
        self.question_id_at(index).map(|id| self.status_of(id))
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn unanswered_count(&self) -> usize {
        self.question_count() - self.answered_count()
    }

    /// Last write wins; no history is kept.
    pub(crate) fn set_answer(&mut self, id: QuestionId, key: ChoiceKey) {
        self.answers.insert(id, key);
    }

    pub(crate) fn clear_answer(&mut self, id: QuestionId) -> Option<ChoiceKey> {
        self.answers.remove(&id)
    }

    pub(crate) fn mark(&mut self, id: QuestionId) {
        self.marked.insert(id);
    }

    pub(crate) fn visit(&mut self, id: QuestionId) {
        self.visited.insert(id);
    }

    /// Additive: a second visit accumulates on top of the first.
    pub(crate) fn add_time(&mut self, id: QuestionId, seconds: u64) {
        if seconds == 0 {
            return;
        }
        let entry = self.time_spent.entry(id).or_insert(0);
        *entry = entry.saturating_add(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::question::Question;

    fn paper(count: usize) -> Vec<Question> {
        (1..=count as i64)
            .map(|id| Question {
                id,
                question: format!("Question {id}"),
                option_a: Some("one".to_string()),
                option_b: Some("two".to_string()),
                option_c: Some("three".to_string()),
                option_d: Some("four".to_string()),
                option_a_image: None,
                option_b_image: None,
                option_c_image: None,
                option_d_image: None,
                has_diagram: 0,
                image_path: None,
                question_image: None,
            })
            .collect()
    }

    #[test]
    fn test_first_question_pre_seeded_as_visited() {
        let state = AttemptState::new(paper(3), None, 600);
        assert!(state.is_visited(1));
        assert!(!state.is_visited(2));
        assert_eq!(state.status_of(1), QuestionStatus::Visited);
        assert_eq!(state.status_of(2), QuestionStatus::NotVisited);
    }

    #[test]
    fn test_answer_overwrite_keeps_last_write() {
        let mut state = AttemptState::new(paper(2), None, 600);
        state.set_answer(1, ChoiceKey::A);
        state.set_answer(1, ChoiceKey::C);
        assert_eq!(state.answer_of(1), Some(ChoiceKey::C));
        assert_eq!(state.answered_count(), 1);
    }

    #[test]
    fn test_clear_answered_and_marked_becomes_marked() {
        let mut state = AttemptState::new(paper(2), None, 600);
        state.visit(2);
        state.set_answer(2, ChoiceKey::B);
        state.mark(2);
        assert_eq!(state.status_of(2), QuestionStatus::AnsweredMarked);

        assert_eq!(state.clear_answer(2), Some(ChoiceKey::B));
        assert_eq!(state.status_of(2), QuestionStatus::Marked);
    }

    #[test]
    fn test_clear_answered_only_becomes_visited() {
        let mut state = AttemptState::new(paper(2), None, 600);
        state.visit(2);
        state.set_answer(2, ChoiceKey::D);
        assert_eq!(state.status_of(2), QuestionStatus::Answered);

        state.clear_answer(2);
        assert_eq!(state.status_of(2), QuestionStatus::Visited);
    }

    #[test]
    fn test_add_time_accumulates_across_visits() {
        let mut state = AttemptState::new(paper(1), None, 600);
        state.add_time(1, 10);
        state.add_time(1, 5);
        assert_eq!(state.time_spent_on(1), 15);
    }

    #[test]
    fn test_unanswered_count_tracks_answers() {
        let mut state = AttemptState::new(paper(5), None, 600);
        assert_eq!(state.unanswered_count(), 5);
        state.set_answer(1, ChoiceKey::A);
        state.set_answer(4, ChoiceKey::B);
        assert_eq!(state.answered_count(), 2);
        assert_eq!(state.unanswered_count(), 3);
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use testarena::session::question::{ChoiceKey, Question, QuestionId};
use testarena::session::{AttemptSync, ExamSession, QuestionStatus, ViewPatch, format_mmss};

/// Records every persistence call instead of touching the network, so the
/// tests can assert on exactly what would have been sent.
#[derive(Default)]
struct RecordingSync {
    answers: Mutex<Vec<(i64, QuestionId, ChoiceKey)>>,
    submits: Mutex<Vec<(i64, HashMap<QuestionId, ChoiceKey>, HashMap<QuestionId, u64>)>>,
}

impl RecordingSync {
    fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn submit_count(&self) -> usize {
        self.submits.lock().unwrap().len()
    }

    fn last_submit(&self) -> (i64, HashMap<QuestionId, ChoiceKey>, HashMap<QuestionId, u64>) {
        self.submits.lock().unwrap().last().cloned().unwrap()
    }
}

impl AttemptSync for RecordingSync {
    fn sync_answer(&self, attempt_id: i64, question_id: QuestionId, key: ChoiceKey) {
        self.answers.lock().unwrap().push((attempt_id, question_id, key));
    }

    fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: &HashMap<QuestionId, ChoiceKey>,
        time_spent: &HashMap<QuestionId, u64>,
    ) {
        self.submits
            .lock()
            .unwrap()
            .push((attempt_id, answers.clone(), time_spent.clone()));
    }
}

fn paper(count: usize) -> Vec<Question> {
    (1..=count as i64)
        .map(|id| Question {
            id,
            question: format!("Question {id}"),
            option_a: Some("first".to_string()),
            option_b: Some("second".to_string()),
            option_c: Some("third".to_string()),
            option_d: Some("fourth".to_string()),
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

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn cleared_answer_and_mark_survive_expiry() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    // Clock already at zero: the next whole-second tick expires it.
    let mut exam = ExamSession::with_duration_secs(paper(5), None, 0, t0);

    // Answer b on question 1, move on.
    exam.select_choice(1, ChoiceKey::B, &sync);
    exam.save_and_next(None, t0 + secs(5), &sync);
    assert_eq!(exam.attempt.current_index(), 1);

    // Mark question 2 for review; it auto-advances to question 3.
    exam.mark_for_review(t0 + secs(8));
    assert_eq!(exam.attempt.current_index(), 2);

    // Back to question 1 and clear the answer.
    exam.go_to(0, t0 + secs(12));
    exam.clear_response();

    // Let the countdown expire.
    exam.tick(t0 + secs(13), &sync);
    let expired = exam.tick(t0 + secs(14), &sync);
    assert!(expired);
    assert!(exam.clock_expired());

    assert!(exam.attempt.is_submitted());
    assert!(exam.attempt.answers().is_empty());
    assert!(exam.attempt.is_marked(2));
    assert_eq!(exam.attempt.status_of(2), QuestionStatus::Marked);

    let summary = exam.fallback_summary().unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.unanswered, 5);

    // Fallback mode never reaches the network.
    assert_eq!(sync.submit_count(), 0);
    assert_eq!(sync.answer_count(), 0);
}

#[test]
fn double_submit_finalizes_once() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(7), 600, t0);

    exam.select_choice(1, ChoiceKey::A, &sync);
    exam.submit(None, t0 + secs(10), &sync);
    exam.submit(None, t0 + secs(11), &sync);

    assert_eq!(sync.submit_count(), 1);
    assert!(exam.attempt.is_submitted());
}

#[test]
fn timer_expiry_racing_user_submit_finalizes_once() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(9), 1, t0);

    exam.tick(t0, &sync);
    let expired = exam.tick(t0 + secs(1), &sync);
    assert!(expired);

    // The user's submit click was already queued behind the expiry tick.
    exam.submit(None, t0 + secs(1), &sync);

    assert_eq!(sync.submit_count(), 1);
}

#[test]
fn one_second_countdown_reaches_zero_and_stops() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(1), None, 1, t0);

    exam.tick(t0, &sync);
    assert!(exam.tick(t0 + secs(1), &sync));

    assert_eq!(format_mmss(exam.attempt.seconds_remaining()), "00:00");
    assert!(exam.attempt.is_submitted());

    // Later ticks never push the clock below zero.
    exam.tick(t0 + secs(2), &sync);
    exam.tick(t0 + secs(30), &sync);
    assert_eq!(exam.attempt.seconds_remaining(), 0);
}

#[test]
fn missing_attempt_id_takes_fallback_path() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(4), None, 600, t0);

    exam.select_choice(1, ChoiceKey::D, &sync);
    exam.submit(None, t0 + secs(20), &sync);

    let summary = exam.fallback_summary().unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.unanswered, 3);

    assert_eq!(sync.submit_count(), 0);
    assert_eq!(sync.answer_count(), 0);
}

#[test]
fn selecting_a_choice_never_requests_navigation_render() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(5), 600, t0);
    exam.take_patches();

    exam.select_choice(1, ChoiceKey::C, &sync);

    let patches = exam.take_patches();
    assert!(
        !patches
            .iter()
            .any(|p| matches!(p, ViewPatch::Navigation { .. })),
        "answering must not rebuild the question area"
    );
    assert_eq!(
        patches
            .iter()
            .filter(|p| matches!(p, ViewPatch::Selection { .. }))
            .count(),
        1
    );
    assert_eq!(
        patches
            .iter()
            .filter(|p| matches!(p, ViewPatch::PaletteButton { .. }))
            .count(),
        1
    );
    assert_eq!(
        patches.iter().find(|p| matches!(p, ViewPatch::PaletteButton { .. })),
        Some(&ViewPatch::PaletteButton {
            index: 0,
            status: QuestionStatus::Answered,
            is_current: true,
        })
    );
}

#[test]
fn navigation_emits_rebuild_and_two_palette_patches() {
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(4), Some(5), 600, t0);
    exam.take_patches();

    exam.go_to(2, t0 + secs(3));

    let patches = exam.take_patches();
    assert_eq!(
        patches[0],
        ViewPatch::Navigation {
            previous_index: 0,
            current_index: 2,
        }
    );
    let palette: Vec<_> = patches
        .iter()
        .filter_map(|p| match p {
            ViewPatch::PaletteButton { index, is_current, .. } => Some((*index, *is_current)),
            _ => None,
        })
        .collect();
    assert_eq!(palette, vec![(0, false), (2, true)]);
}

#[test]
fn revisits_accumulate_time_and_ledger_matches_wall_clock() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(2), Some(3), 600, t0);

    exam.go_to(1, t0 + secs(10)); // q1: 10s
    exam.go_to(0, t0 + secs(25)); // q2: 15s
    exam.submit(None, t0 + secs(30), &sync); // q1: +5s

    assert_eq!(exam.attempt.time_spent_on(1), 15);
    assert_eq!(exam.attempt.time_spent_on(2), 15);

    let total: u64 = exam.attempt.time_ledger().values().sum();
    assert_eq!(total, 30);

    // The finalize payload carries the same ledger.
    let (attempt_id, _answers, time_spent) = sync.last_submit();
    assert_eq!(attempt_id, 3);
    assert_eq!(time_spent.get(&1), Some(&15));
    assert_eq!(time_spent.get(&2), Some(&15));
}

#[test]
fn out_of_range_and_same_index_navigation_are_silent() {
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(1), 600, t0);
    exam.take_patches();

    exam.go_to(99, t0 + secs(2));
    exam.go_to(0, t0 + secs(4));
    assert_eq!(exam.attempt.current_index(), 0);
    assert!(exam.take_patches().is_empty());

    // The no-ops must not have restarted the stopwatch: the full span since
    // entry lands on question 1 at the next real navigation.
    exam.go_to(1, t0 + secs(10));
    assert_eq!(exam.attempt.time_spent_on(1), 10);
}

#[test]
fn save_and_next_commits_view_selection_with_sync() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(11), 600, t0);

    // The view shows b selected but the state never saw the event.
    exam.save_and_next(Some(ChoiceKey::B), t0 + secs(4), &sync);

    assert_eq!(exam.attempt.answer_of(1), Some(ChoiceKey::B));
    assert_eq!(exam.attempt.current_index(), 1);
    assert_eq!(sync.answer_count(), 1);

    // An existing answer is never overwritten by the reconciliation.
    exam.select_choice(2, ChoiceKey::A, &sync);
    exam.save_and_next(Some(ChoiceKey::D), t0 + secs(8), &sync);
    assert_eq!(exam.attempt.answer_of(2), Some(ChoiceKey::A));
}

#[test]
fn submit_reconciles_view_selection_without_interim_sync() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(2), Some(13), 600, t0);

    exam.submit(Some(ChoiceKey::C), t0 + secs(6), &sync);

    // Folded straight into the finalize payload, no redundant answer call.
    assert_eq!(sync.answer_count(), 0);
    let (_, answers, _) = sync.last_submit();
    assert_eq!(answers.get(&1), Some(&ChoiceKey::C));
}

#[test]
fn mutations_after_submit_are_ignored() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(3), Some(2), 600, t0);

    exam.select_choice(1, ChoiceKey::A, &sync);
    exam.submit(None, t0 + secs(5), &sync);
    exam.take_patches();

    exam.select_choice(2, ChoiceKey::B, &sync);
    exam.clear_response();
    exam.mark_for_review(t0 + secs(6));
    exam.go_to(2, t0 + secs(7));

    assert_eq!(exam.attempt.answer_of(1), Some(ChoiceKey::A));
    assert_eq!(exam.attempt.answer_of(2), None);
    assert!(!exam.attempt.is_marked(1));
    assert_eq!(exam.attempt.current_index(), 0);
    assert!(exam.take_patches().is_empty());
    assert_eq!(sync.answer_count(), 1);
}

#[test]
fn answer_overwrite_syncs_each_write() {
    let sync = RecordingSync::default();
    let t0 = Instant::now();
    let mut exam = ExamSession::with_duration_secs(paper(2), Some(21), 600, t0);

    exam.select_choice(1, ChoiceKey::A, &sync);
    exam.select_choice(1, ChoiceKey::D, &sync);

    assert_eq!(exam.attempt.answer_of(1), Some(ChoiceKey::D));
    assert_eq!(sync.answer_count(), 2);

    let calls = sync.answers.lock().unwrap();
    assert_eq!(calls[0], (21, 1, ChoiceKey::A));
    assert_eq!(calls[1], (21, 1, ChoiceKey::D));
}

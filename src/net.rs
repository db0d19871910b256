use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use crate::api::{ApiClient, ApiError, AuthSession, SubmitOutcome};
use crate::event::AppEvent;
use crate::session::question::{ChoiceKey, Question, QuestionId};
use crate::session::AttemptSync;

/// Completion of a network call, delivered through the event queue.
pub enum NetEvent {
    Login(Result<AuthSession, ApiError>),
    Questions(Result<Vec<Question>, ApiError>),
    AttemptStarted(Result<i64, ApiError>),
    /// Best-effort answer sync outcome. Consumed by a no-op handler; failures
    /// surface only in the log.
    AnswerSynced {
        question_id: QuestionId,
        result: Result<(), ApiError>,
    },
    Submitted(Result<SubmitOutcome, ApiError>),
}

/// Runs every API call on its own worker thread and posts the outcome back
/// into the event queue, so nothing here ever blocks navigation or ticking.
pub struct Dispatcher {
    client: Arc<ApiClient>,
    tx: mpsc::Sender<AppEvent>,
}

impl Dispatcher {
    pub fn new(client: ApiClient, tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            client: Arc::new(client),
            tx,
        }
    }

    pub fn set_token(&mut self, token: String) {
        let client = (*self.client).clone().with_token(Some(token));
        self.client = Arc::new(client);
    }

    pub fn login(&self, email: String, password: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.login(&email, &password);
            let _ = tx.send(AppEvent::Net(NetEvent::Login(result)));
        });
    }

    pub fn load_questions(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.fetch_questions();
            let _ = tx.send(AppEvent::Net(NetEvent::Questions(result)));
        });
    }

    pub fn start_attempt(&self, pdf_name: String, total_questions: usize, duration_minutes: u64) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.start_attempt(&pdf_name, total_questions, duration_minutes);
            let _ = tx.send(AppEvent::Net(NetEvent::AttemptStarted(result)));
        });
    }
}

impl AttemptSync for Dispatcher {
    fn sync_answer(&self, attempt_id: i64, question_id: QuestionId, key: ChoiceKey) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.record_answer(attempt_id, question_id, key);
            if let Err(err) = &result {
                // Dropped by design: the finalize payload is authoritative.
                tracing::debug!(question_id, %err, "answer sync dropped");
            }
            let _ = tx.send(AppEvent::Net(NetEvent::AnswerSynced {
                question_id,
                result,
            }));
        });
    }

    fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: &HashMap<QuestionId, ChoiceKey>,
        time_spent: &HashMap<QuestionId, u64>,
    ) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let answers = answers.clone();
        let time_spent = time_spent.clone();
        thread::spawn(move || {
            let result = client.submit_attempt(attempt_id, &answers, &time_spent);
            if let Err(err) = &result {
                tracing::warn!(attempt_id, %err, "finalize call failed");
            }
            let _ = tx.send(AppEvent::Net(NetEvent::Submitted(result)));
        });
    }
}

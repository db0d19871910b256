use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;

use crate::api::SubmitOutcome;
use crate::config::Config;
use crate::net::{Dispatcher, NetEvent};
use crate::session::question::{self, ChoiceKey, Question};
use crate::session::submission::FallbackSummary;
use crate::session::{AttemptSync, ExamSession, ViewPatch};
use crate::store::json_store::JsonStore;
use crate::store::schema::{AuthData, LocalAttemptRecord};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Login,
    Loading,
    Exam,
    Result,
}

/// The destination carried through the login flow: what was interrupted when
/// the credential turned out to be missing or expired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingIntent {
    StartExam,
    Resubmit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

pub struct LoginForm {
    pub email: LineInput,
    pub password: LineInput,
    pub focus: LoginField,
    pub error: Option<String>,
    pub busy: bool,
}

impl LoginForm {
    fn new() -> Self {
        Self {
            email: LineInput::new(""),
            password: LineInput::masked(""),
            focus: LoginField::Email,
            error: None,
            busy: false,
        }
    }
}

pub struct LoadingState {
    pub message: String,
    pub error: Option<String>,
}

pub enum ResultScreen {
    Tracked {
        attempt_id: i64,
        outcome: Option<SubmitOutcome>,
        unconfirmed: Option<String>,
    },
    Fallback {
        summary: FallbackSummary,
        saved_locally: bool,
    },
}

/// Presentation-side state for the exam screen, driven by the session's view
/// patches: navigation rebuilds reset cursor and scroll, a selection patch
/// repaints the highlight and nothing else.
pub struct ExamViewState {
    pub option_cursor: usize,
    pub selected: Option<ChoiceKey>,
    pub scroll: u16,
    /// Digits typed after `g`, pending a jump.
    pub goto_entry: Option<String>,
    pub confirm_submit: bool,
}

impl ExamViewState {
    fn new() -> Self {
        Self {
            option_cursor: 0,
            selected: None,
            scroll: 0,
            goto_entry: None,
            confirm_submit: false,
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: Option<JsonStore>,
    pub net: Dispatcher,
    pub exam: Option<ExamSession>,
    pub view: ExamViewState,
    pub login: LoginForm,
    pub loading: LoadingState,
    pub result: Option<ResultScreen>,
    /// Transient status line shown in the footer.
    pub flash: Option<String>,
    pub should_quit: bool,
    offline: bool,
    questions_path: Option<PathBuf>,
    pending_questions: Option<Vec<Question>>,
    pending_intent: PendingIntent,
}

impl App {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        net: Dispatcher,
        offline: bool,
        questions_path: Option<PathBuf>,
    ) -> Self {
        Self {
            screen: AppScreen::Loading,
            config,
            theme,
            store: JsonStore::new().ok(),
            net,
            exam: None,
            view: ExamViewState::new(),
            login: LoginForm::new(),
            loading: LoadingState {
                message: "Starting…".to_string(),
                error: None,
            },
            result: None,
            flash: None,
            should_quit: false,
            offline,
            questions_path,
            pending_questions: None,
            pending_intent: PendingIntent::StartExam,
        }
    }

    /// Entry point after construction: offline runs start immediately, a
    /// stored credential goes straight to the server handshake, and anything
    /// else lands on the login form first.
    pub fn start(&mut self, logged_in: bool, now: Instant) {
        if self.offline {
            self.start_offline(now);
        } else if logged_in {
            self.begin_launch();
        } else {
            self.screen = AppScreen::Login;
        }
    }

    fn start_offline(&mut self, now: Instant) {
        let loaded = match &self.questions_path {
            Some(path) => question::load_from_file(path),
            None => question::bundled_sample(),
        };
        match loaded {
            Ok(questions) if questions.is_empty() => {
                self.loading.error = Some("No questions available in the paper.".to_string());
                self.screen = AppScreen::Loading;
            }
            Ok(questions) => self.start_exam(questions, None, now),
            Err(err) => {
                self.loading.error = Some(err.to_string());
                self.screen = AppScreen::Loading;
            }
        }
    }

    /// First half of the handshake. The exam UI is held back until the start
    /// call resolves, because its outcome decides tracked vs fallback mode.
    pub fn begin_launch(&mut self) {
        self.screen = AppScreen::Loading;
        self.loading = LoadingState {
            message: "Fetching questions…".to_string(),
            error: None,
        };
        self.net.load_questions();
    }

    pub fn retry_loading(&mut self, now: Instant) {
        if self.loading.error.is_none() {
            return;
        }
        if self.offline {
            self.start_offline(now);
        } else {
            self.begin_launch();
        }
    }

    pub fn handle_net(&mut self, event: NetEvent, now: Instant) {
        match event {
            NetEvent::Login(Ok(auth)) => {
                self.login.busy = false;
                if let Some(store) = &self.store {
                    let _ = store.save_auth(&AuthData {
                        token: Some(auth.token.clone()),
                        email: Some(self.login.email.value().to_string()),
                        username: Some(auth.username.clone()),
                        saved_at: Some(Utc::now()),
                        ..AuthData::default()
                    });
                }
                self.net.set_token(auth.token);
                tracing::info!(user = %auth.username, "logged in");
                match self.pending_intent {
                    PendingIntent::StartExam => self.begin_launch(),
                    PendingIntent::Resubmit => self.redispatch_submit(),
                }
            }
            NetEvent::Login(Err(err)) => {
                self.login.busy = false;
                self.login.error = Some(err.to_string());
            }

            NetEvent::Questions(Ok(questions)) if questions.is_empty() => {
                self.loading.error =
                    Some("No questions available on the server. Upload a paper first.".to_string());
            }
            NetEvent::Questions(Ok(questions)) => {
                let total = questions.len();
                self.pending_questions = Some(questions);
                self.loading.message = "Starting attempt…".to_string();
                self.net.start_attempt(
                    self.config.paper_label.clone(),
                    total,
                    self.config.duration_minutes,
                );
            }
            NetEvent::Questions(Err(err)) if err.is_auth_expired() => {
                self.auth_expired(PendingIntent::StartExam);
            }
            NetEvent::Questions(Err(err)) => {
                self.loading.error = Some(format!("Could not fetch questions: {err}"));
            }

            NetEvent::AttemptStarted(Ok(attempt_id)) => {
                if let Some(questions) = self.pending_questions.take() {
                    tracing::info!(attempt_id, "attempt started");
                    self.start_exam(questions, Some(attempt_id), now);
                }
            }
            NetEvent::AttemptStarted(Err(err)) if err.is_auth_expired() => {
                self.auth_expired(PendingIntent::StartExam);
            }
            NetEvent::AttemptStarted(Err(err)) => {
                // Fallback mode: the session runs untracked and reports a
                // local summary instead of a server-confirmed result.
                tracing::warn!(%err, "attempt start failed, running untracked");
                if let Some(questions) = self.pending_questions.take() {
                    self.flash = Some("Server unavailable, this attempt is untracked.".to_string());
                    self.start_exam(questions, None, now);
                }
            }

            // Best-effort stream: failures were already logged by the worker.
            NetEvent::AnswerSynced { .. } => {}

            NetEvent::Submitted(Ok(outcome)) => self.finish_tracked(Some(outcome), None),
            NetEvent::Submitted(Err(err)) if err.is_auth_expired() => {
                self.auth_expired(PendingIntent::Resubmit);
            }
            NetEvent::Submitted(Err(err)) => {
                self.finish_tracked(None, Some(err.to_string()));
            }
        }
    }

    fn auth_expired(&mut self, intent: PendingIntent) {
        if let Some(store) = &self.store {
            let _ = store.clear_auth();
        }
        self.pending_intent = intent;
        self.login.busy = false;
        self.login.error = Some("Session expired, log in again.".to_string());
        self.screen = AppScreen::Login;
    }

    pub fn submit_login(&mut self) {
        if self.login.busy {
            return;
        }
        let email = self.login.email.value().trim().to_string();
        let password = self.login.password.value().to_string();
        if email.is_empty() || password.is_empty() {
            self.login.error = Some("Email and password are required.".to_string());
            return;
        }
        self.login.error = None;
        self.login.busy = true;
        self.net.login(email, password);
    }

    fn start_exam(&mut self, questions: Vec<Question>, attempt_id: Option<i64>, now: Instant) {
        let session = ExamSession::new(
            questions,
            attempt_id,
            self.config.duration_minutes,
            now,
        );
        self.exam = Some(session);
        self.view = ExamViewState::new();
        self.screen = AppScreen::Exam;
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.screen != AppScreen::Exam {
            return;
        }
        let Some(exam) = self.exam.as_mut() else {
            return;
        };
        if exam.tick(now, &self.net) {
            self.flash = Some("Time is up, submitting this attempt.".to_string());
            self.after_submit();
        }
    }

    /// User-triggered finalize (the countdown path goes through `on_tick`).
    pub fn submit_now(&mut self, now: Instant) {
        let view_choice = self.view.selected;
        let Some(exam) = self.exam.as_mut() else {
            return;
        };
        exam.submit(view_choice, now, &self.net);
        self.after_submit();
    }

    fn after_submit(&mut self) {
        let Some(exam) = self.exam.as_ref() else {
            return;
        };
        if !exam.attempt.is_submitted() {
            return;
        }
        match exam.attempt.attempt_id {
            None => {
                let summary = exam.fallback_summary().unwrap_or(FallbackSummary {
                    total: exam.attempt.question_count(),
                    attempted: exam.attempt.answered_count(),
                    unanswered: exam.attempt.unanswered_count(),
                });
                let saved_locally = self.record_local(summary);
                self.result = Some(ResultScreen::Fallback {
                    summary,
                    saved_locally,
                });
                self.screen = AppScreen::Result;
            }
            Some(_) => {
                // The result screen waits for the finalize outcome; a hung
                // request delays only this transition.
                self.flash = Some("Submitting…".to_string());
            }
        }
    }

    fn record_local(&self, summary: FallbackSummary) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        store
            .append_history(LocalAttemptRecord {
                paper_label: self.config.paper_label.clone(),
                total: summary.total,
                attempted: summary.attempted,
                unanswered: summary.unanswered,
                duration_minutes: self.config.duration_minutes,
                finished_at: Utc::now(),
            })
            .is_ok()
    }

    fn finish_tracked(&mut self, outcome: Option<SubmitOutcome>, unconfirmed: Option<String>) {
        let Some(exam) = self.exam.as_ref() else {
            return;
        };
        let Some(attempt_id) = exam.attempt.attempt_id else {
            return;
        };
        self.result = Some(ResultScreen::Tracked {
            attempt_id,
            outcome,
            unconfirmed,
        });
        self.flash = None;
        self.screen = AppScreen::Result;
    }

    /// After an auth-expired finalize and a fresh login, the preserved payload
    /// is dispatched again from the frozen session state.
    fn redispatch_submit(&mut self) {
        let Some(exam) = self.exam.as_ref() else {
            return;
        };
        let Some(attempt_id) = exam.attempt.attempt_id else {
            return;
        };
        self.net
            .submit_attempt(attempt_id, exam.attempt.answers(), exam.attempt.time_ledger());
        self.flash = Some("Re-submitting…".to_string());
        self.screen = AppScreen::Exam;
    }

    /// Apply the session's pending view patches. Navigation rebuilds the
    /// question area (cursor and scroll reset); a selection patch repaints
    /// only the highlight. Palette and timer cells are re-read from state on
    /// the next frame.
    pub fn drain_patches(&mut self) {
        let Some(exam) = self.exam.as_mut() else {
            return;
        };
        for patch in exam.take_patches() {
            match patch {
                ViewPatch::Navigation { current_index, .. } => {
                    let answer = exam
                        .attempt
                        .question_id_at(current_index)
                        .and_then(|id| exam.attempt.answer_of(id));
                    self.view.selected = answer;
                    self.view.scroll = 0;
                    self.view.option_cursor = exam
                        .attempt
                        .question(current_index)
                        .and_then(|q| {
                            answer.and_then(|key| {
                                q.present_options().iter().position(|&k| k == key)
                            })
                        })
                        .unwrap_or(0);
                }
                ViewPatch::Selection { choice } => {
                    self.view.selected = choice;
                }
                ViewPatch::PaletteButton { .. } | ViewPatch::Timer { .. } => {}
            }
        }
    }
}

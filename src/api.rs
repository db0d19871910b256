use std::collections::HashMap;

use serde::{Deserialize, Serialize};
#[cfg(feature = "network")]
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::session::question::{ChoiceKey, Question, QuestionId};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session expired, log in again")]
    AuthExpired,
    #[error("server returned {status}: {detail}")]
    Http { status: u16, detail: String },
    #[cfg(feature = "network")]
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("built without network support")]
    NetworkDisabled,
}

impl ApiError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}

/// Issued credential from `/api/auth/login`.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StartAttemptRequest<'a> {
    pdf_name: &'a str,
    total_questions: usize,
    duration: u64,
}

#[derive(Deserialize)]
struct StartAttemptResponse {
    attempt_id: i64,
}

#[derive(Serialize)]
struct SaveAnswerRequest {
    question_id: QuestionId,
    chosen_key: ChoiceKey,
}

#[derive(Deserialize)]
struct AckResponse {
    #[allow(dead_code)]
    ok: bool,
}

/// Finalize payload. The backend keys both maps by the stringified question
/// id, recalculates the score server-side, and ignores anything else.
#[derive(Serialize)]
struct SubmitAttemptRequest {
    answers: HashMap<String, ChoiceKey>,
    time_spent: HashMap<String, u64>,
}

/// Server-confirmed outcome of a finalized attempt.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmitOutcome {
    pub score: f64,
    pub correct: u32,
    pub wrong: u32,
    pub unanswered: u32,
    pub total_time: u64,
    #[serde(default)]
    pub per_question_time: HashMap<String, u64>,
}

/// Blocking client for the TestArena attempt API. Callers that must not block
/// (everything on the UI thread) go through `net::Dispatcher`, which runs each
/// call on a worker thread.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.post_json("/api/auth/login", &LoginRequest { email, password })
    }

    /// The full question set for the currently loaded paper, in display
    /// order. Exposed unauthenticated by the backend.
    pub fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.get_json("/api/questions")
    }

    pub fn start_attempt(
        &self,
        pdf_name: &str,
        total_questions: usize,
        duration_minutes: u64,
    ) -> Result<i64, ApiError> {
        let resp: StartAttemptResponse = self.post_json(
            "/api/attempt/start",
            &StartAttemptRequest {
                pdf_name,
                total_questions,
                duration: duration_minutes,
            },
        )?;
        Ok(resp.attempt_id)
    }

    /// Best-effort interim save of one answer. The caller swallows errors and
    /// never retries; the finalize payload is the authoritative record.
    pub fn record_answer(
        &self,
        attempt_id: i64,
        question_id: QuestionId,
        chosen_key: ChoiceKey,
    ) -> Result<(), ApiError> {
        let _ack: AckResponse = self.post_json(
            &format!("/api/attempt/{attempt_id}/answer"),
            &SaveAnswerRequest {
                question_id,
                chosen_key,
            },
        )?;
        Ok(())
    }

    pub fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: &HashMap<QuestionId, ChoiceKey>,
        time_spent: &HashMap<QuestionId, u64>,
    ) -> Result<SubmitOutcome, ApiError> {
        let body = SubmitAttemptRequest {
            answers: answers.iter().map(|(id, key)| (id.to_string(), *key)).collect(),
            time_spent: time_spent.iter().map(|(id, secs)| (id.to_string(), *secs)).collect(),
        };
        self.post_json(&format!("/api/attempt/{attempt_id}/submit"), &body)
    }

    #[cfg(feature = "network")]
    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let mut req = http_client()?.get(self.url(path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        decode(req.send()?)
    }

    #[cfg(feature = "network")]
    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut req = http_client()?.post(self.url(path)).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        decode(req.send()?)
    }

    #[cfg(not(feature = "network"))]
    fn get_json<T>(&self, _path: &str) -> Result<T, ApiError> {
        Err(ApiError::NetworkDisabled)
    }

    #[cfg(not(feature = "network"))]
    fn post_json<B: Serialize, T>(&self, _path: &str, _body: &B) -> Result<T, ApiError> {
        Err(ApiError::NetworkDisabled)
    }
}

// No request timeout: a hung finalize delays only the result transition, and
// navigation never waits on a response.
#[cfg(feature = "network")]
fn http_client() -> Result<reqwest::blocking::Client, ApiError> {
    Ok(reqwest::blocking::Client::builder().timeout(None).build()?)
}

#[cfg(feature = "network")]
fn decode<T: DeserializeOwned>(resp: reqwest::blocking::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if status.as_u16() == 401 {
        return Err(ApiError::AuthExpired);
    }
    let body = resp.text()?;
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// FastAPI wraps error messages as `{"detail": "..."}`; fall back to the raw
/// body, truncated, for anything else.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: String,
    }
    if let Ok(d) = serde_json::from_str::<Detail>(body) {
        return d.detail;
    }
    let trimmed = body.trim();
    let mut out: String = trimmed.chars().take(120).collect();
    if trimmed.chars().count() > 120 {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/", None);
        assert_eq!(
            client.url("/api/questions"),
            "http://localhost:8000/api/questions"
        );
    }

    #[test]
    fn test_error_detail_unwraps_fastapi_body() {
        assert_eq!(
            error_detail(r#"{"detail": "Attempt is already completed."}"#),
            "Attempt is already completed."
        );
        assert_eq!(error_detail("plain text"), "plain text");
    }

    #[test]
    fn test_error_detail_truncates_long_bodies() {
        let body = "x".repeat(400);
        let detail = error_detail(&body);
        assert!(detail.chars().count() <= 121);
        assert!(detail.ends_with('…'));
    }

    #[test]
    fn test_submit_request_keys_are_stringified_ids() {
        let mut answers = HashMap::new();
        answers.insert(7i64, ChoiceKey::B);
        let mut time_spent = HashMap::new();
        time_spent.insert(7i64, 42u64);

        let body = SubmitAttemptRequest {
            answers: answers.iter().map(|(id, key)| (id.to_string(), *key)).collect(),
            time_spent: time_spent.iter().map(|(id, s)| (id.to_string(), *s)).collect(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["answers"]["7"], "b");
        assert_eq!(json["time_spent"]["7"], 42);
    }

    #[test]
    fn test_submit_outcome_deserializes_backend_response() {
        let json = r#"{
            "score": 11.0,
            "correct": 3,
            "wrong": 1,
            "unanswered": 1,
            "total_time": 95,
            "per_question_time": {"1": 30, "2": 65}
        }"#;
        let outcome: SubmitOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.correct, 3);
        assert_eq!(outcome.per_question_time.get("2"), Some(&65));
    }

    #[test]
    fn test_auth_expired_predicate() {
        assert!(ApiError::AuthExpired.is_auth_expired());
        assert!(
            !ApiError::Http {
                status: 500,
                detail: String::new()
            }
            .is_auth_expired()
        );
    }
}

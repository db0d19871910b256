use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;

/// Persisted login credential. The token is the bearer value issued by the
/// backend; `saved_at` exists so stale files are recognizable in the log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthData {
    pub schema_version: u32,
    pub token: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for AuthData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            token: None,
            email: None,
            username: None,
            saved_at: None,
        }
    }
}

impl AuthData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

/// One locally recorded fallback result. Only untracked attempts land here;
/// tracked attempts live server-side under their attempt id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalAttemptRecord {
    pub paper_label: String,
    pub total: usize,
    pub attempted: usize,
    pub unanswered: usize,
    pub duration_minutes: u64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalHistoryData {
    pub schema_version: u32,
    pub attempts: Vec<LocalAttemptRecord>,
}

impl Default for LocalHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            attempts: Vec::new(),
        }
    }
}

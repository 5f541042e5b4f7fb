use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one successful curation run.
///
/// Sessions are create-only. Running the pipeline twice on the same day
/// produces two sessions; nothing is merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSession {
    pub id: Uuid,
    /// Local calendar date of the run.
    pub session_date: NaiveDate,
    /// Unique candidates after deduplication.
    pub articles_fetched: i64,
    /// Articles persisted or reused from the store.
    pub articles_curated: i64,
    pub agent_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a curation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionInput {
    pub session_date: NaiveDate,
    pub articles_fetched: i64,
    pub articles_curated: i64,
    #[serde(default)]
    pub agent_notes: Option<String>,
}

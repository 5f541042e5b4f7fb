use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A thumbs-up/thumbs-down judgment on a stored article.
///
/// An article may collect several feedback rows over time; the most recent
/// one (by `feedback_at`) is treated as the current judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub article_id: Uuid,
    pub liked: bool,
    pub notes: Option<String>,
    pub feedback_at: DateTime<Utc>,
}

/// Input for attaching feedback to an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedbackInput {
    pub liked: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

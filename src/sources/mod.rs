//! Article search collaborators.
//!
//! The curation pipeline only sees the [`ArticleSource`] trait; [`GNewsClient`]
//! is the production implementation.

mod gnews;

pub use gnews::GNewsClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Candidate;

/// Per-query search failures.
///
/// The pipeline treats every variant the same way (zero articles from that
/// query) but logs which kind it was.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error: {status}")]
    Api { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Something that can answer a free-text article search.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Search for up to `max` articles matching `query`, newest first.
    async fn search(&self, query: &str, max: u32) -> Result<Vec<Candidate>, SourceError>;
}

/// One search issued per curation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Short label for logs, e.g. "India".
    pub label: String,
    pub query: String,
    pub max: u32,
}

impl SearchQuery {
    pub fn new(label: impl Into<String>, query: impl Into<String>, max: u32) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
            max,
        }
    }

    /// India-focused foreign policy coverage plus global diplomacy without India.
    pub fn defaults(max: u32) -> Vec<Self> {
        vec![
            Self::new(
                "India",
                r#"India (diplomacy OR "foreign policy" OR "external affairs" OR bilateral OR geopolitical)"#,
                max,
            ),
            Self::new(
                "global",
                r#"(diplomacy OR "international relations" OR "foreign policy" OR geopolitical) -India"#,
                max,
            ),
        ]
    }

    /// An OR-query over quoted topics, e.g. from the `topics` preference.
    pub fn from_topics(label: impl Into<String>, topics: &[String], max: u32) -> Self {
        let query = topics
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR ");
        Self::new(label, query, max)
    }
}

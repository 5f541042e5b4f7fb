//! Daily curation.
//!
//! [`CurationPipeline`] does one run end to end; [`Curator`] wraps it with the
//! read and feedback operations the CLI and the MCP server need.

mod context;
mod dedup;
mod parser;
mod pipeline;
mod prompt;

pub use context::{DislikedExample, LikedExample, PreferenceContext, FEEDBACK_SAMPLE_LIMIT};
pub use dedup::remove_duplicates;
pub use parser::{parse_selections, ParseWarning, ParsedSelections};
pub use pipeline::{
    CurationError, CurationFailure, CurationOutcome, CurationPipeline, CurationReport,
    CurationStage,
};
pub use prompt::{build_curation_prompt, format_candidates};

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{CreateFeedbackInput, CurationSession, Feedback, StoredArticle};

/// Articles and sessions over a trailing window of days.
#[derive(Debug, Clone)]
pub struct CurationHistory {
    pub days: u32,
    pub since: NaiveDate,
    pub articles: Vec<StoredArticle>,
    pub sessions: Vec<CurationSession>,
}

/// Entry point for everything that reads or drives curation.
///
/// A read-only curator can list articles, record feedback and show history,
/// but every run fails with [`CurationError::NotConfigured`].
#[derive(Clone)]
pub struct Curator {
    db: Database,
    pipeline: Option<Arc<CurationPipeline>>,
}

impl Curator {
    pub fn new(db: Database, pipeline: CurationPipeline) -> Self {
        Self {
            db,
            pipeline: Some(Arc::new(pipeline)),
        }
    }

    pub fn read_only(db: Database) -> Self {
        Self { db, pipeline: None }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn run_daily_curation(&self) -> CurationOutcome {
        let Some(pipeline) = &self.pipeline else {
            tracing::warn!("Curation requested but no article source or model is configured");
            return CurationOutcome::Failed(CurationFailure {
                stage: CurationStage::Idle,
                error: CurationError::NotConfigured,
            });
        };

        tracing::info!("Starting daily news curation");
        pipeline.run().await
    }

    /// Articles curated since local midnight, newest first.
    pub fn todays_articles(&self) -> Result<Vec<StoredArticle>> {
        let today = Local::now().date_naive();
        let (start, end) = local_day_bounds(today);
        self.db.get_articles_curated_between(start, end)
    }

    /// The latest run recorded for today's local date, if any.
    pub fn todays_session(&self) -> Result<Option<CurationSession>> {
        let today = Local::now().date_naive();
        let sessions = self.db.get_sessions_since(today)?;
        Ok(sessions.into_iter().find(|s| s.session_date == today))
    }

    pub fn provide_feedback(
        &self,
        article_id: Uuid,
        liked: bool,
        notes: Option<String>,
    ) -> Result<Feedback, CurationError> {
        let feedback = self
            .db
            .attach_feedback(article_id, CreateFeedbackInput { liked, notes })?
            .ok_or(CurationError::FeedbackTargetNotFound(article_id))?;

        tracing::info!(
            "Recorded {} feedback for article {}",
            if liked { "positive" } else { "negative" },
            article_id
        );
        Ok(feedback)
    }

    /// Everything curated in the last `days` days, counting today.
    pub fn history(&self, days: u32) -> Result<CurationHistory> {
        let today = Local::now().date_naive();
        let since = today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        let (start, _) = local_day_bounds(since);

        Ok(CurationHistory {
            days,
            since,
            articles: self.db.get_articles_since(start)?,
            sessions: self.db.get_sessions_since(since)?,
        })
    }
}

/// UTC instants of local midnight at the start and end of `date`.
pub fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (local_midnight(date), local_midnight(next))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds_span_one_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = local_day_bounds(date);
        let hours = (end - start).num_hours();
        assert!((23..=25).contains(&hours));
    }
}

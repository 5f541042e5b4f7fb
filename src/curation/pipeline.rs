use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use uuid::Uuid;

use super::context::PreferenceContext;
use super::dedup::remove_duplicates;
use super::parser::{parse_selections, ParseWarning};
use super::prompt::build_curation_prompt;
use crate::db::Database;
use crate::llm::{CompletionModel, ModelError};
use crate::models::{
    Candidate, CreateSessionInput, CurationSession, Preferences, Selection, StoredArticle,
};
use crate::sources::{ArticleSource, SearchQuery};

const TOPICS_QUERY_MAX: u32 = 10;

/// Where a curation run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationStage {
    Idle,
    Fetching,
    Deduplicating,
    ContextBuilding,
    Prompting,
    AwaitingModel,
    Parsing,
    Persisting,
    Completed,
    Failed,
}

impl CurationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Deduplicating => "deduplicating",
            Self::ContextBuilding => "context_building",
            Self::Prompting => "prompting",
            Self::AwaitingModel => "awaiting_model",
            Self::Parsing => "parsing",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CurationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("no articles fetched from any source")]
    NoCandidates,

    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),

    #[error("no suitable articles found")]
    NoSelections,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Article not found with ID: {0}")]
    FeedbackTargetNotFound(Uuid),

    #[error("Curation is not configured: set GNEWS_API_KEY and ANTHROPIC_API_KEY")]
    NotConfigured,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct CurationReport {
    /// Stored articles in the order the model selected them, each listed once.
    pub articles: Vec<StoredArticle>,
    pub session: CurationSession,
    /// Candidates returned by all queries before deduplication.
    pub raw_count: usize,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug)]
pub struct CurationFailure {
    /// The stage that was running when the run stopped.
    pub stage: CurationStage,
    pub error: CurationError,
}

#[derive(Debug)]
pub enum CurationOutcome {
    Completed(CurationReport),
    Failed(CurationFailure),
}

impl CurationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn report(&self) -> Option<&CurationReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CurationFailure> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// One fetch → dedup → prompt → model → parse → persist pass.
///
/// A run never returns an error to its caller: every failure is folded into
/// [`CurationOutcome::Failed`] together with the stage it happened in.
/// Nothing is written to the store unless the model produced at least one
/// valid selection.
pub struct CurationPipeline {
    db: Database,
    source: Arc<dyn ArticleSource>,
    queries: Vec<SearchQuery>,
    model: Arc<dyn CompletionModel>,
    defaults: Preferences,
}

impl CurationPipeline {
    pub fn new(
        db: Database,
        source: Arc<dyn ArticleSource>,
        queries: Vec<SearchQuery>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        Self {
            db,
            source,
            queries,
            model,
            defaults: Preferences::default(),
        }
    }

    /// Replace the built-in preference defaults.
    pub fn with_defaults(mut self, defaults: Preferences) -> Self {
        self.defaults = defaults;
        self
    }

    pub async fn run(&self) -> CurationOutcome {
        let mut stage = StageTracker::new();
        match self.run_stages(&mut stage).await {
            Ok(report) => {
                stage.advance(CurationStage::Completed);
                tracing::info!(
                    "Curation completed: {} articles from {} candidates",
                    report.articles.len(),
                    report.session.articles_fetched
                );
                CurationOutcome::Completed(report)
            }
            Err(error) => {
                let failed_at = stage.current;
                stage.advance(CurationStage::Failed);
                tracing::error!("Curation failed during {}: {}", failed_at, error);
                CurationOutcome::Failed(CurationFailure {
                    stage: failed_at,
                    error,
                })
            }
        }
    }

    async fn run_stages(&self, stage: &mut StageTracker) -> Result<CurationReport, CurationError> {
        stage.advance(CurationStage::Fetching);
        let fetched = self.fetch_all().await;
        let raw_count = fetched.len();
        if fetched.is_empty() {
            return Err(CurationError::NoCandidates);
        }

        stage.advance(CurationStage::Deduplicating);
        let candidates = remove_duplicates(fetched);
        tracing::info!(
            "{} unique candidates after removing {} duplicates",
            candidates.len(),
            raw_count - candidates.len()
        );

        stage.advance(CurationStage::ContextBuilding);
        let context = PreferenceContext::load(&self.db, &self.defaults)?;
        let target = context.preferences.target_count();

        stage.advance(CurationStage::Prompting);
        let prompt = build_curation_prompt(&candidates, &context, target);

        stage.advance(CurationStage::AwaitingModel);
        tracing::info!(
            "Asking {} to select {} of {} articles",
            self.model.name(),
            target,
            candidates.len()
        );
        let response = self.model.complete(&prompt).await?;

        stage.advance(CurationStage::Parsing);
        let parsed = parse_selections(&response, &candidates);
        if parsed.selections.is_empty() {
            return Err(CurationError::NoSelections);
        }

        stage.advance(CurationStage::Persisting);
        let selections = distinct_by_url(parsed.selections);
        let (articles, session) = self.db.record_curation(
            &selections,
            CreateSessionInput {
                session_date: Local::now().date_naive(),
                articles_fetched: candidates.len() as i64,
                articles_curated: selections.len() as i64,
                agent_notes: Some(format!(
                    "Selected {} articles with AI reasoning ({})",
                    selections.len(),
                    self.model.name()
                )),
            },
        )?;

        Ok(CurationReport {
            articles,
            session,
            raw_count,
            warnings: parsed.warnings,
        })
    }

    /// Run every query in order. A failing query contributes nothing.
    async fn fetch_all(&self) -> Vec<Candidate> {
        let mut all = Vec::new();
        for query in self.search_queries() {
            match self.source.search(&query.query, query.max).await {
                Ok(found) => {
                    tracing::info!(
                        "Fetched {} {} articles from {}",
                        found.len(),
                        query.label,
                        self.source.name()
                    );
                    all.extend(found);
                }
                Err(e) => {
                    tracing::warn!("{} news fetch from {} failed: {}", query.label, self.source.name(), e);
                }
            }
        }
        all
    }

    /// The configured queries, plus one over the reader's stored `topics` when set.
    fn search_queries(&self) -> Vec<SearchQuery> {
        let mut queries = self.queries.clone();
        let topics = match self.db.get_preference("topics") {
            Ok(Some(value)) => serde_json::from_value::<Vec<String>>(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable topics preference: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read topics preference: {}", e);
                Vec::new()
            }
        };

        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !topics.is_empty() {
            let max = queries.iter().map(|q| q.max).max().unwrap_or(TOPICS_QUERY_MAX);
            queries.push(SearchQuery::from_topics("topics", &topics, max));
        }
        queries
    }
}

/// The model may name the same candidate more than once; keep the first.
fn distinct_by_url(selections: Vec<Selection>) -> Vec<Selection> {
    let mut seen = HashSet::new();
    selections
        .into_iter()
        .filter(|s| seen.insert(s.candidate.url.clone()))
        .collect()
}

struct StageTracker {
    current: CurationStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: CurationStage::Idle,
        }
    }

    fn advance(&mut self, next: CurationStage) {
        tracing::debug!("Curation stage {} -> {}", self.current, next);
        self.current = next;
    }
}

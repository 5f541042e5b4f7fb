//! MCP server exposing daily curation to assistants.

mod render;
mod types;

pub use render::{render_articles, render_history};
pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde_json::Value;
use uuid::Uuid;

use crate::curation::{CurationError, CurationOutcome, Curator};

const NO_ARTICLES: &str =
    "No curated articles available for today. Run curation manually with refresh: true";

#[derive(Clone)]
pub struct NewsCuratorServer {
    curator: Curator,
    tool_router: ToolRouter<Self>,
}

impl NewsCuratorServer {
    pub fn new(curator: Curator) -> Self {
        Self {
            curator,
            tool_router: Self::tool_router(),
        }
    }

    fn internal(e: impl ToString) -> McpError {
        McpError::internal_error(e.to_string(), None)
    }

    // ============================================================
    // Tool logic, exposed for testing
    // ============================================================

    /// Today's articles, curating first when asked to or when nothing ran today.
    pub async fn curate_news_text(&self, refresh: bool) -> Result<ToolText, McpError> {
        let todays = self.curator.todays_articles().map_err(Self::internal)?;
        if !refresh {
            if !todays.is_empty() {
                return Ok(ToolText::ok(render_articles(&todays)));
            }
            // Runs that only re-select stored URLs leave today's list empty.
            if let Some(session) = self.curator.todays_session().map_err(Self::internal)? {
                return Ok(ToolText::ok(format!(
                    "Today's curation already ran and picked {} articles, all first curated on \
                     earlier days. See news_history, or run curation again with refresh: true",
                    session.articles_curated
                )));
            }
        }

        match self.curator.run_daily_curation().await {
            CurationOutcome::Completed(report) => Ok(ToolText::ok(render_articles(&report.articles))),
            CurationOutcome::Failed(failure) => Ok(ToolText::error(format!(
                "[ERROR] Curation failed: {}\n{}",
                failure.error, NO_ARTICLES
            ))),
        }
    }

    pub fn news_feedback_text(
        &self,
        article_id: &str,
        liked: bool,
        notes: Option<String>,
    ) -> Result<ToolText, McpError> {
        let Ok(id) = Uuid::parse_str(article_id.trim()) else {
            return Ok(ToolText::error(format!(
                "[ERROR] Invalid article ID: {}",
                article_id
            )));
        };

        match self.curator.provide_feedback(id, liked, notes) {
            Ok(_) => {
                let status = if liked { "LIKED" } else { "DISLIKED" };
                Ok(ToolText::ok(format!(
                    "[{}] Feedback recorded! Future curation will learn from it.",
                    status
                )))
            }
            Err(e @ CurationError::FeedbackTargetNotFound(_)) => {
                Ok(ToolText::error(format!("[ERROR] {}", e)))
            }
            Err(e) => Err(Self::internal(e)),
        }
    }

    pub fn news_preferences_text(
        &self,
        action: PreferenceAction,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<ToolText, McpError> {
        let db = self.curator.db();

        match action {
            PreferenceAction::View => {
                let prefs = db.get_all_preferences().map_err(Self::internal)?;
                let json = serde_json::to_string_pretty(&prefs).map_err(Self::internal)?;
                Ok(ToolText::ok(format!("Your News Preferences:\n\n{}", json)))
            }
            PreferenceAction::Update => {
                let (Some(key), Some(value)) = (key.filter(|k| !k.is_empty()), value) else {
                    return Ok(ToolText::error(
                        "[ERROR] Both key and value are required for update action",
                    ));
                };

                let parsed = serde_json::from_str::<Value>(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                db.set_preference(key, &parsed).map_err(Self::internal)?;
                tracing::info!("Preference '{}' updated via MCP", key);

                Ok(ToolText::ok(format!(
                    "[OK] Updated preference: {} = {}",
                    key, parsed
                )))
            }
        }
    }

    pub fn news_history_text(&self, days: u32) -> Result<ToolText, McpError> {
        let history = self.curator.history(days).map_err(Self::internal)?;
        Ok(ToolText::ok(render_history(&history)))
    }
}

#[tool_router]
impl NewsCuratorServer {
    #[tool(
        description = "Get today's AI-curated news articles on foreign policy and diplomacy. Returns the stored selection for today, or runs a new curation when none exists or refresh is true. Each article includes an ID to use with news_feedback."
    )]
    async fn curate_news(
        &self,
        params: Parameters<CurateNewsRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.curate_news_text(params.0.refresh).await?.into())
    }

    #[tool(
        description = "Give a thumbs up or thumbs down on a curated article. Liked and disliked articles steer future selections."
    )]
    async fn news_feedback(
        &self,
        params: Parameters<NewsFeedbackRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        Ok(self
            .news_feedback_text(&req.article_id, req.liked, req.notes)?
            .into())
    }

    #[tool(
        description = "View or update news curation preferences. 'view' shows every preference with defaults filled in. 'update' sets one key; the value is parsed as JSON when possible (e.g. 3, [\"a\",\"b\"], {\"knowledge_level\":\"expert\"})."
    )]
    async fn news_preferences(
        &self,
        params: Parameters<NewsPreferencesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        Ok(self
            .news_preferences_text(req.action, req.key.as_deref(), req.value.as_deref())?
            .into())
    }

    #[tool(description = "View how many articles were curated and the curation sessions over the last N days")]
    async fn news_history(
        &self,
        params: Parameters<NewsHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.news_history_text(params.0.days)?.into())
    }
}

#[tool_handler]
impl ServerHandler for NewsCuratorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "news-curator".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"News Curator selects a small number of foreign policy and diplomacy articles each day and learns from feedback.

WORKFLOW:
1. Call curate_news to read today's selection (refresh: true forces a new run)
2. Call news_feedback with an article ID and liked true/false
3. Call news_preferences to view or tune what gets selected
4. Call news_history to review recent runs

PREFERENCE KEYS:
- articles_per_day: how many articles each run selects
- min_relevance_score: 1-10 threshold
- topics, focus_areas, exclude_keywords: lists of strings
- user_profile: {"knowledge_level": beginner|intermediate|advanced|expert, "learning_goals": [...]}
- learning_approach: {"coverage_style", "avoid_duplicate_stories", "terminology", "context_depth"}
- content_preferences: {"article_complexity", "source_perspective", "geographic_focus"}"#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(curator: Curator) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = NewsCuratorServer::new(curator);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

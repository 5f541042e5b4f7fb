//! Request and response types for MCP tools.

use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::JsonSchema;
use serde::Deserialize;

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CurateNewsRequest {
    #[schemars(
        description = "Force a new curation run even if articles were already curated today (default: false, returns today's stored articles)"
    )]
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NewsFeedbackRequest {
    #[schemars(description = "The UUID of the article, as shown in the curate_news output")]
    pub article_id: String,
    #[schemars(description = "true for thumbs up, false for thumbs down")]
    pub liked: bool,
    #[schemars(description = "Optional notes about why you liked or disliked it")]
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceAction {
    View,
    Update,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NewsPreferencesRequest {
    #[schemars(description = "'view' to show current preferences, 'update' to change one")]
    pub action: PreferenceAction,
    #[schemars(description = "Preference key to update (required for update)")]
    #[serde(default)]
    pub key: Option<String>,
    #[schemars(
        description = "New value (required for update). Parsed as JSON when possible, otherwise stored as a string"
    )]
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NewsHistoryRequest {
    #[schemars(description = "Number of days to look back (default: 7)")]
    #[serde(default = "default_history_days")]
    pub days: u32,
}

impl Default for NewsHistoryRequest {
    fn default() -> Self {
        Self {
            days: default_history_days(),
        }
    }
}

fn default_history_days() -> u32 {
    7
}

// ============================================================
// Response Types
// ============================================================

/// Human-readable tool output plus whether it reports a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolText {
    pub text: String,
    pub is_error: bool,
}

impl ToolText {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<ToolText> for CallToolResult {
    fn from(reply: ToolText) -> Self {
        let content = vec![Content::text(reply.text)];
        if reply.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

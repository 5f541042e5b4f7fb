//! MCP tool server integration tests.
//!
//! The curation pipeline is driven by fakes; everything else (storage,
//! rendering, error flags) is real.

use std::sync::Arc;

use async_trait::async_trait;
use news_curator::curation::{CurationPipeline, Curator};
use news_curator::db::Database;
use news_curator::llm::{CompletionModel, ModelError};
use news_curator::mcp::{NewsCuratorServer, PreferenceAction};
use news_curator::models::*;
use news_curator::sources::{ArticleSource, SearchQuery, SourceError};
use serde_json::json;

struct StaticSource(Vec<Candidate>);

#[async_trait]
impl ArticleSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: &str, _max: u32) -> Result<Vec<Candidate>, SourceError> {
        Ok(self.0.clone())
    }
}

struct StaticModel(String);

#[async_trait]
impl CompletionModel for StaticModel {
    fn name(&self) -> &str {
        "static"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok(self.0.clone())
    }
}

fn candidate(title: &str, url: &str) -> Candidate {
    Candidate {
        title: Some(title.to_string()),
        description: None,
        url: url.to_string(),
        source: Some(CandidateSource {
            name: Some("Example Wire".to_string()),
        }),
        published_at: None,
    }
}

/// Helper to create a server whose pipeline selects the first candidate.
fn setup_with(candidates: Vec<Candidate>, reply: &str) -> (NewsCuratorServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");

    let pipeline = CurationPipeline::new(
        db.clone(),
        Arc::new(StaticSource(candidates)),
        vec![SearchQuery::new("all", "diplomacy", 10)],
        Arc::new(StaticModel(reply.to_string())),
    );
    let server = NewsCuratorServer::new(Curator::new(db.clone(), pipeline));
    (server, db)
}

fn setup() -> (NewsCuratorServer, Database) {
    setup_with(
        vec![candidate("Quad ministers meet in Delhi", "https://news.example/quad")],
        r#"[{"article_index": 0, "relevance_score": 9, "category": "Indian Foreign Policy", "reason": "Sets the regional agenda."}]"#,
    )
}

fn store_article(db: &Database, title: &str, url: &str) -> StoredArticle {
    db.upsert_article(&Selection {
        candidate: candidate(title, url),
        relevance_score: Some(7),
        category: Some(Category::GlobalDiplomacy),
        reason: Some("stored earlier".to_string()),
    })
    .expect("Failed to store article")
}

// ============================================================
// curate_news
// ============================================================

mod curate_news {
    use super::*;

    #[tokio::test]
    async fn curates_when_nothing_is_stored_today() {
        let (server, db) = setup();

        let reply = server.curate_news_text(false).await.expect("Tool failed");

        assert!(!reply.is_error);
        assert!(reply.text.contains("1. Quad ministers meet in Delhi"));
        assert!(reply.text.contains("Relevance: 9/10 | Indian Foreign Policy"));
        assert!(reply.text.contains("Why selected: Sets the regional agenda."));
        assert!(db.get_article_by_url("https://news.example/quad").unwrap().is_some());
    }

    #[tokio::test]
    async fn returns_stored_articles_without_refresh() {
        let (server, db) = setup();
        store_article(&db, "Already curated", "https://news.example/stored");

        let reply = server.curate_news_text(false).await.expect("Tool failed");

        assert!(reply.text.contains("Already curated"));
        assert!(!reply.text.contains("Quad ministers"));
    }

    #[tokio::test]
    async fn refresh_runs_a_new_curation() {
        let (server, db) = setup();
        store_article(&db, "Already curated", "https://news.example/stored");

        let reply = server.curate_news_text(true).await.expect("Tool failed");

        assert!(reply.text.contains("Quad ministers"));
        assert!(!reply.text.contains("Already curated"));
    }

    #[tokio::test]
    async fn does_not_rerun_after_a_run_that_reused_older_articles() {
        let (server, db) = setup();
        let today = chrono::Local::now().date_naive();
        db.create_session(CreateSessionInput {
            session_date: today,
            articles_fetched: 4,
            articles_curated: 2,
            agent_notes: None,
        })
        .expect("Failed to create session");

        let reply = server.curate_news_text(false).await.expect("Tool failed");

        assert!(!reply.is_error);
        assert!(reply.text.contains("already ran and picked 2 articles"));
        assert!(db.get_article_by_url("https://news.example/quad").unwrap().is_none());
        assert_eq!(db.get_sessions_since(today).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flags_a_failed_run() {
        let (server, _db) = setup_with(vec![], "[]");

        let reply = server.curate_news_text(false).await.expect("Tool failed");

        assert!(reply.is_error);
        assert!(reply.text.contains("no articles fetched from any source"));
        assert!(reply.text.contains("refresh: true"));
    }
}

// ============================================================
// news_feedback
// ============================================================

mod news_feedback {
    use super::*;

    #[tokio::test]
    async fn records_feedback() {
        let (server, db) = setup();
        let article = store_article(&db, "Rated", "https://news.example/rated");

        let reply = server
            .news_feedback_text(&article.id.to_string(), true, Some("great".to_string()))
            .expect("Tool failed");

        assert!(!reply.is_error);
        assert!(reply.text.starts_with("[LIKED]"));
        let current = db.get_current_feedback(article.id).unwrap().expect("missing");
        assert!(current.liked);
        assert_eq!(current.notes.as_deref(), Some("great"));
    }

    #[tokio::test]
    async fn dislike_is_reported() {
        let (server, db) = setup();
        let article = store_article(&db, "Rated", "https://news.example/rated");

        let reply = server
            .news_feedback_text(&article.id.to_string(), false, None)
            .expect("Tool failed");

        assert!(reply.text.starts_with("[DISLIKED]"));
    }

    #[tokio::test]
    async fn unknown_article_sets_error_flag() {
        let (server, _db) = setup();
        let id = uuid::Uuid::new_v4();

        let reply = server
            .news_feedback_text(&id.to_string(), true, None)
            .expect("Tool failed");

        assert!(reply.is_error);
        assert!(reply.text.contains(&format!("Article not found with ID: {}", id)));
    }

    #[tokio::test]
    async fn malformed_id_sets_error_flag() {
        let (server, _db) = setup();

        let reply = server
            .news_feedback_text("42", true, None)
            .expect("Tool failed");

        assert!(reply.is_error);
        assert!(reply.text.contains("Invalid article ID: 42"));
    }
}

// ============================================================
// news_preferences
// ============================================================

mod news_preferences {
    use super::*;

    #[tokio::test]
    async fn view_includes_defaults() {
        let (server, _db) = setup();

        let reply = server
            .news_preferences_text(PreferenceAction::View, None, None)
            .expect("Tool failed");

        assert!(!reply.is_error);
        assert!(reply.text.starts_with("Your News Preferences:"));
        assert!(reply.text.contains("\"articles_per_day\": 2"));
    }

    #[tokio::test]
    async fn update_parses_json_values() {
        let (server, db) = setup();

        let reply = server
            .news_preferences_text(PreferenceAction::Update, Some("articles_per_day"), Some("3"))
            .expect("Tool failed");

        assert!(!reply.is_error);
        assert_eq!(reply.text, "[OK] Updated preference: articles_per_day = 3");
        assert_eq!(db.get_preference("articles_per_day").unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn update_falls_back_to_plain_string() {
        let (server, db) = setup();

        server
            .news_preferences_text(PreferenceAction::Update, Some("note"), Some("read later"))
            .expect("Tool failed");

        assert_eq!(db.get_preference("note").unwrap(), Some(json!("read later")));
    }

    #[tokio::test]
    async fn update_requires_key_and_value() {
        let (server, _db) = setup();

        let reply = server
            .news_preferences_text(PreferenceAction::Update, Some("articles_per_day"), None)
            .expect("Tool failed");

        assert!(reply.is_error);
        assert!(reply.text.contains("Both key and value are required"));
    }
}

// ============================================================
// news_history
// ============================================================

mod news_history {
    use super::*;

    #[tokio::test]
    async fn summarizes_recent_runs() {
        let (server, _db) = setup();
        server.curate_news_text(true).await.expect("Tool failed");

        let reply = server.news_history_text(7).expect("Tool failed");

        assert!(!reply.is_error);
        assert!(reply.text.starts_with("Curation History (Last 7 days)"));
        assert!(reply.text.contains("Total articles curated: 1"));
        assert!(reply.text.contains("Curation sessions: 1"));
        assert!(reply.text.contains(": 1 articles from 1 fetched"));
    }

    #[tokio::test]
    async fn empty_history() {
        let (server, _db) = setup();

        let reply = server.news_history_text(3).expect("Tool failed");

        assert!(reply.text.contains("Total articles curated: 0"));
        assert!(reply.text.contains("Curation sessions: 0"));
    }
}

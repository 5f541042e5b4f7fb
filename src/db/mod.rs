mod schema;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;
use uuid::Uuid;

use crate::models::*;

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.description, a.url, a.source_name, a.published_at,
     a.curated_at, a.curation_reason, a.relevance_score, a.category";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "news-curator")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("news-curator.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Article operations
    // ============================================================

    /// Find-or-create a stored article for a selection, keyed by URL.
    ///
    /// A new row takes every field from the selection and `curated_at = now`.
    /// When the URL is already stored the existing row is returned as is;
    /// the selection's reason, score and category are discarded.
    pub fn upsert_article(&self, selection: &Selection) -> Result<StoredArticle> {
        let conn = self.conn.lock().expect("database lock poisoned");
        upsert_article_on(&conn, selection)
    }

    pub fn get_article(&self, id: Uuid) -> Result<Option<StoredArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let article = conn
            .query_row(
                &format!("SELECT {} FROM curated_articles a WHERE a.id = ?", ARTICLE_COLUMNS),
                [id.to_string()],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    pub fn get_article_by_url(&self, url: &str) -> Result<Option<StoredArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let article = conn
            .query_row(
                &format!("SELECT {} FROM curated_articles a WHERE a.url = ?", ARTICLE_COLUMNS),
                [url],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    /// Articles curated in `[start, end)`, newest first.
    pub fn get_articles_curated_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoredArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM curated_articles a
             WHERE a.curated_at >= ? AND a.curated_at < ?
             ORDER BY a.curated_at DESC",
            ARTICLE_COLUMNS
        ))?;

        let articles = stmt
            .query_map([timestamp(start), timestamp(end)], article_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    /// Articles curated at or after `start`, newest first.
    pub fn get_articles_since(&self, start: DateTime<Utc>) -> Result<Vec<StoredArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM curated_articles a WHERE a.curated_at >= ? ORDER BY a.curated_at DESC",
            ARTICLE_COLUMNS
        ))?;

        let articles = stmt
            .query_map([timestamp(start)], article_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    /// Delete an article. Its feedback goes with it.
    pub fn delete_article(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM curated_articles WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Most recently curated articles whose current feedback is a like.
    pub fn get_recent_liked(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        self.get_recent_by_judgment(true, limit)
    }

    /// Most recently curated articles whose current feedback is a dislike.
    pub fn get_recent_disliked(&self, limit: usize) -> Result<Vec<StoredArticle>> {
        self.get_recent_by_judgment(false, limit)
    }

    fn get_recent_by_judgment(&self, liked: bool, limit: usize) -> Result<Vec<StoredArticle>> {
        let conn = self.conn.lock().expect("database lock poisoned");

        // Only the latest feedback row per article counts; rowid breaks timestamp ties.
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM curated_articles a
             JOIN user_feedback f ON f.id = (
                 SELECT f2.id FROM user_feedback f2
                 WHERE f2.article_id = a.id
                 ORDER BY f2.feedback_at DESC, f2.rowid DESC
                 LIMIT 1
             )
             WHERE f.liked = ?
             ORDER BY a.curated_at DESC
             LIMIT ?",
            ARTICLE_COLUMNS
        ))?;

        let articles = stmt
            .query_map((liked as i32, limit as i64), article_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    // ============================================================
    // Feedback operations
    // ============================================================

    /// Record feedback on an article. Returns `None` if the article does not exist.
    pub fn attach_feedback(
        &self,
        article_id: Uuid,
        input: CreateFeedbackInput,
    ) -> Result<Option<Feedback>> {
        if self.get_article(article_id)?.is_none() {
            return Ok(None);
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO user_feedback (id, article_id, liked, notes, feedback_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                article_id.to_string(),
                input.liked as i32,
                &input.notes,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(Some(Feedback {
            id,
            article_id,
            liked: input.liked,
            notes: input.notes,
            feedback_at: parse_datetime(timestamp(now)),
        }))
    }

    /// The most recent feedback on an article, if any.
    pub fn get_current_feedback(&self, article_id: Uuid) -> Result<Option<Feedback>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let feedback = conn
            .query_row(
                "SELECT id, article_id, liked, notes, feedback_at FROM user_feedback
                 WHERE article_id = ?
                 ORDER BY feedback_at DESC, rowid DESC
                 LIMIT 1",
                [article_id.to_string()],
                feedback_from_row,
            )
            .optional()?;
        Ok(feedback)
    }

    pub fn get_feedback_for_article(&self, article_id: Uuid) -> Result<Vec<Feedback>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, article_id, liked, notes, feedback_at FROM user_feedback
             WHERE article_id = ?
             ORDER BY feedback_at DESC, rowid DESC",
        )?;

        let feedback = stmt
            .query_map([article_id.to_string()], feedback_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feedback)
    }

    // ============================================================
    // Preference operations
    // ============================================================

    /// The stored value for a key. Does not consult defaults.
    pub fn get_preference(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let raw = conn
            .query_row(
                "SELECT value FROM user_preferences WHERE key = ?",
                [key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(raw.map(|v| parse_preference_value(v.unwrap_or_default())))
    }

    pub fn set_preference(&self, key: &str, value: &Value) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let serialized = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO user_preferences (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, &serialized, timestamp(Utc::now())),
        )?;

        Ok(())
    }

    /// Every stored preference row, without defaults.
    pub fn get_stored_preferences(&self) -> Result<BTreeMap<String, Value>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT key, value FROM user_preferences ORDER BY key")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(key, raw)| (key, parse_preference_value(raw)))
            .collect())
    }

    /// Stored preferences merged over the compiled-in defaults.
    pub fn get_all_preferences(&self) -> Result<BTreeMap<String, Value>> {
        let stored = self.get_stored_preferences()?;
        Ok(Preferences::effective_map(&stored))
    }

    // ============================================================
    // Session operations
    // ============================================================

    pub fn create_session(&self, input: CreateSessionInput) -> Result<CurationSession> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_session_on(&conn, input)
    }

    /// Store a run's selections and its session record in one transaction.
    ///
    /// Either every article and the session are written, or none of them are.
    pub fn record_curation(
        &self,
        selections: &[Selection],
        session: CreateSessionInput,
    ) -> Result<(Vec<StoredArticle>, CurationSession)> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let mut articles = Vec::with_capacity(selections.len());
        for selection in selections {
            articles.push(upsert_article_on(&tx, selection)?);
        }
        let session = insert_session_on(&tx, session)?;

        tx.commit()?;
        Ok((articles, session))
    }

    /// Sessions dated on or after `since`, most recent first.
    pub fn get_sessions_since(&self, since: NaiveDate) -> Result<Vec<CurationSession>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, session_date, articles_fetched, articles_curated, agent_notes, created_at
             FROM curation_sessions WHERE session_date >= ?
             ORDER BY session_date DESC, created_at DESC",
        )?;

        let sessions = stmt
            .query_map([since.to_string()], |row| {
                Ok(CurationSession {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    session_date: parse_date(row.get::<_, String>(1)?),
                    articles_fetched: row.get(2)?,
                    articles_curated: row.get(3)?,
                    agent_notes: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn upsert_article_on(conn: &Connection, selection: &Selection) -> Result<StoredArticle> {
    let candidate = &selection.candidate;
    let now = timestamp(Utc::now());

    let inserted = conn.execute(
        "INSERT INTO curated_articles (id, title, description, url, source_name, published_at,
             curated_at, curation_reason, relevance_score, category, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(url) DO NOTHING",
        rusqlite::params![
            Uuid::new_v4().to_string(),
            candidate.title.clone().unwrap_or_default(),
            &candidate.description,
            &candidate.url,
            candidate.source_name(),
            candidate.published_at_utc().map(timestamp),
            &now,
            &selection.reason,
            selection.relevance_score,
            selection.category.map(|c| c.as_str()),
            &now,
        ],
    )?;

    let article = conn.query_row(
        &format!("SELECT {} FROM curated_articles a WHERE a.url = ?", ARTICLE_COLUMNS),
        [&candidate.url],
        article_from_row,
    )?;

    if inserted == 0 {
        tracing::debug!("Article already stored, keeping first curation: {}", article.url);
    }

    Ok(article)
}

fn insert_session_on(conn: &Connection, input: CreateSessionInput) -> Result<CurationSession> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO curation_sessions (id, session_date, articles_fetched, articles_curated, agent_notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            input.session_date.to_string(),
            input.articles_fetched,
            input.articles_curated,
            &input.agent_notes,
            timestamp(now),
        ),
    )?;

    Ok(CurationSession {
        id,
        session_date: input.session_date,
        articles_fetched: input.articles_fetched,
        articles_curated: input.articles_curated,
        agent_notes: input.agent_notes,
        created_at: now,
    })
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<StoredArticle> {
    Ok(StoredArticle {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        source_name: row.get(4)?,
        published_at: row.get::<_, Option<String>>(5)?.map(parse_datetime),
        curated_at: parse_datetime(row.get::<_, String>(6)?),
        curation_reason: row.get(7)?,
        relevance_score: row.get(8)?,
        category: row
            .get::<_, Option<String>>(9)?
            .and_then(|c| Category::from_str(&c).ok()),
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: parse_uuid(row.get::<_, String>(0)?),
        article_id: parse_uuid(row.get::<_, String>(1)?),
        liked: row.get::<_, i32>(2)? != 0,
        notes: row.get(3)?,
        feedback_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

/// Preference values are JSON text; anything else reads back as a plain string.
fn parse_preference_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::Category;

/// A curated article kept in the store.
///
/// At most one stored article exists per URL. The selection fields
/// (`curation_reason`, `relevance_score`, `category`) are written once, when
/// the URL is first curated, and never overwritten by later runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source_name: Option<String>,
    /// `None` when the source omitted the date or it failed to parse.
    pub published_at: Option<DateTime<Utc>>,
    pub curated_at: DateTime<Utc>,
    /// Why the model picked this article.
    pub curation_reason: Option<String>,
    pub relevance_score: Option<i64>,
    pub category: Option<Category>,
}

impl StoredArticle {
    /// Curation time on the local clock, the same clock that bounds "today".
    pub fn formatted_date(&self) -> String {
        self.curated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formatted_date_uses_local_time() {
        let local = Local.with_ymd_and_hms(2025, 3, 9, 23, 45, 0).unwrap();
        let article = StoredArticle {
            id: Uuid::new_v4(),
            title: "Late edition".to_string(),
            description: None,
            url: "https://news.example/late".to_string(),
            source_name: None,
            published_at: None,
            curated_at: local.with_timezone(&Utc),
            curation_reason: None,
            relevance_score: None,
            category: None,
        };

        assert_eq!(article.formatted_date(), "2025-03-09 23:45");
    }
}

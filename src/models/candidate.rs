use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched article that has not been stored yet.
///
/// Field names follow the article-search wire format (`publishedAt`,
/// nested `source.name`), so search responses deserialize straight into
/// candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unique key; two candidates with the same URL are the same article.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: Option<CandidateSource>,
    /// Publication timestamp exactly as the source reported it.
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSource {
    #[serde(default)]
    pub name: Option<String>,
}

impl Candidate {
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Parsed publication time, `None` when absent or not RFC 3339.
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// The fixed set of categories a selection can be filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Indian Foreign Policy")]
    IndianForeignPolicy,
    #[serde(rename = "Global Diplomacy")]
    GlobalDiplomacy,
    #[serde(rename = "Bilateral Relations")]
    BilateralRelations,
    #[serde(rename = "Geopolitical Analysis")]
    GeopoliticalAnalysis,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::IndianForeignPolicy,
        Self::GlobalDiplomacy,
        Self::BilateralRelations,
        Self::GeopoliticalAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndianForeignPolicy => "Indian Foreign Policy",
            Self::GlobalDiplomacy => "Global Diplomacy",
            Self::BilateralRelations => "Bilateral Relations",
            Self::GeopoliticalAnalysis => "Geopolitical Analysis",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// A candidate chosen by the model during one curation run.
///
/// Selections are never stored directly; the article store turns them into
/// [`StoredArticle`](super::StoredArticle) rows keyed by the candidate URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub candidate: Candidate,
    /// Expected in 1..=10; passed through as the model reported it.
    pub relevance_score: Option<i64>,
    /// `None` when the model named a category outside [`Category::ALL`].
    pub category: Option<Category>,
    pub reason: Option<String>,
}

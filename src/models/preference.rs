use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Highest preference layout version this build understands.
///
/// Stored under the `preferences_version` key. Newer layouts are still read
/// field by field; unknown keys are ignored.
pub const PREFERENCES_VERSION: u32 = 1;

/// Effective curation preferences.
///
/// Built from the key/value preference store by [`Preferences::from_map`]:
/// every key present in the store replaces the default for that key, every
/// absent (or unreadable) key falls back to [`Preferences::default`]. The
/// nested profile records resolve each of their own fields independently,
/// so a stored `learning_approach` that only sets `coverage_style` still gets
/// the default context depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub topics: Vec<String>,
    pub focus_areas: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub min_relevance_score: i64,
    pub articles_per_day: usize,
    pub user_profile: UserProfile,
    pub learning_approach: LearningApproach,
    pub content_preferences: ContentPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            topics: strings(&["foreign policy", "diplomacy", "international relations"]),
            focus_areas: strings(&[
                "Indian foreign policy",
                "India bilateral relations",
                "Global diplomacy",
                "Geopolitical shifts",
            ]),
            exclude_keywords: strings(&["bollywood", "cricket", "fashion", "entertainment"]),
            min_relevance_score: 7,
            articles_per_day: 2,
            user_profile: UserProfile {
                knowledge_level: Some(KnowledgeLevel::Intermediate),
                learning_goals: None,
            },
            learning_approach: LearningApproach {
                coverage_style: Some(CoverageStyle::DiverseTopics),
                avoid_duplicate_stories: Some(true),
                terminology: Some(TerminologyStyle::Standard),
                context_depth: Some(ContextDepth::Brief),
            },
            content_preferences: ContentPreferences {
                article_complexity: Some(ArticleComplexity::Balanced),
                source_perspective: Some(SourcePerspective::Balanced),
                geographic_focus: None,
            },
        }
    }
}

impl Preferences {
    pub const KEYS: [&'static str; 8] = [
        "topics",
        "focus_areas",
        "exclude_keywords",
        "min_relevance_score",
        "articles_per_day",
        "user_profile",
        "learning_approach",
        "content_preferences",
    ];

    /// The defaults as a key/value map, the same shape the store holds.
    pub fn default_map() -> BTreeMap<String, Value> {
        Self::default().to_map()
    }

    /// Merge stored rows over the defaults. Stored rows win.
    pub fn effective_map(stored: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        let mut merged = Self::default_map();
        for (key, value) in stored {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Resolve typed preferences from an effective (or partial) map.
    pub fn from_map(map: &BTreeMap<String, Value>) -> Self {
        Self::default().overlay(map)
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(obj)) => obj.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Resolve typed preferences from `map`, using `self` for every key that
    /// is absent or unreadable.
    pub fn overlay(&self, map: &BTreeMap<String, Value>) -> Self {
        if let Some(version) = read::<u32>(map, "preferences_version") {
            if version > PREFERENCES_VERSION {
                tracing::warn!(
                    "Preferences were written by layout version {} (supported: {}), reading known fields only",
                    version,
                    PREFERENCES_VERSION
                );
            }
        }

        let base = self.clone();
        Self {
            topics: read(map, "topics").unwrap_or(base.topics),
            focus_areas: read(map, "focus_areas").unwrap_or(base.focus_areas),
            exclude_keywords: read(map, "exclude_keywords").unwrap_or(base.exclude_keywords),
            min_relevance_score: read(map, "min_relevance_score")
                .unwrap_or(base.min_relevance_score),
            articles_per_day: read(map, "articles_per_day").unwrap_or(base.articles_per_day),
            user_profile: read(map, "user_profile").unwrap_or(base.user_profile),
            learning_approach: read(map, "learning_approach").unwrap_or(base.learning_approach),
            content_preferences: read(map, "content_preferences")
                .unwrap_or(base.content_preferences),
        }
    }

    /// Number of articles to request per run. Never zero.
    pub fn target_count(&self) -> usize {
        self.articles_per_day.max(1)
    }
}

fn read<T: DeserializeOwned>(map: &BTreeMap<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring unreadable preference '{}': {}", key, e);
            None
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Nested profile records
// ============================================================

/// Who the reader is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_level: Option<KnowledgeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_goals: Option<Vec<String>>,
}

impl UserProfile {
    pub fn knowledge_level(&self) -> KnowledgeLevel {
        self.knowledge_level.unwrap_or_default()
    }

    pub fn learning_goals(&self) -> &[String] {
        self.learning_goals.as_deref().unwrap_or_default()
    }
}

/// How the reader wants coverage shaped across a day's selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningApproach {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_style: Option<CoverageStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_duplicate_stories: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminology: Option<TerminologyStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_depth: Option<ContextDepth>,
}

impl LearningApproach {
    pub fn coverage_style(&self) -> CoverageStyle {
        self.coverage_style.unwrap_or_default()
    }

    pub fn avoid_duplicate_stories(&self) -> bool {
        self.avoid_duplicate_stories.unwrap_or(true)
    }

    pub fn terminology(&self) -> TerminologyStyle {
        self.terminology.unwrap_or_default()
    }

    pub fn context_depth(&self) -> ContextDepth {
        self.context_depth.unwrap_or_default()
    }
}

/// What kind of articles the reader wants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_complexity: Option<ArticleComplexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_perspective: Option<SourcePerspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_focus: Option<Vec<String>>,
}

impl ContentPreferences {
    pub fn article_complexity(&self) -> ArticleComplexity {
        self.article_complexity.unwrap_or_default()
    }

    pub fn source_perspective(&self) -> SourcePerspective {
        self.source_perspective.unwrap_or_default()
    }

    pub fn geographic_focus(&self) -> &[String] {
        self.geographic_focus.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleComplexity {
    Accessible,
    Academic,
    #[default]
    Balanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStyle {
    #[default]
    #[serde(alias = "diverse", alias = "diverse-topics")]
    DiverseTopics,
    #[serde(alias = "deep-focus")]
    DeepFocus,
    Mixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminologyStyle {
    #[serde(alias = "explain-in-article", alias = "explain")]
    ExplainInArticle,
    Glossary,
    #[default]
    Standard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextDepth {
    Progressive,
    Extensive,
    Minimal,
    #[default]
    Brief,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePerspective {
    International,
    Indian,
    #[default]
    Balanced,
}

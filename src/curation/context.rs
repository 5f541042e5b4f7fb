//! Preference and feedback conditioning for a curation request.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::db::Database;
use crate::models::{Category, Preferences, StoredArticle};

/// How many liked and disliked articles are sampled into each request.
pub const FEEDBACK_SAMPLE_LIMIT: usize = 10;

/// A previously liked article, with the reason it was originally picked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikedExample {
    pub title: String,
    pub reason: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DislikedExample {
    pub title: String,
    pub category: Option<Category>,
}

/// Everything the prompt needs to know about the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceContext {
    /// Stored preferences merged over defaults, keyed by preference name.
    pub effective: BTreeMap<String, Value>,
    /// Typed view of `effective`.
    pub preferences: Preferences,
    pub liked: Vec<LikedExample>,
    pub disliked: Vec<DislikedExample>,
}

impl PreferenceContext {
    /// Read preferences and feedback samples. Never writes.
    pub fn load(db: &Database, defaults: &Preferences) -> Result<Self> {
        let stored = db.get_stored_preferences()?;
        let liked = db.get_recent_liked(FEEDBACK_SAMPLE_LIMIT)?;
        let disliked = db.get_recent_disliked(FEEDBACK_SAMPLE_LIMIT)?;

        tracing::debug!(
            "Loaded {} stored preferences, {} liked and {} disliked examples",
            stored.len(),
            liked.len(),
            disliked.len()
        );

        Ok(Self::from_parts(defaults, &stored, &liked, &disliked))
    }

    /// Build a context from already-loaded rows.
    pub fn from_parts(
        defaults: &Preferences,
        stored: &BTreeMap<String, Value>,
        liked: &[StoredArticle],
        disliked: &[StoredArticle],
    ) -> Self {
        let mut effective = defaults.to_map();
        effective.extend(stored.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            preferences: defaults.overlay(stored),
            effective,
            liked: liked
                .iter()
                .take(FEEDBACK_SAMPLE_LIMIT)
                .map(|a| LikedExample {
                    title: a.title.clone(),
                    reason: a.curation_reason.clone(),
                    category: a.category,
                })
                .collect(),
            disliked: disliked
                .iter()
                .take(FEEDBACK_SAMPLE_LIMIT)
                .map(|a| DislikedExample {
                    title: a.title.clone(),
                    category: a.category,
                })
                .collect(),
        }
    }
}

impl Default for PreferenceContext {
    fn default() -> Self {
        Self::from_parts(&Preferences::default(), &BTreeMap::new(), &[], &[])
    }
}

//! Candidate deduplication.

use std::collections::HashSet;

use crate::models::Candidate;

/// Drop candidates already seen earlier in the sequence.
///
/// A candidate is a duplicate when its URL equals an earlier URL, or when its
/// title (trimmed, lowercased) equals an earlier title. Candidates without a
/// usable title are only compared by URL. First occurrence wins and the
/// survivors keep their original order.
pub fn remove_duplicates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    candidates
        .into_iter()
        .filter(|candidate| {
            let title = candidate.title.as_deref().and_then(normalize_title);

            let duplicate_title = title.as_ref().is_some_and(|t| seen_titles.contains(t));
            if seen_urls.contains(&candidate.url) || duplicate_title {
                return false;
            }

            seen_urls.insert(candidate.url.clone());
            if let Some(title) = title {
                seen_titles.insert(title);
            }
            true
        })
        .collect()
}

fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

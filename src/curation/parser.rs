//! Turning model text into validated selections.

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Candidate, Category, Selection};

/// Something in the model response that was skipped rather than trusted.
///
/// None of these abort a run; the pipeline decides what an empty result means.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("response contains no JSON array")]
    NoArray,

    #[error("response array is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("selection {position} has no integer article_index")]
    MissingIndex { position: usize },

    #[error("selection {position} points at article {index}, but there are only {count}")]
    IndexOutOfRange {
        position: usize,
        index: i64,
        count: usize,
    },

    #[error("selection {position} has unknown category '{category}'")]
    UnknownCategory { position: usize, category: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSelections {
    pub selections: Vec<Selection>,
    pub warnings: Vec<ParseWarning>,
}

/// Extract selections from raw model text.
///
/// The JSON array is taken from the first `[` to the last `]`, so prose or
/// code fences around it are tolerated. Entries whose `article_index` is
/// missing or outside `candidates` are dropped. Order and duplicates are
/// preserved as the model returned them.
pub fn parse_selections(response: &str, candidates: &[Candidate]) -> ParsedSelections {
    let mut parsed = ParsedSelections::default();

    let Some(span) = array_span(response) else {
        tracing::warn!("Model response contained no JSON array");
        parsed.warnings.push(ParseWarning::NoArray);
        return parsed;
    };

    let entries: Vec<Value> = match serde_json::from_str(span) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to parse model response: {}", e);
            parsed.warnings.push(ParseWarning::InvalidJson(e.to_string()));
            return parsed;
        }
    };

    for (position, entry) in entries.iter().enumerate() {
        let Some(index) = entry.get("article_index").and_then(Value::as_i64) else {
            parsed.warnings.push(ParseWarning::MissingIndex { position });
            continue;
        };

        let Some(candidate) = usize::try_from(index).ok().and_then(|i| candidates.get(i)) else {
            parsed.warnings.push(ParseWarning::IndexOutOfRange {
                position,
                index,
                count: candidates.len(),
            });
            continue;
        };

        let category = match entry.get("category").and_then(Value::as_str) {
            Some(name) => match Category::from_str(name) {
                Ok(category) => Some(category),
                Err(_) => {
                    parsed.warnings.push(ParseWarning::UnknownCategory {
                        position,
                        category: name.to_string(),
                    });
                    None
                }
            },
            None => None,
        };

        parsed.selections.push(Selection {
            candidate: candidate.clone(),
            relevance_score: entry.get("relevance_score").and_then(Value::as_i64),
            category,
            reason: entry
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    for warning in &parsed.warnings {
        tracing::warn!("Skipped part of model response: {}", warning);
    }

    parsed
}

fn array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate {
                title: Some(format!("Story {}", i)),
                description: None,
                url: format!("https://news.example/{}", i),
                source: None,
                published_at: None,
            })
            .collect()
    }

    #[test]
    fn test_surrounding_prose_is_ignored() {
        let response = r#"Here are my picks: [{"article_index":1,"relevance_score":9,"category":"Global Diplomacy","reason":"r"}] Hope this helps."#;
        let parsed = parse_selections(response, &candidates(3));

        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.selections.len(), 1);
        let selection = &parsed.selections[0];
        assert_eq!(selection.candidate.url, "https://news.example/1");
        assert_eq!(selection.relevance_score, Some(9));
        assert_eq!(selection.category, Some(Category::GlobalDiplomacy));
        assert_eq!(selection.reason.as_deref(), Some("r"));
    }

    #[test]
    fn test_out_of_range_indices_are_dropped() {
        let response = r#"[{"article_index":0},{"article_index":5},{"article_index":-1},{"article_index":2}]"#;
        let parsed = parse_selections(response, &candidates(3));

        let urls: Vec<_> = parsed
            .selections
            .iter()
            .map(|s| s.candidate.url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://news.example/0", "https://news.example/2"]);
        assert_eq!(parsed.warnings.len(), 2);
        assert!(matches!(
            parsed.warnings[0],
            ParseWarning::IndexOutOfRange { position: 1, index: 5, count: 3 }
        ));
    }

    #[test]
    fn test_missing_or_non_integer_index_is_dropped() {
        let response = r#"[{"reason":"no index"},{"article_index":"1"},{"article_index":1}]"#;
        let parsed = parse_selections(response, &candidates(2));

        assert_eq!(parsed.selections.len(), 1);
        assert_eq!(
            parsed.warnings,
            vec![
                ParseWarning::MissingIndex { position: 0 },
                ParseWarning::MissingIndex { position: 1 },
            ]
        );
    }

    #[test]
    fn test_no_array_yields_empty_result() {
        let parsed = parse_selections("I could not find anything relevant.", &candidates(2));
        assert!(parsed.selections.is_empty());
        assert_eq!(parsed.warnings, vec![ParseWarning::NoArray]);
    }

    #[test]
    fn test_malformed_array_yields_empty_result() {
        let parsed = parse_selections(r#"[{"article_index": 0,]"#, &candidates(2));
        assert!(parsed.selections.is_empty());
        assert!(matches!(parsed.warnings[..], [ParseWarning::InvalidJson(_)]));
    }

    #[test]
    fn test_empty_array_is_not_a_warning() {
        let parsed = parse_selections("[]", &candidates(2));
        assert!(parsed.selections.is_empty());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_duplicates_and_order_are_preserved() {
        let response = r#"[{"article_index":2},{"article_index":0},{"article_index":2}]"#;
        let parsed = parse_selections(response, &candidates(3));

        let urls: Vec<_> = parsed
            .selections
            .iter()
            .map(|s| s.candidate.url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://news.example/2",
                "https://news.example/0",
                "https://news.example/2"
            ]
        );
    }

    #[test]
    fn test_unknown_category_keeps_selection() {
        let response = r#"[{"article_index":0,"category":"Sports"}]"#;
        let parsed = parse_selections(response, &candidates(1));

        assert_eq!(parsed.selections.len(), 1);
        assert_eq!(parsed.selections[0].category, None);
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::UnknownCategory {
                position: 0,
                category: "Sports".to_string()
            }]
        );
    }

    #[test]
    fn test_code_fenced_response() {
        let response = "```json\n[{\"article_index\":0,\"category\":\"bilateral relations\"}]\n```";
        let parsed = parse_selections(response, &candidates(1));

        assert_eq!(parsed.selections.len(), 1);
        assert_eq!(
            parsed.selections[0].category,
            Some(Category::BilateralRelations)
        );
    }
}

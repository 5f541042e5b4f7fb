//! Plain-text rendering shared by the tool server and the CLI.

use crate::curation::CurationHistory;
use crate::models::StoredArticle;

const RULE_WIDTH: usize = 60;

/// Numbered article list with everything a reader needs to give feedback.
///
/// Example output:
/// ```text
/// Today's Curated News
/// ============================================================
///
/// 1. India and Japan expand defence ties
///    Source: The Hindu | 2025-01-15 07:00
///    Relevance: 9/10 | Bilateral Relations
///    Why selected: ...
///    URL: https://...
///    Article ID: 3f1c... (use this for feedback)
/// ```
pub fn render_articles(articles: &[StoredArticle]) -> String {
    let mut output = String::from("Today's Curated News\n");
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\n\n");

    for (idx, article) in articles.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", idx + 1, article.title));
        output.push_str(&format!(
            "   Source: {} | {}\n",
            article.source_name.as_deref().unwrap_or("Unknown"),
            article.formatted_date()
        ));
        output.push_str(&format!(
            "   Relevance: {}/10 | {}\n",
            article
                .relevance_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            article.category.map(|c| c.as_str()).unwrap_or("Uncategorized")
        ));
        if let Some(reason) = &article.curation_reason {
            output.push_str(&format!("   Why selected: {}\n", reason));
        }
        output.push_str(&format!("   URL: {}\n", article.url));
        output.push_str(&format!(
            "   Article ID: {} (use this for feedback)\n",
            article.id
        ));
        output.push('\n');
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push_str("\n\n");
    }

    output.push_str("Provide feedback using the news_feedback tool with the article ID\n");
    output
}

/// Totals plus one line per session, most recent first.
pub fn render_history(history: &CurationHistory) -> String {
    let mut output = format!("Curation History (Last {} days)\n\n", history.days);
    output.push_str(&format!(
        "Total articles curated: {}\n",
        history.articles.len()
    ));
    output.push_str(&format!("Curation sessions: {}\n\n", history.sessions.len()));

    for session in &history.sessions {
        output.push_str(&format!(
            "{}: {} articles from {} fetched\n",
            session.session_date, session.articles_curated, session.articles_fetched
        ));
    }
    output
}

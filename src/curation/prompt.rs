//! Rendering the curation request sent to the model.
//!
//! The output is a pure function of its inputs: the same candidates, context
//! and target always render the same text.

use serde::Serialize;

use super::context::PreferenceContext;
use crate::models::{
    ArticleComplexity, Candidate, Category, ContextDepth, CoverageStyle, KnowledgeLevel,
    SourcePerspective, TerminologyStyle,
};

const NO_FEEDBACK: &str = "No feedback yet";

/// Render the full request for one curation run.
pub fn build_curation_prompt(
    candidates: &[Candidate],
    context: &PreferenceContext,
    target_count: usize,
) -> String {
    let prefs = &context.preferences;
    let mut sections = Vec::new();

    sections.push(
        "You are an intelligent news curator specializing in foreign policy and diplomacy. \
         Your job is to pick the articles most worth reading today for one specific reader."
            .to_string(),
    );

    sections.push(format!("USER PREFERENCES:\n{}", pretty(&context.effective)));

    let mut profile = vec![
        format!(
            "- Knowledge level: {}",
            knowledge_instruction(prefs.user_profile.knowledge_level())
        ),
        format!(
            "- Article complexity: {}",
            complexity_instruction(prefs.content_preferences.article_complexity())
        ),
        format!(
            "- Coverage: {}",
            coverage_instruction(prefs.learning_approach.coverage_style())
        ),
    ];
    if prefs.learning_approach.avoid_duplicate_stories() {
        profile.push(
            "- Duplicate stories: HARD CONSTRAINT. Never select two articles about the same \
             event, even when they come from different outlets or take different angles."
                .to_string(),
        );
    }
    profile.push(format!(
        "- Terminology: {}",
        terminology_instruction(prefs.learning_approach.terminology())
    ));
    profile.push(format!(
        "- Context depth: {}",
        context_instruction(prefs.learning_approach.context_depth())
    ));
    profile.push(format!(
        "- Source perspective: {}",
        perspective_instruction(prefs.content_preferences.source_perspective())
    ));
    let regions = prefs.content_preferences.geographic_focus();
    if !regions.is_empty() {
        profile.push(format!(
            "- Geographic focus: prefer stories involving {}.",
            regions.join(", ")
        ));
    }
    let goals = prefs.user_profile.learning_goals();
    if !goals.is_empty() {
        profile.push(format!(
            "- Learning goals: favour articles that help the reader {}.",
            goals.join("; ")
        ));
    }
    sections.push(format!("READER PROFILE:\n{}", profile.join("\n")));

    let liked = if context.liked.is_empty() {
        NO_FEEDBACK.to_string()
    } else {
        pretty(&context.liked)
    };
    let disliked = if context.disliked.is_empty() {
        NO_FEEDBACK.to_string()
    } else {
        pretty(&context.disliked)
    };
    sections.push(format!(
        "LEARNING FROM FEEDBACK:\n\
         Previously liked articles (look for more like these):\n{}\n\n\
         Previously disliked articles (avoid similar content):\n{}",
        liked, disliked
    ));

    sections.push(format!(
        "TASK:\n\
         From the {count} articles below, select exactly {target} that:\n\
         1. Are most relevant to the reader's topics and focus areas\n\
         2. Offer the most insight into foreign policy and diplomacy\n\
         3. Match the reader profile above\n\
         4. Resemble the liked articles and differ from the disliked ones\n\
         5. Rate at least {min} on a 1-10 relevance scale\n\
         6. Do not cover subjects matching the excluded keywords: {excluded}",
        count = candidates.len(),
        target = target_count,
        min = prefs.min_relevance_score,
        excluded = if prefs.exclude_keywords.is_empty() {
            "none".to_string()
        } else {
            prefs.exclude_keywords.join(", ")
        },
    ));

    sections.push(format!(
        "ARTICLES TO ANALYZE:\n{}",
        format_candidates(candidates)
    ));

    let categories = Category::ALL
        .iter()
        .map(|c| format!("'{}'", c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    sections.push(format!(
        "RESPONSE FORMAT:\n\
         Return a JSON array with exactly {target} selections. For each selected article:\n\
         {{\n  \
           \"article_index\": <index from 0 to {last}>,\n  \
           \"relevance_score\": <integer from 1 to 10>,\n  \
           \"category\": \"<one of: {categories}>\",\n  \
           \"reason\": \"<2-3 sentences on why this article is valuable for this reader>\"\n\
         }}\n\n\
         Return ONLY the JSON array, no other text.",
        target = target_count,
        last = candidates.len().saturating_sub(1),
        categories = categories,
    ));

    sections.join("\n\n")
}

/// Numbered listing of candidates, indices starting at 0.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            format!(
                "[{}] Title: {}\nSource: {}\nPublished: {}\nDescription: {}\n---",
                idx,
                c.title.as_deref().unwrap_or(""),
                c.source_name().unwrap_or(""),
                c.published_at.as_deref().unwrap_or(""),
                c.description.as_deref().unwrap_or(""),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn knowledge_instruction(level: KnowledgeLevel) -> &'static str {
    match level {
        KnowledgeLevel::Beginner => {
            "the reader is new to international affairs. Prefer explanatory pieces that \
             introduce the actors, institutions and history involved; skip articles that \
             assume prior familiarity with the story."
        }
        KnowledgeLevel::Intermediate => {
            "the reader follows world news regularly. Prefer articles that explain why an \
             event matters, not just what happened."
        }
        KnowledgeLevel::Advanced => {
            "the reader knows the major actors and recent history. Prefer analysis with \
             original reporting or a clear argument over general summaries."
        }
        KnowledgeLevel::Expert => {
            "the reader is a specialist. Select only in-depth analysis, primary-source \
             reporting or policy detail; never select introductory or explainer material."
        }
    }
}

fn complexity_instruction(complexity: ArticleComplexity) -> &'static str {
    match complexity {
        ArticleComplexity::Accessible => {
            "favour clearly written pieces that a general reader can finish in one sitting."
        }
        ArticleComplexity::Academic => {
            "favour rigorous, detailed pieces such as think-tank analysis or long-form reporting."
        }
        ArticleComplexity::Balanced => {
            "mix approachable reporting with some deeper analysis."
        }
    }
}

fn coverage_instruction(style: CoverageStyle) -> &'static str {
    match style {
        CoverageStyle::DiverseTopics => {
            "maximize topic diversity. Each selected article should cover a different \
             country, region or issue."
        }
        CoverageStyle::DeepFocus => {
            "concentrate on the single most significant story of the day and select articles \
             that examine it from complementary angles."
        }
        CoverageStyle::Mixed => {
            "pick one major story to cover well and use the remaining selections for \
             different topics."
        }
    }
}

fn terminology_instruction(style: TerminologyStyle) -> &'static str {
    match style {
        TerminologyStyle::ExplainInArticle => {
            "prefer articles that define diplomatic and policy terms where they are used."
        }
        TerminologyStyle::Glossary => {
            "specialist terms are fine; mention any that matter in the reason so the reader \
             can look them up."
        }
        TerminologyStyle::Standard => "standard news vocabulary is fine.",
    }
}

fn context_instruction(depth: ContextDepth) -> &'static str {
    match depth {
        ContextDepth::Progressive => {
            "prefer articles that build on stories the reader has already seen, adding one \
             layer of background at a time."
        }
        ContextDepth::Extensive => {
            "prefer articles with substantial historical and political background."
        }
        ContextDepth::Minimal => "background is optional; focus on the news itself.",
        ContextDepth::Brief => "a short paragraph of background is enough.",
    }
}

fn perspective_instruction(perspective: SourcePerspective) -> &'static str {
    match perspective {
        SourcePerspective::International => {
            "prefer international outlets reporting on events from outside the region."
        }
        SourcePerspective::Indian => {
            "prefer Indian outlets and Indian viewpoints on events."
        }
        SourcePerspective::Balanced => {
            "balance Indian and international outlets across the selection."
        }
    }
}

//! Prompt templates for the AI-assisted search.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::context;
use serde::Serialize;

/// One resource as presented to the summarizer
#[derive(Debug, Serialize)]
pub struct SummaryPromptItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Approved review comments, pre-encoded as a JSON array
    pub comments: String,
}

impl SummaryPromptItem {
    pub fn new(id: String, title: String, description: Option<String>, comments: &[String]) -> Self {
        Self {
            id,
            title,
            description: description.filter(|d| !d.trim().is_empty()),
            comments: serde_json::to_string(comments).unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

pub fn render_keywords_prompt(
    query: &str,
    max_keywords: usize,
    json_schema: &str,
) -> Result<String, TemplateError> {
    render_template(
        "search/keywords.jinja",
        context! { query, max_keywords, json_schema },
    )
}

pub fn render_summaries_prompt(
    resources: &[SummaryPromptItem],
    json_schema: &str,
) -> Result<String, TemplateError> {
    render_template(
        "search/summaries.jinja",
        context! { resources, json_schema },
    )
}

//! Prompt rendering with minijinja.
//!
//! Templates live in `templates/prompts/` and are compiled into the binary, so a
//! deployment never depends on the working directory.

use minijinja::{Environment, Value};
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// (name, source) for every bundled template
const TEMPLATES: &[(&str, &str)] = &[
    (
        "search/keywords.jinja",
        include_str!("../../../templates/prompts/search/keywords.jinja"),
    ),
    (
        "search/summaries.jinja",
        include_str!("../../../templates/prompts/search/summaries.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }
    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a bundled template with any serializable context.
///
/// # Example
/// ```ignore
/// let prompt = render_template(
///     "search/keywords.jinja",
///     minijinja::context! { query => "graph theory notes", max_keywords => 3, json_schema => schema },
/// )?;
/// ```
pub fn render_template(template_name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_missing_template() {
        let result = render_template("nonexistent.jinja", context! {});
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_keywords_template_renders_query() {
        let prompt = render_template(
            "search/keywords.jinja",
            context! { query => "discrete math notes", max_keywords => 3, json_schema => "{}" },
        )
        .unwrap();
        assert!(prompt.contains("\"discrete math notes\""));
        assert!(prompt.contains("the 3 most relevant"));
    }

    #[test]
    fn test_summaries_template_lists_every_resource() {
        let prompt = render_template(
            "search/summaries.jinja",
            context! {
                json_schema => "{}",
                resources => vec![
                    context! { id => "r-1", title => "Graphs", description => (), comments => "[\"clear\"]" },
                    context! { id => "r-2", title => "Trees", description => "BST basics", comments => "[]" },
                ],
            },
        )
        .unwrap();
        assert!(prompt.contains("Resource ID: \"r-1\""));
        assert!(prompt.contains("No description provided."));
        assert!(prompt.contains("Resource ID: \"r-2\""));
        assert!(prompt.contains("BST basics"));
        assert!(prompt.contains("[\"clear\"]"));
    }
}

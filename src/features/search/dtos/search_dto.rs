use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::resources::dtos::ResourceResponseDto;
use crate::shared::llm::LlmResponse;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AiSearchRequestDto {
    /// Natural-language question, e.g. "best notes for discrete math"
    #[validate(length(min = 5, max = 255))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiSearchResultDto {
    #[serde(flatten)]
    pub resource: ResourceResponseDto,
    pub reviews_count: i64,
    pub ai_summary: String,
}

fn default_true() -> bool {
    true
}

/// Keywords pulled out of the user's query
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct KeywordExtraction {
    pub keywords: Vec<String>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for KeywordExtraction {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ResourceSummary {
    /// Resource ID exactly as given in the prompt
    pub resource_id: String,
    /// Two or three sentence summary
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ResourceSummaries {
    pub summaries: Vec<ResourceSummary>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for ResourceSummaries {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::llm::parse_with_fallback;

    #[test]
    fn test_query_length_bounds() {
        let short = AiSearchRequestDto {
            query: "math".to_string(),
        };
        assert!(short.validate().is_err());

        let ok = AiSearchRequestDto {
            query: "linear algebra notes".to_string(),
        };
        assert!(ok.validate().is_ok());

        let long = AiSearchRequestDto {
            query: "a".repeat(256),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_summaries_parse_from_fenced_output() {
        let raw = "```json\n{\"summaries\": [{\"resource_id\": \"r-1\", \"summary\": \"Covers graphs.\"}]}\n```";
        let parsed: ResourceSummaries = parse_with_fallback(raw);
        assert!(parsed.is_success());
        assert_eq!(parsed.summaries.len(), 1);
        assert_eq!(parsed.summaries[0].resource_id, "r-1");
    }
}

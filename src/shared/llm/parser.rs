use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// Regex for trailing commas before } or ]
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// Regex for JavaScript string concatenation ("str1" + "str2")
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Extract the JSON object from model output.
///
/// Tries in order:
/// 1. JSON in markdown code block: ```json ... ```
/// 2. Generic markdown code block: ``` ... ```
/// 3. Plain JSON starting with {
/// 4. JSON embedded anywhere in text (first { to last })
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if let Some(after) = text.split("```json").nth(1) {
        return after
            .split("```")
            .next()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "Failed to extract JSON from markdown code block".to_string());
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        // Skip optional language identifier on the same line
        if let Some(newline_offset) = text[block_start..].find('\n') {
            let json_start = block_start + newline_offset + 1;
            if let Some(end_offset) = text[json_start..].find("```") {
                return Ok(text[json_start..json_start + end_offset].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let start = text
        .find('{')
        .ok_or_else(|| "No JSON object found in response".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "Incomplete JSON object in response".to_string())?;

    if start < end {
        Ok(text[start..=end].to_string())
    } else {
        Err("Invalid JSON boundaries in response".to_string())
    }
}

/// Fix trailing commas in JSON (common LLM mistake)
///
/// Example: `{"keywords": ["graph",]}` -> `{"keywords": ["graph"]}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// Merge `"a" + "b"` into `"ab"`
pub fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn apply_quick_fixes(json_str: &str) -> String {
    let fixed = fix_js_string_concatenation(json_str);
    fix_trailing_commas(&fixed)
}

/// Last-resort repair with `llm_json`
fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

/// Parsing pipeline: extract, direct parse, quick fixes, `llm_json` repair
fn try_parse<T>(text: &str) -> Result<T, String>
where
    T: LlmResponse,
{
    let json_str = extract_json_string(text)?;

    tracing::debug!(
        "Extracted JSON (first 500 chars): {}",
        json_str.chars().take(500).collect::<String>()
    );

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed_json = apply_quick_fixes(&json_str);
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed_json) {
        tracing::debug!("JSON parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("JSON parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Failed to parse JSON after all repair attempts. Original: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parse model output, degrading to `T::default()` marked as a fallback.
///
/// ```ignore
/// let keywords = parse_with_fallback::<KeywordExtraction>(&raw);
/// if !keywords.is_success() { /* split the query instead */ }
/// ```
pub fn parse_with_fallback<T>(text: &str) -> T
where
    T: LlmResponse,
{
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("LLM response parsing failed, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
    struct Keywords {
        pub keywords: Vec<String>,

        #[serde(default = "default_true")]
        #[schemars(skip)]
        pub is_llm_success: bool,

        #[serde(skip_serializing_if = "Option::is_none")]
        #[schemars(skip)]
        pub llm_error_message: Option<String>,
    }

    impl LlmResponse for Keywords {
        fn mark_as_fallback(&mut self, error_message: String) {
            self.is_llm_success = false;
            self.llm_error_message = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.is_llm_success
        }
    }

    #[test]
    fn test_extract_json_string_with_json_code_block() {
        let response = "Sure:\n\n```json\n{\"keywords\": [\"graph\"]}\n```\n\nDone.";
        assert_eq!(
            extract_json_string(response).unwrap(),
            r#"{"keywords": ["graph"]}"#
        );
    }

    #[test]
    fn test_extract_json_string_with_generic_code_block() {
        let response = "```\n{\"keywords\": []}\n```";
        assert_eq!(extract_json_string(response).unwrap(), r#"{"keywords": []}"#);
    }

    #[test]
    fn test_extract_json_string_embedded() {
        let response = "Result: {\"keywords\": [\"sql\"]} hope it helps";
        assert_eq!(
            extract_json_string(response).unwrap(),
            r#"{"keywords": ["sql"]}"#
        );
    }

    #[test]
    fn test_extract_json_string_no_json() {
        assert!(extract_json_string("graph, sql, rust").is_err());
    }

    #[test]
    fn test_fix_trailing_commas() {
        assert_eq!(
            fix_trailing_commas(r#"{"keywords": ["a", "b",],}"#),
            r#"{"keywords": ["a", "b"]}"#
        );
    }

    #[test]
    fn test_fix_js_string_concatenation() {
        assert_eq!(
            fix_js_string_concatenation(r#"{"summary": "first half " + "second half"}"#),
            r#"{"summary": "first half second half"}"#
        );
    }

    #[test]
    fn test_parse_with_fallback_valid_json() {
        let result: Keywords = parse_with_fallback(r#"{"keywords": ["linear algebra", "matrix"]}"#);
        assert!(result.is_success());
        assert_eq!(result.keywords, vec!["linear algebra", "matrix"]);
    }

    #[test]
    fn test_parse_with_fallback_repairs_trailing_comma() {
        let result: Keywords = parse_with_fallback("```json\n{\"keywords\": [\"calculus\",]}\n```");
        assert!(result.is_success());
        assert_eq!(result.keywords, vec!["calculus"]);
    }

    #[test]
    fn test_parse_with_fallback_invalid_returns_fallback() {
        let result: Keywords = parse_with_fallback("I could not find any keywords");
        assert!(!result.is_success());
        assert!(result.llm_error_message.is_some());
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn test_json_schema_string_hides_internal_fields() {
        let schema = Keywords::json_schema_string();
        assert!(schema.contains("keywords"));
        assert!(!schema.contains("is_llm_success"));
        assert!(!schema.contains("llm_error_message"));
    }
}

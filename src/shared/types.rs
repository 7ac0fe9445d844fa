use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::MAX_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<i64>,
}

impl Meta {
    pub fn total(total: i64) -> Self {
        Self {
            total,
            page: None,
            per_page: None,
            last_page: None,
        }
    }

    pub fn paginated(total: i64, window: &PageWindow) -> Self {
        let last_page = ((total + window.per_page - 1) / window.per_page).max(1);
        Self {
            total,
            page: Some(window.page),
            per_page: Some(window.per_page),
            last_page: Some(last_page),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Resolved `page`/`per_page` pair for one list request.
///
/// List endpoints take `page` and `per_page` as plain query fields (each
/// endpoint has its own default size) and resolve them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped.
/// Blank terms yield `None` so callers can skip the filter.
pub fn contains_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults_and_clamps() {
        let w = PageWindow::new(None, None, 25);
        assert_eq!(w, PageWindow { page: 1, per_page: 25 });
        assert_eq!(w.offset(), 0);

        let w = PageWindow::new(Some(0), Some(1_000), 25);
        assert_eq!(w.page, 1);
        assert_eq!(w.per_page, MAX_PAGE_SIZE);

        let w = PageWindow::new(Some(3), Some(20), 25);
        assert_eq!(w.offset(), 40);
    }

    #[test]
    fn test_meta_last_page() {
        let w = PageWindow::new(Some(1), Some(20), 20);
        assert_eq!(Meta::paginated(0, &w).last_page, Some(1));
        assert_eq!(Meta::paginated(20, &w).last_page, Some(1));
        assert_eq!(Meta::paginated(21, &w).last_page, Some(2));
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(Some(" algo ")).as_deref(), Some("%algo%"));
        assert_eq!(contains_pattern(Some("100%_x")).as_deref(), Some("%100\\%\\_x%"));
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(None), None);
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::<()>::error(
            Some("nope".to_string()),
            None,
        ))
        .unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "nope"}));
    }
}

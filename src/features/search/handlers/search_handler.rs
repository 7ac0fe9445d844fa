use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::search::dtos::{AiSearchRequestDto, AiSearchResultDto};
use crate::features::search::services::SearchService;
use crate::shared::types::{ApiResponse, Meta};

/// Natural-language search with per-result summaries
#[utoipa::path(
    post,
    path = "/api/ai-search",
    request_body = AiSearchRequestDto,
    responses(
        (status = 200, description = "Search results", body = ApiResponse<Vec<AiSearchResultDto>>),
        (status = 422, description = "Validation error")
    ),
    tag = "search"
)]
pub async fn ai_search(
    State(service): State<Arc<SearchService>>,
    AppJson(dto): AppJson<AiSearchRequestDto>,
) -> Result<Json<ApiResponse<Vec<AiSearchResultDto>>>> {
    dto.validate()?;

    let results = service.search(dto.query.trim()).await?;
    let message = if results.is_empty() {
        "No relevant resources found."
    } else {
        "AI-powered search results retrieved successfully."
    };
    let total = results.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(results),
        Some(message.to_string()),
        Some(Meta::total(total)),
    )))
}

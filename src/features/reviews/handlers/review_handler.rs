use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{MaybeUser, RequireAdmin};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reviews::dtos::{
    AdminListReviewsQuery, CreateReviewDto, ListReviewsQuery, ReviewFilter, ReviewResponseDto,
    UpdateReviewDto,
};
use crate::features::reviews::models::ReviewStatus;
use crate::features::reviews::services::ReviewService;
use crate::shared::constants::REVIEW_PAGE_SIZE;
use crate::shared::types::{ApiResponse, Meta, PageWindow};

/// Reviews of one resource
#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ListReviewsQuery),
    responses(
        (status = 200, description = "Reviews retrieved", body = ApiResponse<Vec<ReviewResponseDto>>),
        (status = 422, description = "Missing or unknown resource_id")
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    MaybeUser(viewer): MaybeUser,
    State(service): State<Arc<ReviewService>>,
    AppQuery(query): AppQuery<ListReviewsQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, REVIEW_PAGE_SIZE);

    // Only admins may look past approved reviews
    let status = match viewer {
        Some(user) if user.is_admin() => query.status.and_then(|s| s.status()),
        _ => Some(ReviewStatus::Approved),
    };
    let filter = ReviewFilter {
        resource_id: Some(query.resource_id),
        status,
        ..Default::default()
    };
    let (reviews, total) = service.list(filter, window).await?;

    Ok(Json(ApiResponse::success(
        Some(reviews),
        Some("Reviews retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// Moderation listing (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/reviews",
    params(AdminListReviewsQuery),
    responses(
        (status = 200, description = "Reviews retrieved", body = ApiResponse<Vec<ReviewResponseDto>>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn admin_list_reviews(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<ReviewService>>,
    AppQuery(query): AppQuery<AdminListReviewsQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, REVIEW_PAGE_SIZE);
    let filter = ReviewFilter {
        resource_id: query.resource_id,
        user_id: query.user_id,
        status: query.status.and_then(|s| s.status()),
        search: query.search,
    };
    let (reviews, total) = service.list(filter, window).await?;

    Ok(Json(ApiResponse::success(
        Some(reviews),
        Some("All reviews retrieved successfully for admin.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// Submit a review; it stays pending until approved
#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review submitted", body = ApiResponse<ReviewResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Resource already reviewed by the caller"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    user: AuthenticatedUser,
    State(service): State<Arc<ReviewService>>,
    AppJson(dto): AppJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponseDto>>)> {
    dto.validate()?;

    let review = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(review),
            Some("Review submitted and is pending approval.".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = ApiResponse<ReviewResponseDto>),
        (status = 404, description = "Review not found or not visible to the caller")
    ),
    tag = "reviews"
)]
pub async fn get_review(
    MaybeUser(viewer): MaybeUser,
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReviewResponseDto>>> {
    let review = service.get(viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(
        Some(review),
        Some("Review retrieved successfully.".to_string()),
        None,
    )))
}

/// Edit a review (owner), or moderate it (admin)
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Review updated", body = ApiResponse<ReviewResponseDto>),
        (status = 403, description = "Not the owner, or status change by a non-admin"),
        (status = 404, description = "Review not found"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn update_review(
    user: AuthenticatedUser,
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReviewDto>,
) -> Result<Json<ApiResponse<ReviewResponseDto>>> {
    dto.validate()?;

    let review = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(review),
        Some("Review updated successfully.".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn delete_review(
    user: AuthenticatedUser,
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Review deleted successfully.".to_string()),
        None,
    )))
}

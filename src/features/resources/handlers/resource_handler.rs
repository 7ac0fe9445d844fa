use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::resources::dtos::{
    CreateResourceDto, CreateResourceForm, ListResourcesQuery, MyResourcesQuery,
    ResourceFilter, ResourceResponseDto, UpdateResourceDto, UpdateResourceForm,
};
use crate::features::resources::services::ResourceService;
use crate::shared::constants::{MAX_RESOURCE_FILE_SIZE, RESOURCE_PAGE_SIZE};
use crate::shared::types::{ApiResponse, Meta, PageWindow};
use crate::shared::upload::MultipartForm;

/// List resources, newest first
#[utoipa::path(
    get,
    path = "/api/resources",
    params(ListResourcesQuery),
    responses(
        (status = 200, description = "Resources retrieved", body = ApiResponse<Vec<ResourceResponseDto>>),
    ),
    tag = "resources"
)]
pub async fn list_resources(
    State(service): State<Arc<ResourceService>>,
    AppQuery(query): AppQuery<ListResourcesQuery>,
) -> Result<Json<ApiResponse<Vec<ResourceResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, RESOURCE_PAGE_SIZE);
    let filter = ResourceFilter {
        category_id: query.category_id,
        user_id: query.user_id,
        search: query.search,
    };
    let (resources, total) = service.list(filter, window).await?;

    Ok(Json(ApiResponse::success(
        Some(resources),
        Some("Resources retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// The caller's own resources
#[utoipa::path(
    get,
    path = "/api/my-resources",
    params(MyResourcesQuery),
    responses(
        (status = 200, description = "Resources retrieved", body = ApiResponse<Vec<ResourceResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn my_resources(
    user: AuthenticatedUser,
    State(service): State<Arc<ResourceService>>,
    AppQuery(query): AppQuery<MyResourcesQuery>,
) -> Result<Json<ApiResponse<Vec<ResourceResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, RESOURCE_PAGE_SIZE);
    let filter = ResourceFilter {
        category_id: query.category_id,
        user_id: Some(user.user_id),
        search: query.search,
    };
    let (resources, total) = service.list(filter, window).await?;

    Ok(Json(ApiResponse::success(
        Some(resources),
        Some("Your resources retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// Upload a resource
#[utoipa::path(
    post,
    path = "/api/resources",
    request_body(content = CreateResourceForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Resource created", body = ApiResponse<ResourceResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Validation error or unknown category")
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn create_resource(
    user: AuthenticatedUser,
    State(service): State<Arc<ResourceService>>,
    mut form: MultipartForm,
) -> Result<(StatusCode, Json<ApiResponse<ResourceResponseDto>>)> {
    let dto = CreateResourceDto::from_form(&form)?;
    let file = form.take_sized_file("file", MAX_RESOURCE_FILE_SIZE)?;

    let resource = service.create(&user, dto, file).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(resource),
            Some("Resource created successfully.".to_string()),
            None,
        )),
    ))
}

/// Get a resource; counts as a view
#[utoipa::path(
    get,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource found", body = ApiResponse<ResourceResponseDto>),
        (status = 404, description = "Resource not found")
    ),
    tag = "resources"
)]
pub async fn get_resource(
    State(service): State<Arc<ResourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResourceResponseDto>>> {
    let resource = service.show(id).await?;
    Ok(Json(ApiResponse::success(
        Some(resource),
        Some("Resource retrieved successfully.".to_string()),
        None,
    )))
}

/// Update a resource (owner or admin)
#[utoipa::path(
    put,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    request_body(content = UpdateResourceForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resource updated", body = ApiResponse<ResourceResponseDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Resource not found"),
        (status = 422, description = "Validation error or unknown category")
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn update_resource(
    user: AuthenticatedUser,
    State(service): State<Arc<ResourceService>>,
    Path(id): Path<Uuid>,
    mut form: MultipartForm,
) -> Result<Json<ApiResponse<ResourceResponseDto>>> {
    let dto = UpdateResourceDto::from_form(&form)?;
    let file = form.take_sized_file("file", MAX_RESOURCE_FILE_SIZE)?;

    let resource = service.update(&user, id, dto, file).await?;
    Ok(Json(ApiResponse::success(
        Some(resource),
        Some("Resource updated successfully.".to_string()),
        None,
    )))
}

/// Delete a resource and its file (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Resource not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resources"
)]
pub async fn delete_resource(
    user: AuthenticatedUser,
    State(service): State<Arc<ResourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Resource deleted successfully.".to_string()),
        None,
    )))
}

/// Download the stored file
#[utoipa::path(
    get,
    path = "/api/resources/{id}/download",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Resource or file not found")
    ),
    tag = "resources"
)]
pub async fn download_resource(
    State(service): State<Arc<ResourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let download = service.download(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.file_name),
            ),
        ],
        download.bytes,
    )
        .into_response())
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::groups::dtos::{
    CreateGroupDto, CreateGroupForm, GroupResponseDto, ListGroupsQuery, MyGroupsQuery,
    UpdateGroupDto, UpdateGroupForm,
};
use crate::features::groups::services::GroupService;
use crate::shared::constants::{GROUP_PAGE_SIZE, MAX_IMAGE_SIZE};
use crate::shared::types::{ApiResponse, Meta, PageWindow};
use crate::shared::upload::MultipartForm;

/// List groups, newest first
#[utoipa::path(
    get,
    path = "/api/groups",
    params(ListGroupsQuery),
    responses(
        (status = 200, description = "Groups retrieved", body = ApiResponse<Vec<GroupResponseDto>>),
    ),
    tag = "groups"
)]
pub async fn list_groups(
    State(service): State<Arc<GroupService>>,
    AppQuery(query): AppQuery<ListGroupsQuery>,
) -> Result<Json<ApiResponse<Vec<GroupResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, GROUP_PAGE_SIZE);
    let (groups, total) = service.list(query.search.as_deref(), None, window).await?;

    Ok(Json(ApiResponse::success(
        Some(groups),
        Some("Groups retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// Groups owned by the caller
#[utoipa::path(
    get,
    path = "/api/my-groups",
    params(MyGroupsQuery),
    responses(
        (status = 200, description = "Groups retrieved", body = ApiResponse<Vec<GroupResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn my_groups(
    user: AuthenticatedUser,
    State(service): State<Arc<GroupService>>,
    AppQuery(query): AppQuery<MyGroupsQuery>,
) -> Result<Json<ApiResponse<Vec<GroupResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, GROUP_PAGE_SIZE);
    let (groups, total) = service.list(None, Some(user.user_id), window).await?;

    Ok(Json(ApiResponse::success(
        Some(groups),
        Some("Your groups retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body(content = CreateGroupForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Group created", body = ApiResponse<GroupResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Validation error or title taken")
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn create_group(
    user: AuthenticatedUser,
    State(service): State<Arc<GroupService>>,
    mut form: MultipartForm,
) -> Result<(StatusCode, Json<ApiResponse<GroupResponseDto>>)> {
    let dto = CreateGroupDto::from_form(&form)?;
    let image = form.take_image("image", MAX_IMAGE_SIZE)?;

    let group = service.create(&user, dto, image).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(group),
            Some("Group created successfully.".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = ApiResponse<GroupResponseDto>),
        (status = 404, description = "Group not found")
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(service): State<Arc<GroupService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GroupResponseDto>>> {
    let group = service.get(id).await?;
    Ok(Json(ApiResponse::success(
        Some(group),
        Some("Group retrieved successfully.".to_string()),
        None,
    )))
}

/// Update a group (owner or admin)
#[utoipa::path(
    put,
    path = "/api/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body(content = UpdateGroupForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Group updated", body = ApiResponse<GroupResponseDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Group not found"),
        (status = 422, description = "Validation error or title taken")
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn update_group(
    user: AuthenticatedUser,
    State(service): State<Arc<GroupService>>,
    Path(id): Path<Uuid>,
    mut form: MultipartForm,
) -> Result<Json<ApiResponse<GroupResponseDto>>> {
    let dto = UpdateGroupDto::from_form(&form)?;
    let image = form.take_image("image", MAX_IMAGE_SIZE)?;

    let group = service.update(&user, id, dto, image).await?;
    Ok(Json(ApiResponse::success(
        Some(group),
        Some("Group updated successfully.".to_string()),
        None,
    )))
}

/// Delete a group with its messages (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn delete_group(
    user: AuthenticatedUser,
    State(service): State<Arc<GroupService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Group deleted successfully.".to_string()),
        None,
    )))
}

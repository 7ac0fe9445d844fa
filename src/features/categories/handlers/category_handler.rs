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
use crate::features::auth::policy::{self, Action, Relation};
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryFlatDto, CategoryTreeDto,
    CreateCategoryDto, CreateCategoryForm, FlatCategoriesQuery, ListCategoriesQuery,
    UpdateCategoryDto, UpdateCategoryForm,
};
use crate::features::categories::services::CategoryService;
use crate::shared::constants::{CATEGORY_PAGE_SIZE, MAX_IMAGE_SIZE};
use crate::shared::types::{ApiResponse, Meta, PageWindow};
use crate::shared::upload::MultipartForm;

/// List root categories with their subtrees
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "Root categories with nested children", body = ApiResponse<Vec<CategoryTreeDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, CATEGORY_PAGE_SIZE);
    let (tree, total) = service.list_tree(query.search.as_deref(), window).await?;

    Ok(Json(ApiResponse::success(
        Some(tree),
        Some("Categories retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

/// Every category as a flat list ordered by name
#[utoipa::path(
    get,
    path = "/api/categories-all-flat",
    params(FlatCategoriesQuery),
    responses(
        (status = 200, description = "Flat category list", body = ApiResponse<Vec<CategoryFlatDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories_flat(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<FlatCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryFlatDto>>>> {
    let categories = service.list_flat(query.search.as_deref()).await?;
    Ok(Json(ApiResponse::success(Some(categories), None, None)))
}

/// Get a category with its descendants, parent and sample resources
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryDetailDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryDetailDto>>> {
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body(content = CreateCategoryForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryTreeDto>),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Duplicate name or unknown parent")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category(
    _user: AuthenticatedUser,
    State(service): State<Arc<CategoryService>>,
    mut form: MultipartForm,
) -> Result<(StatusCode, Json<ApiResponse<CategoryTreeDto>>)> {
    let dto = CreateCategoryDto::from_form(&form)?;
    let image = form.take_image("image", MAX_IMAGE_SIZE)?;

    let category = service.create(dto, image).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created successfully.".to_string()),
            None,
        )),
    ))
}

/// Rename, move or change the image of a category (admin only)
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body(content = UpdateCategoryForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Category updated with its subtree", body = ApiResponse<CategoryTreeDto>),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Duplicate name, invalid parent or cycle")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category(
    user: AuthenticatedUser,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    mut form: MultipartForm,
) -> Result<Json<ApiResponse<CategoryTreeDto>>> {
    policy::authorize(&user, Action::UpdateCategory, Relation::Other)?;

    let dto = UpdateCategoryDto::from_form(&form)?;
    let image = form.take_image("image", MAX_IMAGE_SIZE)?;

    let category = service.update(id, dto, image).await?;

    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated successfully.".to_string()),
        None,
    )))
}

/// Delete a category; its children are moved to its parent (admin only)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    user: AuthenticatedUser,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    policy::authorize(&user, Action::DeleteCategory, Relation::Other)?;

    service.delete(id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Category deleted successfully.".to_string()),
        None,
    )))
}

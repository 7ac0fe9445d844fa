use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{
    ChangePasswordDto, DeleteAccountDto, UpdateAccountDto, UpdateAccountForm, UserResponseDto,
};
use crate::features::users::services::UserService;
use crate::shared::constants::MAX_IMAGE_SIZE;
use crate::shared::types::ApiResponse;
use crate::shared::upload::MultipartForm;

/// The caller's own account
#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Account retrieved", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "account"
)]
pub async fn get_account(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let account = service.get(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(account), None, None)))
}

/// Update profile fields and picture
#[utoipa::path(
    put,
    path = "/api/account",
    request_body(content = UpdateAccountForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Validation error or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "account"
)]
pub async fn update_account(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    mut form: MultipartForm,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let dto = UpdateAccountDto::from_form(&form)?;
    let image = form.take_image("profile_image", MAX_IMAGE_SIZE)?;

    let account = service.update_account(user.user_id, dto, image).await?;
    Ok(Json(ApiResponse::success(
        Some(account),
        Some("Profile updated successfully.".to_string()),
        None,
    )))
}

#[utoipa::path(
    put,
    path = "/api/account/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Wrong current password or invalid new password")
    ),
    security(("bearer_auth" = [])),
    tag = "account"
)]
pub async fn change_password(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()?;

    service.change_password(user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Password updated successfully.".to_string()),
        None,
    )))
}

/// Delete the caller's account and everything it owns
#[utoipa::path(
    delete,
    path = "/api/account",
    request_body = DeleteAccountDto,
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Wrong password")
    ),
    security(("bearer_auth" = [])),
    tag = "account"
)]
pub async fn delete_account(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<DeleteAccountDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()?;

    service.delete_account(user.user_id, dto.password).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Account deleted successfully.".to_string()),
        None,
    )))
}

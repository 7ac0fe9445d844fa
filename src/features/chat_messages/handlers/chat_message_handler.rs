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
use crate::features::auth::model::AuthenticatedUser;
use crate::features::chat_messages::dtos::{
    ChatMessageResponseDto, CreateChatMessageDto, ListChatMessagesQuery, UpdateChatMessageDto,
};
use crate::features::chat_messages::services::ChatMessageService;
use crate::shared::constants::CHAT_MESSAGE_PAGE_SIZE;
use crate::shared::types::{ApiResponse, Meta, PageWindow};

/// Messages of one group, newest first
#[utoipa::path(
    get,
    path = "/api/chat-messages",
    params(ListChatMessagesQuery),
    responses(
        (status = 200, description = "Messages retrieved", body = ApiResponse<Vec<ChatMessageResponseDto>>),
        (status = 422, description = "Missing or unknown group_id")
    ),
    tag = "chat-messages"
)]
pub async fn list_chat_messages(
    State(service): State<Arc<ChatMessageService>>,
    AppQuery(query): AppQuery<ListChatMessagesQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessageResponseDto>>>> {
    let window = PageWindow::new(query.page, query.per_page, CHAT_MESSAGE_PAGE_SIZE);
    let (messages, total) = service.list(query.group_id, window).await?;

    Ok(Json(ApiResponse::success(
        Some(messages),
        Some("Messages retrieved successfully.".to_string()),
        Some(Meta::paginated(total, &window)),
    )))
}

#[utoipa::path(
    post,
    path = "/api/chat-messages",
    request_body = CreateChatMessageDto,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<ChatMessageResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "chat-messages"
)]
pub async fn create_chat_message(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatMessageService>>,
    AppJson(dto): AppJson<CreateChatMessageDto>,
) -> Result<(StatusCode, Json<ApiResponse<ChatMessageResponseDto>>)> {
    dto.validate()?;

    let message = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(message),
            Some("Message sent successfully.".to_string()),
            None,
        )),
    ))
}

/// Edit a message (author only)
#[utoipa::path(
    put,
    path = "/api/chat-messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    request_body = UpdateChatMessageDto,
    responses(
        (status = 200, description = "Message updated", body = ApiResponse<ChatMessageResponseDto>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Message not found"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "chat-messages"
)]
pub async fn update_chat_message(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatMessageService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateChatMessageDto>,
) -> Result<Json<ApiResponse<ChatMessageResponseDto>>> {
    dto.validate()?;

    let message = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(message),
        Some("Message updated successfully.".to_string()),
        None,
    )))
}

/// Delete a message (author, group owner or admin)
#[utoipa::path(
    delete,
    path = "/api/chat-messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message deleted"),
        (status = 403, description = "Not allowed to delete this message"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "chat-messages"
)]
pub async fn delete_chat_message(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatMessageService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Message deleted successfully.".to_string()),
        None,
    )))
}

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Action, Relation};
use crate::features::chat_messages::dtos::{
    ChatAuthorDto, ChatMessageResponseDto, ChatReplyAuthorDto, ChatReplyToDto, ChatResourceDto,
    CreateChatMessageDto, UpdateChatMessageDto,
};
use crate::features::chat_messages::models::ChatMessage;
use crate::modules::storage::ObjectStore;
use crate::shared::types::PageWindow;

#[derive(sqlx::FromRow)]
struct MessageRow {
    #[sqlx(flatten)]
    message: ChatMessage,
    author_name: String,
    author_profile_image: Option<String>,
    reply_message: Option<String>,
    reply_user_id: Option<Uuid>,
    reply_user_name: Option<String>,
    resource_title: Option<String>,
    resource_format: Option<String>,
    replies_count: i64,
}

const ROW_SELECT: &str = r#"
    u.name AS author_name,
    u.profile_image AS author_profile_image,
    p.message AS reply_message,
    p.user_id AS reply_user_id,
    pu.name AS reply_user_name,
    r.title AS resource_title,
    r.format AS resource_format,
    (SELECT COUNT(*) FROM chat_messages c WHERE c.reply_to_id = m.id) AS replies_count
    FROM chat_messages m
    JOIN users u ON u.id = m.user_id
    LEFT JOIN chat_messages p ON p.id = m.reply_to_id
    LEFT JOIN users pu ON pu.id = p.user_id
    LEFT JOIN resources r ON r.id = m.resource_id
"#;

#[derive(sqlx::FromRow)]
struct Ownership {
    user_id: Uuid,
    group_owner_id: Uuid,
}

fn message_not_found() -> AppError {
    AppError::NotFound("Message not found.".to_string())
}

/// Service for group chat messages
pub struct ChatMessageService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl ChatMessageService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    fn to_dto(&self, row: MessageRow) -> ChatMessageResponseDto {
        let m = row.message;

        let reply_to = match (m.reply_to_id, row.reply_message, row.reply_user_id, row.reply_user_name) {
            (Some(id), Some(message), Some(user_id), Some(name)) => Some(ChatReplyToDto {
                id,
                message,
                user: ChatReplyAuthorDto { id: user_id, name },
            }),
            _ => None,
        };
        let resource = match (m.resource_id, row.resource_title) {
            (Some(id), Some(title)) => Some(ChatResourceDto {
                id,
                title,
                format: row.resource_format,
            }),
            _ => None,
        };

        ChatMessageResponseDto {
            id: m.id,
            user_id: m.user_id,
            group_id: m.group_id,
            message: m.message,
            reply_to_id: m.reply_to_id,
            resource_id: m.resource_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            user: ChatAuthorDto {
                id: m.user_id,
                name: row.author_name,
                profile_image_url: row
                    .author_profile_image
                    .as_deref()
                    .map(|key| self.storage.url(key)),
            },
            reply_to,
            replies_count: row.replies_count,
            resource,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<ChatMessageResponseDto> {
        sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {}, {} WHERE m.id = $1",
            ChatMessage::COLUMNS,
            ROW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| self.to_dto(row))
        .ok_or_else(message_not_found)
    }

    async fn ensure_exists(&self, table: &str, id: Uuid, field: &str) -> Result<()> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            table
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(AppError::Validation(format!(
                "{}: The selected {} is invalid.",
                field,
                field.replace('_', " ")
            )));
        }
        Ok(())
    }

    /// Newest first
    pub async fn list(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<(Vec<ChatMessageResponseDto>, i64)> {
        self.ensure_exists("groups", group_id, "group_id").await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {}, {}
            WHERE m.group_id = $1
            ORDER BY m.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            ChatMessage::COLUMNS,
            ROW_SELECT
        ))
        .bind(group_id)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|row| self.to_dto(row)).collect(), total))
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        dto: CreateChatMessageDto,
    ) -> Result<ChatMessageResponseDto> {
        self.ensure_exists("groups", dto.group_id, "group_id").await?;

        if let Some(reply_to_id) = dto.reply_to_id {
            let parent_group: Option<Uuid> =
                sqlx::query_scalar("SELECT group_id FROM chat_messages WHERE id = $1")
                    .bind(reply_to_id)
                    .fetch_optional(&self.pool)
                    .await?;
            match parent_group {
                None => {
                    return Err(AppError::Validation(
                        "reply_to_id: The selected reply to id is invalid.".to_string(),
                    ))
                }
                Some(group_id) if group_id != dto.group_id => {
                    return Err(AppError::Validation(
                        "reply_to_id: The replied message belongs to another group.".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        if let Some(resource_id) = dto.resource_id {
            self.ensure_exists("resources", resource_id, "resource_id").await?;
        }

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, user_id, group_id, message, reply_to_id, resource_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(user.user_id)
        .bind(dto.group_id)
        .bind(&dto.message)
        .bind(dto.reply_to_id)
        .bind(dto.resource_id)
        .execute(&self.pool)
        .await?;

        info!(message_id = %id, group_id = %dto.group_id, "Chat message sent");
        self.fetch(id).await
    }

    async fn ownership(&self, id: Uuid) -> Result<Ownership> {
        sqlx::query_as::<_, Ownership>(
            r#"
            SELECT m.user_id, g.owner_id AS group_owner_id
            FROM chat_messages m
            JOIN groups g ON g.id = m.group_id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(message_not_found)
    }

    /// Authors only; admins cannot rewrite other people's words
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateChatMessageDto,
    ) -> Result<ChatMessageResponseDto> {
        let owner = self.ownership(id).await?;
        policy::authorize(
            user,
            Action::EditChatMessage,
            Relation::to_message(user, owner.user_id, owner.group_owner_id),
        )?;

        if let Some(Some(resource_id)) = dto.resource_id {
            self.ensure_exists("resources", resource_id, "resource_id").await?;
        }

        sqlx::query(
            r#"
            UPDATE chat_messages
            SET message = $1,
                resource_id = CASE WHEN $2 THEN $3 ELSE resource_id END,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&dto.message)
        .bind(dto.resource_id.is_some())
        .bind(dto.resource_id.flatten())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.fetch(id).await
    }

    /// Author, group owner or admin
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let owner = self.ownership(id).await?;
        policy::authorize(
            user,
            Action::DeleteChatMessage,
            Relation::to_message(user, owner.user_id, owner.group_owner_id),
        )?;

        sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(message_id = %id, user_id = %user.user_id, "Chat message deleted");
        Ok(())
    }
}

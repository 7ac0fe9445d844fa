use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::shared::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatAuthorDto {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReplyAuthorDto {
    pub id: Uuid,
    pub name: String,
}

/// The message being replied to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReplyToDto {
    pub id: Uuid,
    pub message: String,
    pub user: ChatReplyAuthorDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResourceDto {
    pub id: Uuid,
    pub title: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub message: String,
    pub reply_to_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ChatAuthorDto,
    pub reply_to: Option<ChatReplyToDto>,
    pub replies_count: i64,
    pub resource: Option<ChatResourceDto>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListChatMessagesQuery {
    pub group_id: Uuid,
    pub page: Option<i64>,
    /// Default 50, max 100
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateChatMessageDto {
    pub group_id: Uuid,

    #[validate(length(min = 1, max = 5000), custom(function = "not_blank"))]
    pub message: String,

    pub reply_to_id: Option<Uuid>,

    pub resource_id: Option<Uuid>,
}

/// Present-but-null and absent are different for `resource_id`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateChatMessageDto {
    #[validate(length(min = 1, max = 5000), custom(function = "not_blank"))]
    pub message: String,

    /// Omit to keep the link, send `null` to remove it
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Uuid>)]
    pub resource_id: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_distinguishes_null_and_absent_resource() {
        let dto: UpdateChatMessageDto =
            serde_json::from_value(json!({"message": "edited"})).unwrap();
        assert_eq!(dto.resource_id, None);

        let dto: UpdateChatMessageDto =
            serde_json::from_value(json!({"message": "edited", "resource_id": null})).unwrap();
        assert_eq!(dto.resource_id, Some(None));

        let id = Uuid::now_v7();
        let dto: UpdateChatMessageDto =
            serde_json::from_value(json!({"message": "edited", "resource_id": id})).unwrap();
        assert_eq!(dto.resource_id, Some(Some(id)));
    }

    #[test]
    fn test_message_bounds() {
        let dto = CreateChatMessageDto {
            group_id: Uuid::now_v7(),
            message: "  ".to_string(),
            reply_to_id: None,
            resource_id: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateChatMessageDto {
            message: "x".repeat(5001),
            ..dto
        };
        assert!(dto.validate().is_err());
    }
}

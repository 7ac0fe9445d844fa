use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::features::groups::models::Group;
use crate::modules::storage::ObjectStore;
use crate::shared::upload::MultipartForm;
use crate::shared::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupOwnerDto {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: GroupOwnerDto,
    pub messages_count: i64,
}

impl GroupResponseDto {
    pub fn from_parts(
        g: &Group,
        owner: GroupOwnerDto,
        messages_count: i64,
        storage: &dyn ObjectStore,
    ) -> Self {
        Self {
            id: g.id,
            title: g.title.clone(),
            description: g.description.clone(),
            image_url: g.image_path.as_deref().map(|key| storage.url(key)),
            owner_id: g.owner_id,
            created_at: g.created_at,
            updated_at: g.updated_at,
            owner,
            messages_count,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListGroupsQuery {
    /// Substring of the title
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MyGroupsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Multipart body for creating a group
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateGroupForm {
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Multipart body for updating a group
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateGroupForm {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    pub clear_image: Option<bool>,
}

#[derive(Debug, Validate)]
pub struct CreateGroupDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Validate)]
pub struct UpdateGroupDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    /// `Some(None)` clears the description
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,
    pub clear_image: bool,
}

impl CreateGroupDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            title: form.text("title").unwrap_or_default().trim().to_string(),
            description: form.non_empty_text("description").map(|d| d.trim().to_string()),
        };
        dto.validate()?;
        Ok(dto)
    }
}

impl UpdateGroupDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            title: form.text("title").map(|t| t.trim().to_string()),
            description: form
                .text("description")
                .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
            clear_image: form.flag("clear_image"),
        };
        dto.validate()?;
        Ok(dto)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::resources::models::{Resource, ResourceStatus};
use crate::modules::storage::ObjectStore;
use crate::shared::upload::{parse_uuid_list, MultipartForm, UploadedFile};
use crate::shared::validation::{not_blank, FORMAT_REGEX};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceOwnerDto {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ResourceCategoryDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub format: Option<String>,
    pub status: ResourceStatus,
    pub view_count: i64,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ResourceOwnerDto,
    pub categories: Vec<ResourceCategoryDto>,
}

impl ResourceResponseDto {
    pub fn from_parts(
        r: &Resource,
        user: ResourceOwnerDto,
        categories: Vec<ResourceCategoryDto>,
        storage: &dyn ObjectStore,
    ) -> Self {
        Self {
            id: r.id,
            title: r.title.clone(),
            description: r.description.clone(),
            file_url: r.file_path.as_deref().map(|key| storage.url(key)),
            format: r.format.clone(),
            status: r.status,
            view_count: r.view_count,
            download_count: r.download_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user,
            categories,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListResourcesQuery {
    pub category_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Substring of title or description
    pub search: Option<String>,
    pub page: Option<i64>,
    /// Default 15, max 100
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MyResourcesQuery {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Filters shared by the public and the caller-scoped listings
#[derive(Debug, Default)]
pub struct ResourceFilter {
    pub category_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub search: Option<String>,
}

// =============================================================================
// WRITE INPUTS
// =============================================================================

/// Multipart body for uploading a resource
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateResourceForm {
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
    pub status: Option<ResourceStatus>,
    #[schema(rename = "category_ids[]")]
    pub category_ids: Option<Vec<Uuid>>,
}

/// Multipart body for updating a resource. Sending `category_ids` (even
/// empty) replaces the category set; omitting it keeps the set.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateResourceForm {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
    pub clear_file: Option<bool>,
    pub status: Option<ResourceStatus>,
    #[schema(rename = "category_ids[]")]
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Validate)]
pub struct CreateResourceDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub status: ResourceStatus,
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Validate)]
pub struct UpdateResourceDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    /// `Some(None)` clears the description
    #[validate(length(max = 5000))]
    pub description: Option<Option<String>>,
    pub status: Option<ResourceStatus>,
    /// `None` leaves the category links alone
    pub category_ids: Option<Vec<Uuid>>,
    pub clear_file: bool,
}

fn parse_status(raw: &str) -> Result<ResourceStatus> {
    raw.parse::<ResourceStatus>()
        .map_err(|_| AppError::Validation("status: must be one of active, inactive".to_string()))
}

fn category_ids(form: &MultipartForm) -> Result<Vec<Uuid>> {
    let mut ids = parse_uuid_list("category_ids", &form.texts("category_ids"))?;
    ids.sort();
    ids.dedup();
    Ok(ids)
}

impl CreateResourceDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            title: form.text("title").unwrap_or_default().trim().to_string(),
            description: form.non_empty_text("description").map(|d| d.trim().to_string()),
            status: match form.non_empty_text("status") {
                Some(raw) => parse_status(&raw)?,
                None => ResourceStatus::default(),
            },
            category_ids: category_ids(form)?,
        };
        dto.validate()?;
        Ok(dto)
    }
}

impl UpdateResourceDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            title: form.text("title").map(|t| t.trim().to_string()),
            description: form
                .text("description")
                .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
            status: form
                .non_empty_text("status")
                .map(|raw| parse_status(&raw))
                .transpose()?,
            category_ids: if form.has("category_ids") {
                Some(category_ids(form)?)
            } else {
                None
            },
            clear_file: form.flag("clear_file"),
        };
        dto.validate()?;
        Ok(dto)
    }
}

/// Extension recorded as the resource format, if it looks like one
pub fn file_format(file: &UploadedFile) -> Option<String> {
    file.extension().filter(|ext| FORMAT_REGEX.is_match(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            bytes: vec![1, 2, 3],
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
        }
    }

    #[test]
    fn test_create_defaults_to_active_without_categories() {
        let form = MultipartForm::from_parts(&[("title", " Graph Theory ")], vec![]);
        let dto = CreateResourceDto::from_form(&form).unwrap();
        assert_eq!(dto.title, "Graph Theory");
        assert_eq!(dto.status, ResourceStatus::Active);
        assert!(dto.category_ids.is_empty());
        assert_eq!(dto.description, None);
    }

    #[test]
    fn test_create_rejects_unknown_status_and_bad_ids() {
        let form = MultipartForm::from_parts(&[("title", "T"), ("status", "archived")], vec![]);
        assert!(CreateResourceDto::from_form(&form).is_err());

        let form = MultipartForm::from_parts(&[("title", "T"), ("category_ids", "x")], vec![]);
        assert!(CreateResourceDto::from_form(&form).is_err());
    }

    #[test]
    fn test_create_rejects_long_title() {
        let title = "a".repeat(256);
        let form = MultipartForm::from_parts(&[("title", &title)], vec![]);
        assert!(matches!(
            CreateResourceDto::from_form(&form),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_deduplicates_categories() {
        let id = Uuid::now_v7();
        let form = MultipartForm::from_parts(
            &[
                ("title", "T"),
                ("category_ids", &id.to_string()),
                ("category_ids", &id.to_string()),
            ],
            vec![],
        );
        assert_eq!(CreateResourceDto::from_form(&form).unwrap().category_ids, vec![id]);
    }

    #[test]
    fn test_update_tracks_category_presence() {
        let form = MultipartForm::from_parts(&[("title", "New")], vec![]);
        assert_eq!(UpdateResourceDto::from_form(&form).unwrap().category_ids, None);

        let form = MultipartForm::from_parts(&[("category_ids", "")], vec![]);
        assert_eq!(
            UpdateResourceDto::from_form(&form).unwrap().category_ids,
            Some(vec![])
        );
    }

    #[test]
    fn test_update_empty_description_clears_it() {
        let form = MultipartForm::from_parts(&[("description", "  ")], vec![]);
        assert_eq!(
            UpdateResourceDto::from_form(&form).unwrap().description,
            Some(None)
        );
    }

    #[test]
    fn test_file_format() {
        assert_eq!(file_format(&upload("notes.PDF")).as_deref(), Some("pdf"));
        assert_eq!(file_format(&upload("noext")), None);
    }
}

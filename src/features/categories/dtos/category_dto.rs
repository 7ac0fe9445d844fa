use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::Category;
use crate::modules::storage::ObjectStore;
use crate::shared::upload::MultipartForm;
use crate::shared::validation::not_blank;

/// Response DTO for a single category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponseDto {
    pub fn from_model(c: &Category, storage: &dyn ObjectStore) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            parent_id: c.parent_id,
            image_url: c.image_path.as_deref().map(|key| storage.url(key)),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// A category with its whole subtree
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    pub fn from_node(c: &Category, children: Vec<Self>, storage: &dyn ObjectStore) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            parent_id: c.parent_id,
            image_url: c.image_path.as_deref().map(|key| storage.url(key)),
            children,
        }
    }
}

/// Flat projection used by pickers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryFlatDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl From<&Category> for CategoryFlatDto {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            parent_id: c.parent_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CategoryParentDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResourceOwnerDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResourceDto {
    pub id: Uuid,
    pub title: String,
    pub user: CategoryResourceOwnerDto,
}

/// Category detail: subtree, parent and a sample of its resources
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetailDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent: Option<CategoryParentDto>,
    pub children: Vec<CategoryTreeDto>,
    pub resources: Vec<CategoryResourceDto>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// Case-insensitive substring matched against root names
    pub search: Option<String>,
    pub page: Option<i64>,
    /// Roots per page (default 25, max 100)
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FlatCategoriesQuery {
    pub search: Option<String>,
}

// =============================================================================
// WRITE INPUTS
// =============================================================================

/// Multipart body for creating a category
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateCategoryForm {
    pub name: String,
    pub parent_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Multipart body for updating a category. Absent fields are left unchanged;
/// an empty `parent_id` promotes the category to a root.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateCategoryForm {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    pub clear_image: Option<bool>,
}

#[derive(Debug, Validate)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Validate)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// `None` leaves the parent alone, `Some(None)` promotes to root
    pub parent_id: Option<Option<Uuid>>,
    pub clear_image: bool,
}

fn parse_parent(raw: &str) -> Result<Option<Uuid>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| AppError::Validation("parent_id: must be a valid category id".to_string()))
}

impl CreateCategoryDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            name: form.text("name").unwrap_or_default().trim().to_string(),
            parent_id: match form.text("parent_id") {
                Some(raw) => parse_parent(&raw)?,
                None => None,
            },
        };
        dto.validate()?;
        Ok(dto)
    }
}

impl UpdateCategoryDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            name: form.text("name").map(|n| n.trim().to_string()),
            parent_id: form.text("parent_id").map(|raw| parse_parent(&raw)).transpose()?,
            clear_image: form.flag("clear_image"),
        };
        dto.validate()?;
        Ok(dto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_form_trims_and_parses_parent() {
        let parent = Uuid::now_v7();
        let form = MultipartForm::from_parts(
            &[("name", "  Physics "), ("parent_id", &parent.to_string())],
            vec![],
        );
        let dto = CreateCategoryDto::from_form(&form).unwrap();
        assert_eq!(dto.name, "Physics");
        assert_eq!(dto.parent_id, Some(parent));
    }

    #[test]
    fn test_create_form_requires_name() {
        let form = MultipartForm::from_parts(&[("name", "   ")], vec![]);
        assert!(matches!(
            CreateCategoryDto::from_form(&form),
            Err(AppError::Validation(_))
        ));
        let form = MultipartForm::from_parts(&[], vec![]);
        assert!(CreateCategoryDto::from_form(&form).is_err());
    }

    #[test]
    fn test_update_form_distinguishes_absent_and_empty_parent() {
        let form = MultipartForm::from_parts(&[("name", "Chemistry")], vec![]);
        assert_eq!(UpdateCategoryDto::from_form(&form).unwrap().parent_id, None);

        let form = MultipartForm::from_parts(&[("parent_id", "")], vec![]);
        assert_eq!(UpdateCategoryDto::from_form(&form).unwrap().parent_id, Some(None));

        let form = MultipartForm::from_parts(&[("parent_id", "not-a-uuid")], vec![]);
        assert!(UpdateCategoryDto::from_form(&form).is_err());
    }

    #[test]
    fn test_update_form_reads_clear_image() {
        let form = MultipartForm::from_parts(&[("clear_image", "true")], vec![]);
        assert!(UpdateCategoryDto::from_form(&form).unwrap().clear_image);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Action, Relation};
use crate::features::resources::dtos::{
    file_format, CreateResourceDto, ResourceCategoryDto, ResourceFilter, ResourceOwnerDto,
    ResourceResponseDto, UpdateResourceDto,
};
use crate::features::resources::models::Resource;
use crate::modules::storage::{delete_quietly, AssetKind, ObjectStore};
use crate::shared::types::{contains_pattern, PageWindow};
use crate::shared::upload::UploadedFile;
use crate::shared::validation::slugify;

#[derive(sqlx::FromRow)]
struct ResourceRow {
    #[sqlx(flatten)]
    resource: Resource,
    owner_name: String,
    owner_profile_image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CategoryLinkRow {
    resource_id: Uuid,
    id: Uuid,
    name: String,
}

/// A stored file ready to be streamed back to the client
pub struct ResourceDownload {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Service for resource operations
pub struct ResourceService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl ResourceService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    /// Categories of each resource in `ids`, ordered by name
    pub async fn categories_for(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ResourceCategoryDto>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, CategoryLinkRow>(
            r#"
            SELECT rc.resource_id, c.id, c.name
            FROM resource_categories rc
            JOIN categories c ON c.id = rc.category_id
            WHERE rc.resource_id = ANY($1)
            ORDER BY LOWER(c.name)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<ResourceCategoryDto>> = HashMap::new();
        for row in rows {
            map.entry(row.resource_id)
                .or_default()
                .push(ResourceCategoryDto {
                    id: row.id,
                    name: row.name,
                });
        }
        Ok(map)
    }

    async fn to_dtos(&self, rows: Vec<ResourceRow>) -> Result<Vec<ResourceResponseDto>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.resource.id).collect();
        let mut categories = Self::categories_for(&self.pool, &ids).await?;
        let storage = self.storage.as_ref();

        Ok(rows
            .into_iter()
            .map(|row| {
                let owner = ResourceOwnerDto {
                    id: row.resource.user_id,
                    name: row.owner_name,
                    profile_image_url: row.owner_profile_image.as_deref().map(|k| storage.url(k)),
                };
                let links = categories.remove(&row.resource.id).unwrap_or_default();
                ResourceResponseDto::from_parts(&row.resource, owner, links, storage)
            })
            .collect())
    }

    async fn fetch_row(&self, id: Uuid) -> Result<ResourceRow> {
        sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT {}, u.name AS owner_name, u.profile_image AS owner_profile_image
            FROM resources r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
            Resource::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found.".to_string()))
    }

    async fn find(&self, id: Uuid) -> Result<Resource> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {} FROM resources r WHERE r.id = $1",
            Resource::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found.".to_string()))
    }

    async fn dto(&self, id: Uuid) -> Result<ResourceResponseDto> {
        let row = self.fetch_row(id).await?;
        let mut dtos = self.to_dtos(vec![row]).await?;
        dtos.pop()
            .ok_or_else(|| AppError::Internal("Resource row vanished while loading".to_string()))
    }

    /// Every id must name an existing category
    async fn ensure_categories_exist(conn: &mut PgConnection, ids: &[Uuid]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(conn)
            .await?;

        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(AppError::Validation(format!(
                "category_ids: The selected category {} is invalid.",
                missing
            )));
        }
        Ok(())
    }

    async fn sync_categories(conn: &mut PgConnection, resource_id: Uuid, ids: &[Uuid]) -> Result<()> {
        sqlx::query("DELETE FROM resource_categories WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&mut *conn)
            .await?;

        if !ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO resource_categories (resource_id, category_id)
                SELECT $1, UNNEST($2::uuid[])
                "#,
            )
            .bind(resource_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    async fn store_file(&self, owner_id: Uuid, file: UploadedFile) -> Result<(String, Option<String>)> {
        let format = file_format(&file);
        let key = self
            .storage
            .put(
                AssetKind::ResourceFile { owner_id },
                format.as_deref(),
                file.bytes,
                &file.content_type,
            )
            .await?;
        Ok((key, format))
    }

    async fn insert(
        &self,
        id: Uuid,
        owner_id: Uuid,
        dto: &CreateResourceDto,
        file_path: Option<&str>,
        format: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO resources (id, title, description, file_path, format, user_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(file_path)
        .bind(format)
        .bind(owner_id)
        .bind(dto.status)
        .execute(&mut *tx)
        .await?;

        Self::sync_categories(&mut *tx, id, &dto.category_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_update(
        &self,
        id: Uuid,
        dto: &UpdateResourceDto,
        description: Option<&str>,
        file_path: Option<&str>,
        format: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE resources
            SET title = COALESCE($1, title),
                description = $2,
                status = COALESCE($3, status),
                file_path = $4,
                format = $5,
                updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&dto.title)
        .bind(description)
        .bind(dto.status)
        .bind(file_path)
        .bind(format)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(ids) = &dto.category_ids {
            Self::sync_categories(&mut *tx, id, ids).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Newest first
    pub async fn list(
        &self,
        filter: ResourceFilter,
        window: PageWindow,
    ) -> Result<(Vec<ResourceResponseDto>, i64)> {
        let pattern = contains_pattern(filter.search.as_deref());
        let predicate = r#"
            ($1::uuid IS NULL OR EXISTS (
                SELECT 1 FROM resource_categories rc
                WHERE rc.resource_id = r.id AND rc.category_id = $1
            ))
            AND ($2::uuid IS NULL OR r.user_id = $2)
            AND ($3::text IS NULL OR r.title ILIKE $3 OR r.description ILIKE $3)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM resources r WHERE {}", predicate))
                .bind(filter.category_id)
                .bind(filter.user_id)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT {}, u.name AS owner_name, u.profile_image AS owner_profile_image
            FROM resources r
            JOIN users u ON u.id = r.user_id
            WHERE {}
            ORDER BY r.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            Resource::COLUMNS,
            predicate
        ))
        .bind(filter.category_id)
        .bind(filter.user_id)
        .bind(&pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.to_dtos(rows).await?, total))
    }

    /// Load one resource and count the view
    pub async fn show(&self, id: Uuid) -> Result<ResourceResponseDto> {
        let updated = sqlx::query("UPDATE resources SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Resource not found.".to_string()));
        }

        self.dto(id).await
    }

    pub async fn download(&self, id: Uuid) -> Result<ResourceDownload> {
        let resource = self.find(id).await?;

        let missing = || AppError::NotFound("File associated with this resource not found.".to_string());
        let key = resource.file_path.as_deref().ok_or_else(missing)?;
        let bytes = self.storage.get(key).await?.ok_or_else(missing)?;

        sqlx::query("UPDATE resources SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(ResourceDownload {
            bytes,
            file_name: download_name(&resource),
        })
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        dto: CreateResourceDto,
        file: Option<UploadedFile>,
    ) -> Result<ResourceResponseDto> {
        {
            let mut conn = self.pool.acquire().await?;
            Self::ensure_categories_exist(&mut *conn, &dto.category_ids).await?;
        }

        let (file_path, format) = match file {
            Some(file) => {
                let (key, format) = self.store_file(user.user_id, file).await?;
                (Some(key), format)
            }
            None => (None, None),
        };

        let id = Uuid::now_v7();
        let result = self
            .insert(id, user.user_id, &dto, file_path.as_deref(), format.as_deref())
            .await;

        if let Err(e) = result {
            delete_quietly(self.storage.as_ref(), file_path.as_deref()).await;
            return Err(e);
        }

        info!(resource_id = %id, user_id = %user.user_id, "Resource created");
        self.dto(id).await
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateResourceDto,
        file: Option<UploadedFile>,
    ) -> Result<ResourceResponseDto> {
        let current = self.find(id).await?;
        policy::authorize(
            user,
            Action::UpdateResource,
            Relation::to_owner(user, current.user_id),
        )?;

        if let Some(ids) = &dto.category_ids {
            let mut conn = self.pool.acquire().await?;
            Self::ensure_categories_exist(&mut *conn, ids).await?;
        }

        // Clearing wins over a new upload
        let replacement = match file {
            Some(file) if !dto.clear_file => Some(self.store_file(current.user_id, file).await?),
            _ => None,
        };
        let (file_path, format) = match (&replacement, dto.clear_file) {
            (Some((key, format)), _) => (Some(key.clone()), format.clone()),
            (None, true) => (None, None),
            (None, false) => (current.file_path.clone(), current.format.clone()),
        };

        let description = match &dto.description {
            Some(description) => description.clone(),
            None => current.description.clone(),
        };

        let result = self
            .write_update(id, &dto, description.as_deref(), file_path.as_deref(), format.as_deref())
            .await;

        if let Err(e) = result {
            let new_key = replacement.as_ref().map(|(key, _)| key.as_str());
            delete_quietly(self.storage.as_ref(), new_key).await;
            return Err(e);
        }

        if current.file_path != file_path {
            delete_quietly(self.storage.as_ref(), current.file_path.as_deref()).await;
        }

        self.dto(id).await
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let current = self.find(id).await?;
        policy::authorize(
            user,
            Action::DeleteResource,
            Relation::to_owner(user, current.user_id),
        )?;

        // Category links cascade with the row
        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        delete_quietly(self.storage.as_ref(), current.file_path.as_deref()).await;
        info!(resource_id = %id, user_id = %user.user_id, "Resource deleted");
        Ok(())
    }
}

/// `slug(title).format`, falling back to the stored key's extension
fn download_name(resource: &Resource) -> String {
    let extension = resource.format.clone().or_else(|| {
        resource.file_path.as_deref().and_then(|key| {
            std::path::Path::new(key)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_string())
        })
    });

    match extension {
        Some(ext) => format!("{}.{}", slugify(&resource.title), ext),
        None => slugify(&resource.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::resources::models::ResourceStatus;
    use chrono::Utc;

    fn resource(title: &str, file_path: Option<&str>, format: Option<&str>) -> Resource {
        Resource {
            id: Uuid::now_v7(),
            title: title.to_string(),
            description: None,
            file_path: file_path.map(str::to_string),
            format: format.map(str::to_string),
            user_id: Uuid::now_v7(),
            status: ResourceStatus::Active,
            view_count: 0,
            download_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_download_name_uses_slug_and_format() {
        let r = resource("Intro to Graphs!", Some("public/resources/x.pdf"), Some("pdf"));
        assert_eq!(download_name(&r), "intro-to-graphs.pdf");
    }

    #[test]
    fn test_download_name_falls_back_to_key_extension() {
        let r = resource("Lecture 3", Some("public/resources/user_1/abc.mp4"), None);
        assert_eq!(download_name(&r), "lecture-3.mp4");

        let r = resource("Lecture 3", Some("public/resources/user_1/abc"), None);
        assert_eq!(download_name(&r), "lecture-3");
    }
}

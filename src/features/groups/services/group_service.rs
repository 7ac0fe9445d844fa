use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{on_unique_violation, AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Action, Relation};
use crate::features::groups::dtos::{
    CreateGroupDto, GroupOwnerDto, GroupResponseDto, UpdateGroupDto,
};
use crate::features::groups::models::Group;
use crate::modules::storage::{delete_quietly, AssetKind, ObjectStore};
use crate::shared::types::{contains_pattern, PageWindow};
use crate::shared::upload::UploadedFile;

#[derive(sqlx::FromRow)]
struct GroupRow {
    #[sqlx(flatten)]
    group: Group,
    owner_name: String,
    owner_profile_image: Option<String>,
    messages_count: i64,
}

const ROW_SELECT: &str = r#"
    u.name AS owner_name,
    u.profile_image AS owner_profile_image,
    (SELECT COUNT(*) FROM chat_messages m WHERE m.group_id = g.id) AS messages_count
    FROM groups g
    JOIN users u ON u.id = g.owner_id
"#;

fn title_taken() -> AppError {
    AppError::Validation("title: The title has already been taken.".to_string())
}

fn group_not_found() -> AppError {
    AppError::NotFound("Group not found.".to_string())
}

/// Service for group operations
pub struct GroupService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl GroupService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    fn to_dto(&self, row: GroupRow) -> GroupResponseDto {
        let storage = self.storage.as_ref();
        let owner = GroupOwnerDto {
            id: row.group.owner_id,
            name: row.owner_name,
            profile_image_url: row.owner_profile_image.as_deref().map(|k| storage.url(k)),
        };
        GroupResponseDto::from_parts(&row.group, owner, row.messages_count, storage)
    }

    async fn find(&self, id: Uuid) -> Result<Group> {
        sqlx::query_as::<_, Group>(&format!(
            "SELECT {} FROM groups g WHERE g.id = $1",
            Group::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(group_not_found)
    }

    async fn store_image(&self, image: Option<UploadedFile>) -> Result<Option<String>> {
        let Some(file) = image else {
            return Ok(None);
        };
        let key = self
            .storage
            .put(
                AssetKind::GroupImage,
                file.extension().as_deref(),
                file.bytes,
                &file.content_type,
            )
            .await?;
        Ok(Some(key))
    }

    /// Newest first, optionally only the groups of `owner_id`
    pub async fn list(
        &self,
        search: Option<&str>,
        owner_id: Option<Uuid>,
        window: PageWindow,
    ) -> Result<(Vec<GroupResponseDto>, i64)> {
        let pattern = contains_pattern(search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM groups
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
            "#,
        )
        .bind(&pattern)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {}, {}
            WHERE ($1::text IS NULL OR g.title ILIKE $1)
              AND ($2::uuid IS NULL OR g.owner_id = $2)
            ORDER BY g.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            Group::COLUMNS,
            ROW_SELECT
        ))
        .bind(&pattern)
        .bind(owner_id)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|row| self.to_dto(row)).collect(), total))
    }

    pub async fn get(&self, id: Uuid) -> Result<GroupResponseDto> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {}, {} WHERE g.id = $1",
            Group::COLUMNS,
            ROW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(group_not_found)?;

        Ok(self.to_dto(row))
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        dto: CreateGroupDto,
        image: Option<UploadedFile>,
    ) -> Result<GroupResponseDto> {
        let image_path = self.store_image(image).await?;

        let id = Uuid::now_v7();
        let inserted = sqlx::query(
            r#"
            INSERT INTO groups (id, title, description, image_path, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&image_path)
        .bind(user.user_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            delete_quietly(self.storage.as_ref(), image_path.as_deref()).await;
            return Err(on_unique_violation(e, title_taken));
        }

        info!(group_id = %id, owner_id = %user.user_id, "Group created");
        self.get(id).await
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateGroupDto,
        image: Option<UploadedFile>,
    ) -> Result<GroupResponseDto> {
        let current = self.find(id).await?;
        policy::authorize(
            user,
            Action::UpdateGroup,
            Relation::to_owner(user, current.owner_id),
        )?;

        let new_key = if dto.clear_image {
            None
        } else {
            self.store_image(image).await?
        };
        let image_path = match (&new_key, dto.clear_image) {
            (Some(key), _) => Some(key.clone()),
            (None, true) => None,
            (None, false) => current.image_path.clone(),
        };
        let description = match dto.description {
            Some(description) => description,
            None => current.description.clone(),
        };

        let updated = sqlx::query(
            r#"
            UPDATE groups
            SET title = COALESCE($1, title),
                description = $2,
                image_path = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&dto.title)
        .bind(&description)
        .bind(&image_path)
        .bind(id)
        .execute(&self.pool)
        .await;

        if let Err(e) = updated {
            delete_quietly(self.storage.as_ref(), new_key.as_deref()).await;
            return Err(on_unique_violation(e, title_taken));
        }

        if current.image_path != image_path {
            delete_quietly(self.storage.as_ref(), current.image_path.as_deref()).await;
        }

        self.get(id).await
    }

    /// Messages cascade with the group
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let current = self.find(id).await?;
        policy::authorize(
            user,
            Action::DeleteGroup,
            Relation::to_owner(user, current.owner_id),
        )?;

        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        delete_quietly(self.storage.as_ref(), current.image_path.as_deref()).await;
        info!(group_id = %id, user_id = %user.user_id, "Group deleted");
        Ok(())
    }
}

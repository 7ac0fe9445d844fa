use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{on_unique_violation, AppError, Result};
use crate::features::auth::model::Role;
use crate::features::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::features::users::dtos::{
    ChangePasswordDto, CreateUserDto, UpdateAccountDto, UpdateUserDto, UserResponseDto,
};
use crate::features::users::models::User;
use crate::modules::storage::{delete_quietly, AssetKind, ObjectStore};
use crate::shared::types::{contains_pattern, PageWindow};
use crate::shared::upload::UploadedFile;

fn email_taken() -> AppError {
    AppError::Validation("email: The email has already been taken.".to_string())
}

/// Service for account management (admin CRUD and self-service)
pub struct UserService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl UserService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    fn to_dto(&self, user: &User) -> UserResponseDto {
        UserResponseDto::from_model(user, self.storage.as_ref())
    }

    async fn find(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", User::COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        role: Option<Role>,
        window: PageWindow,
    ) -> Result<(Vec<UserResponseDto>, i64)> {
        let pattern = contains_pattern(search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
              AND ($2::user_role IS NULL OR role = $2)
            "#,
        )
        .bind(&pattern)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
              AND ($2::user_role IS NULL OR role = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            User::COLUMNS
        ))
        .bind(&pattern)
        .bind(role)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users.iter().map(|u| self.to_dto(u)).collect(), total))
    }

    pub async fn get(&self, id: Uuid) -> Result<UserResponseDto> {
        let user = self.find(id).await?;
        Ok(self.to_dto(&user))
    }

    pub async fn create(&self, dto: CreateUserDto) -> Result<UserResponseDto> {
        let password_hash = hash_password_blocking(dto.password).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            User::COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(dto.name.trim())
        .bind(dto.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(dto.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, email_taken))?;

        info!(user_id = %user.id, role = %user.role, "User created by admin");
        Ok(self.to_dto(&user))
    }

    pub async fn update(&self, id: Uuid, dto: UpdateUserDto) -> Result<UserResponseDto> {
        let password_hash = match dto.password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            User::COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.email.map(|e| e.trim().to_lowercase()))
        .bind(password_hash)
        .bind(dto.role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, email_taken))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(self.to_dto(&user))
    }

    /// Delete an account and everything it owns. Stored files of the cascaded
    /// rows are removed once the delete has committed.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT profile_image FROM users WHERE id = $1 AND profile_image IS NOT NULL
            UNION ALL
            SELECT file_path FROM resources WHERE user_id = $1 AND file_path IS NOT NULL
            UNION ALL
            SELECT image_path FROM groups WHERE owner_id = $1 AND image_path IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;

        for key in &keys {
            delete_quietly(self.storage.as_ref(), Some(key)).await;
        }
        info!(user_id = %id, objects = keys.len(), "User deleted");
        Ok(())
    }

    // =========================================================================
    // ACCOUNT
    // =========================================================================

    pub async fn update_account(
        &self,
        user_id: Uuid,
        dto: UpdateAccountDto,
        image: Option<UploadedFile>,
    ) -> Result<UserResponseDto> {
        let current = self.find(user_id).await?;

        let new_key = match image {
            Some(file) => Some(
                self.storage
                    .put(
                        AssetKind::ProfileImage,
                        file.extension().as_deref(),
                        file.bytes,
                        &file.content_type,
                    )
                    .await?,
            ),
            None => None,
        };

        let profile_image = match (&new_key, dto.clear_profile_image) {
            (Some(key), _) => Some(key.clone()),
            (None, true) => None,
            (None, false) => current.profile_image.clone(),
        };
        let bio = match dto.bio {
            Some(bio) if bio.is_empty() => None,
            Some(bio) => Some(bio),
            None => current.bio.clone(),
        };

        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                bio = $3,
                profile_image = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            User::COLUMNS
        ))
        .bind(dto.name)
        .bind(dto.email)
        .bind(bio)
        .bind(&profile_image)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, email_taken));

        let user = match result {
            Ok(user) => user,
            Err(e) => {
                delete_quietly(self.storage.as_ref(), new_key.as_deref()).await;
                return Err(e);
            }
        };

        if current.profile_image != user.profile_image {
            delete_quietly(self.storage.as_ref(), current.profile_image.as_deref()).await;
        }

        Ok(self.to_dto(&user))
    }

    pub async fn change_password(&self, user_id: Uuid, dto: ChangePasswordDto) -> Result<()> {
        let user = self.find(user_id).await?;

        if !verify_password_blocking(dto.current_password, user.password_hash).await? {
            return Err(AppError::Validation(
                "current_password: The current password is incorrect.".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(dto.password).await?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn delete_account(&self, user_id: Uuid, password: String) -> Result<()> {
        let user = self.find(user_id).await?;

        if !verify_password_blocking(password, user.password_hash).await? {
            return Err(AppError::Validation(
                "password: The password is incorrect.".to_string(),
            ));
        }

        self.delete(user_id).await
    }
}

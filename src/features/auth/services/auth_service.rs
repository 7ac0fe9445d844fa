use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{on_unique_violation, AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::Role;
use crate::features::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::features::auth::TokenService;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::User;
use crate::modules::storage::ObjectStore;

/// Service for registration, login and the current-user lookup
pub struct AuthService {
    pool: PgPool,
    tokens: Arc<TokenService>,
    storage: Arc<dyn ObjectStore>,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: Arc<TokenService>, storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            pool,
            tokens,
            storage,
        }
    }

    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
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
        .bind(Role::User)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::Conflict("Email is already registered".to_string())
            })
        })?;

        info!(user_id = %user.id, "User registered");

        let token = self.tokens.issue(user.id, &user.name, user.role)?;
        Ok(AuthResponseDto {
            token,
            name: user.name,
        })
    }

    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            User::COLUMNS
        ))
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        // Same answer for unknown email and wrong password
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let Some(user) = user else {
            return Err(invalid());
        };
        if !verify_password_blocking(dto.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id, &user.name, user.role)?;
        Ok(AuthResponseDto {
            token,
            name: user.name,
        })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserResponseDto> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            User::COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        Ok(UserResponseDto::from_model(&user, self.storage.as_ref()))
    }
}

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{on_unique_violation, AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Action, Relation};
use crate::features::reviews::dtos::{
    CreateReviewDto, ReviewAuthorDto, ReviewFilter, ReviewResourceDto, ReviewResponseDto,
    UpdateReviewDto,
};
use crate::features::reviews::models::{Review, ReviewStatus};
use crate::modules::storage::ObjectStore;
use crate::shared::types::{contains_pattern, PageWindow};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    #[sqlx(flatten)]
    review: Review,
    author_name: String,
    author_profile_image: Option<String>,
    resource_title: String,
}

const SELECT_ROWS: &str = r#"
    FROM reviews rv
    JOIN users u ON u.id = rv.user_id
    JOIN resources r ON r.id = rv.resource_id
"#;

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found or access denied.".to_string())
}

/// Service for review operations
pub struct ReviewService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl ReviewService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    fn to_dto(&self, row: ReviewRow) -> ReviewResponseDto {
        let r = row.review;
        ReviewResponseDto {
            id: r.id,
            user_id: r.user_id,
            resource_id: r.resource_id,
            comment: r.comment,
            rating: r.rating,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: ReviewAuthorDto {
                id: r.user_id,
                name: row.author_name,
                profile_image_url: row
                    .author_profile_image
                    .as_deref()
                    .map(|key| self.storage.url(key)),
            },
            resource: ReviewResourceDto {
                id: r.resource_id,
                title: row.resource_title,
            },
        }
    }

    async fn fetch_row(&self, id: Uuid) -> Result<Option<ReviewRow>> {
        Ok(sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            SELECT {}, u.name AS author_name, u.profile_image AS author_profile_image,
                   r.title AS resource_title
            {}
            WHERE rv.id = $1
            "#,
            Review::COLUMNS,
            SELECT_ROWS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find(&self, id: Uuid) -> Result<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews rv WHERE rv.id = $1",
            Review::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))
    }

    async fn ensure_resource_exists(&self, resource_id: Uuid) -> Result<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM resources WHERE id = $1)")
                .bind(resource_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(AppError::Validation(
                "resource_id: The selected resource id is invalid.".to_string(),
            ));
        }
        Ok(())
    }

    /// Newest first. A `resource_id` filter must name an existing resource.
    pub async fn list(
        &self,
        filter: ReviewFilter,
        window: PageWindow,
    ) -> Result<(Vec<ReviewResponseDto>, i64)> {
        if let Some(resource_id) = filter.resource_id {
            self.ensure_resource_exists(resource_id).await?;
        }

        let pattern = contains_pattern(filter.search.as_deref());
        let predicate = r#"
            ($1::uuid IS NULL OR rv.resource_id = $1)
            AND ($2::uuid IS NULL OR rv.user_id = $2)
            AND ($3::review_status IS NULL OR rv.status = $3)
            AND ($4::text IS NULL OR rv.comment ILIKE $4)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM reviews rv WHERE {}", predicate))
                .bind(filter.resource_id)
                .bind(filter.user_id)
                .bind(filter.status)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            SELECT {}, u.name AS author_name, u.profile_image AS author_profile_image,
                   r.title AS resource_title
            {}
            WHERE {}
            ORDER BY rv.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            Review::COLUMNS,
            SELECT_ROWS,
            predicate
        ))
        .bind(filter.resource_id)
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(&pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|row| self.to_dto(row)).collect(), total))
    }

    /// Approved reviews are public; the rest only reach their author and admins
    pub async fn get(&self, viewer: Option<&AuthenticatedUser>, id: Uuid) -> Result<ReviewResponseDto> {
        let row = self.fetch_row(id).await?.ok_or_else(review_not_found)?;

        if row.review.status != ReviewStatus::Approved {
            let visible = viewer.is_some_and(|user| {
                policy::is_permitted(
                    user,
                    Action::ViewUnpublishedReview,
                    Relation::to_owner(user, row.review.user_id),
                )
            });
            if !visible {
                return Err(review_not_found());
            }
        }

        Ok(self.to_dto(row))
    }

    /// New reviews wait for moderation
    pub async fn create(&self, user: &AuthenticatedUser, dto: CreateReviewDto) -> Result<ReviewResponseDto> {
        self.ensure_resource_exists(dto.resource_id).await?;

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, resource_id, comment, rating, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(user.user_id)
        .bind(dto.resource_id)
        .bind(&dto.comment)
        .bind(dto.rating)
        .bind(ReviewStatus::Pending)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::Conflict("You have already reviewed this resource.".to_string())
            })
        })?;

        info!(review_id = %id, resource_id = %dto.resource_id, "Review submitted");
        self.fetch_row(id)
            .await?
            .map(|row| self.to_dto(row))
            .ok_or_else(review_not_found)
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateReviewDto,
    ) -> Result<ReviewResponseDto> {
        let review = self.find(id).await?;
        policy::authorize(
            user,
            Action::UpdateReview,
            Relation::to_owner(user, review.user_id),
        )?;

        if dto.status.is_some() && !user.is_admin() {
            return Err(AppError::Forbidden(
                "You are not authorized to change the review status.".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE reviews
            SET comment = COALESCE($1, comment),
                rating = COALESCE($2, rating),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&dto.comment)
        .bind(dto.rating)
        .bind(dto.status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.fetch_row(id)
            .await?
            .map(|row| self.to_dto(row))
            .ok_or_else(review_not_found)
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let review = self.find(id).await?;
        policy::authorize(
            user,
            Action::DeleteReview,
            Relation::to_owner(user, review.user_id),
        )?;

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(review_id = %id, user_id = %user.user_id, "Review deleted");
        Ok(())
    }
}

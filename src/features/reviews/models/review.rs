use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "review_rating", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewRating {
    Liked,
    Disliked,
    Neutral,
}

/// Moderation state; only approved reviews are public
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub comment: String,
    pub rating: ReviewRating,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Column list qualified with the `rv` alias
    pub const COLUMNS: &'static str = "rv.id, rv.user_id, rv.resource_id, rv.comment, rv.rating, \
         rv.status, rv.created_at, rv.updated_at";
}

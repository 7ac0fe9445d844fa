use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::auth::model::Role;

/// Database model for an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const COLUMNS: &'static str =
        "id, name, email, password_hash, role, profile_image, bio, created_at, updated_at";
}

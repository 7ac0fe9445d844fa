use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A discussion group; its chat messages are deleted with it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub const COLUMNS: &'static str =
        "g.id, g.title, g.description, g.image_path, g.owner_id, g.created_at, g.updated_at";
}

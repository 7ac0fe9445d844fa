use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub message: String,
    /// Cleared when the parent message is deleted
    pub reply_to_id: Option<Uuid>,
    /// Cleared when the linked resource is deleted
    pub resource_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatMessage {
    pub const COLUMNS: &'static str = "m.id, m.user_id, m.group_id, m.message, m.reply_to_id, \
         m.resource_id, m.created_at, m.updated_at";
}

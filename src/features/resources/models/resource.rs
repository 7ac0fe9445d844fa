use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "resource_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    #[default]
    Active,
    Inactive,
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ResourceStatus::Active),
            "inactive" => Ok(ResourceStatus::Inactive),
            _ => Err(format!("Invalid resource status: {}", s)),
        }
    }
}

/// Database model for an uploaded resource
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Object key of the uploaded file
    pub file_path: Option<String>,
    /// Original file extension, used for the download name
    pub format: Option<String>,
    pub user_id: Uuid,
    pub status: ResourceStatus,
    pub view_count: i64,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Column list qualified with the `r` alias
    pub const COLUMNS: &'static str = "r.id, r.title, r.description, r.file_path, r.format, \
         r.user_id, r.status, r.view_count, r.download_count, r.created_at, r.updated_at";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Active".parse::<ResourceStatus>(), Ok(ResourceStatus::Active));
        assert_eq!(" inactive ".parse::<ResourceStatus>(), Ok(ResourceStatus::Inactive));
        assert!("archived".parse::<ResourceStatus>().is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::models::ReportStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportUserDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResourceDto {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ReportUserDto,
    /// `None` once the reported resource is gone
    pub resource: Option<ReportResourceDto>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    pub resource_id: Uuid,

    #[validate(length(min = 10, max = 1000, message = "Reason must be 10-1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReportDto {
    pub status: ReportStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_bounds() {
        let dto = CreateReportDto {
            resource_id: Uuid::now_v7(),
            reason: "spam".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = CreateReportDto {
            reason: "x".repeat(1000),
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_requires_known_status() {
        assert!(serde_json::from_str::<UpdateReportDto>(r#"{"status":"resolved"}"#).is_ok());
        assert!(serde_json::from_str::<UpdateReportDto>(r#"{"status":"closed"}"#).is_err());
        assert!(serde_json::from_str::<UpdateReportDto>("{}").is_err());
    }
}

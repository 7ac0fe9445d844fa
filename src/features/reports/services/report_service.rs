use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    CreateReportDto, ReportResourceDto, ReportResponseDto, ReportUserDto,
};
use crate::features::reports::models::{Report, ReportStatus};
use crate::shared::types::PageWindow;

#[derive(sqlx::FromRow)]
struct ReportRow {
    #[sqlx(flatten)]
    report: Report,
    user_name: String,
    resource_title: Option<String>,
}

impl From<ReportRow> for ReportResponseDto {
    fn from(row: ReportRow) -> Self {
        let r = row.report;
        let resource = match (r.resource_id, row.resource_title) {
            (Some(id), Some(title)) => Some(ReportResourceDto { id, title }),
            _ => None,
        };
        Self {
            id: r.id,
            user_id: r.user_id,
            resource_id: r.resource_id,
            reason: r.reason,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: ReportUserDto {
                id: r.user_id,
                name: row.user_name,
            },
            resource,
        }
    }
}

/// Service for resource reports
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: Uuid) -> Result<ReportResponseDto> {
        sqlx::query_as::<_, ReportRow>(&format!(
            r#"
            SELECT {}, u.name AS user_name, r.title AS resource_title
            FROM reports rp
            JOIN users u ON u.id = rp.user_id
            LEFT JOIN resources r ON r.id = rp.resource_id
            WHERE rp.id = $1
            "#,
            Report::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ReportResponseDto::from)
        .ok_or_else(|| AppError::NotFound("Report not found.".to_string()))
    }

    /// Newest first
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        window: PageWindow,
    ) -> Result<(Vec<ReportResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            r#"
            SELECT {}, u.name AS user_name, r.title AS resource_title
            FROM reports rp
            JOIN users u ON u.id = rp.user_id
            LEFT JOIN resources r ON r.id = rp.resource_id
            WHERE ($1::report_status IS NULL OR rp.status = $1)
            ORDER BY rp.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            Report::COLUMNS
        ))
        .bind(status)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(ReportResponseDto::from).collect(), total))
    }

    pub async fn create(&self, user: &AuthenticatedUser, dto: CreateReportDto) -> Result<ReportResponseDto> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM resources WHERE id = $1)")
                .bind(dto.resource_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(AppError::Validation(
                "resource_id: The selected resource id is invalid.".to_string(),
            ));
        }

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO reports (id, user_id, resource_id, reason, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user.user_id)
        .bind(dto.resource_id)
        .bind(dto.reason.trim())
        .bind(ReportStatus::Pending)
        .execute(&self.pool)
        .await?;

        info!(report_id = %id, resource_id = %dto.resource_id, "Resource reported");
        self.fetch(id).await
    }

    pub async fn update_status(&self, id: Uuid, status: ReportStatus) -> Result<ReportResponseDto> {
        let updated = sqlx::query(
            "UPDATE reports SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Report not found.".to_string()));
        }

        self.fetch(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Report not found.".to_string()));
        }
        Ok(())
    }
}

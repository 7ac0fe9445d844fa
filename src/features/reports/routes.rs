use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Report routes (all require authentication; triage is admin only)
pub fn protected_routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/api/reports/{id}",
            put(handlers::update_report)
                .patch(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{lazy_pool, with_admin_auth, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    fn router() -> Router {
        protected_routes(Arc::new(ReportService::new(lazy_pool())))
    }

    #[tokio::test]
    async fn test_regular_user_cannot_triage() {
        let server = TestServer::new(with_user_auth(router())).unwrap();
        let id = Uuid::now_v7();

        server.get("/api/reports").await.assert_status(StatusCode::FORBIDDEN);
        server
            .put(&format!("/api/reports/{}", id))
            .json(&json!({"status": "resolved"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/api/reports/{}", id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_report_reason_is_validated() {
        let server = TestServer::new(with_user_auth(router())).unwrap();
        server
            .post("/api/reports")
            .json(&json!({"resource_id": Uuid::now_v7(), "reason": "bad"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_admin_status_must_be_known() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();
        server
            .patch(&format!("/api/reports/{}", Uuid::now_v7()))
            .json(&json!({"status": "archived"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

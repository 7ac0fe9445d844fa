use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Multipart overhead allowed on top of the image itself
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Public read routes
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories-all-flat", get(handlers::list_categories_flat))
        .route("/api/categories/{id}", get(handlers::get_category))
        .with_state(service)
}

/// Write routes (require authentication; update/delete are admin only)
pub fn protected_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            post(handlers::create_category)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + FORM_OVERHEAD)),
        )
        .route(
            "/api/categories/{id}",
            put(handlers::update_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + FORM_OVERHEAD)),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{lazy_pool, with_admin_auth, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm as TestForm;
    use axum_test::TestServer;
    use uuid::Uuid;

    fn service() -> Arc<CategoryService> {
        Arc::new(CategoryService::new(lazy_pool(), Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_non_admin_cannot_delete() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let response = server
            .delete(&format!("/api/categories/{}", Uuid::now_v7()))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_update() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = TestForm::new().add_text("name", "Renamed");
        server
            .put(&format!("/api/categories/{}", Uuid::now_v7()))
            .multipart(form)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = TestForm::new().add_text("name", "   ");
        let response = server.post("/api/categories").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Validation Error.");
    }

    #[tokio::test]
    async fn test_admin_update_rejects_malformed_parent() {
        let server = TestServer::new(with_admin_auth(protected_routes(service()))).unwrap();
        let form = TestForm::new().add_text("parent_id", "abc");
        server
            .patch(&format!("/api/categories/{}", Uuid::now_v7()))
            .multipart(form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_requires_multipart_body() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        server
            .post("/api/categories")
            .json(&serde_json::json!({"name": "Math"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_detail_rejects_malformed_id() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .get("/api/categories/not-a-uuid")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, put},
    Router,
};

use crate::features::users::handlers;
use crate::features::users::services::UserService;
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Account and admin user routes (all require authentication)
pub fn protected_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/api/account",
            get(handlers::get_account)
                .put(handlers::update_account)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024))
                .delete(handlers::delete_account),
        )
        .route("/api/account/password", put(handlers::change_password))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{lazy_pool, with_admin_auth, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    fn router() -> Router {
        protected_routes(Arc::new(UserService::new(
            lazy_pool(),
            Arc::new(MemoryStore::default()),
        )))
    }

    #[tokio::test]
    async fn test_regular_user_cannot_manage_users() {
        let server = TestServer::new(with_user_auth(router())).unwrap();

        server.get("/api/users").await.assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/api/users/{}", Uuid::now_v7()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_rejected() {
        let server = TestServer::new(router()).unwrap();
        server
            .get("/api/account")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server.get("/api/users").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_create_validates_body() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();
        let response = server
            .post("/api/users")
            .json(&json!({"name": "Ali", "email": "nope", "password": "123"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_admin_create_rejects_unknown_role() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();
        server
            .post("/api/users")
            .json(&json!({
                "name": "Ali",
                "email": "ali@example.com",
                "password": "secret1",
                "role": "root"
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_password_change_requires_matching_confirmation() {
        let server = TestServer::new(with_user_auth(router())).unwrap();
        server
            .put("/api/account/password")
            .json(&json!({
                "current_password": "old-secret",
                "password": "new-secret",
                "password_confirmation": "different"
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::features::groups::handlers;
use crate::features::groups::services::GroupService;
use crate::shared::constants::MAX_IMAGE_SIZE;

pub fn routes(service: Arc<GroupService>) -> Router {
    Router::new()
        .route("/api/groups", get(handlers::list_groups))
        .route("/api/groups/{id}", get(handlers::get_group))
        .with_state(service)
}

pub fn protected_routes(service: Arc<GroupService>) -> Router {
    Router::new()
        .route("/api/my-groups", get(handlers::my_groups))
        .route("/api/groups", post(handlers::create_group))
        .route(
            "/api/groups/{id}",
            put(handlers::update_group)
                .patch(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    fn service() -> Arc<GroupService> {
        Arc::new(GroupService::new(lazy_pool(), Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = MultipartForm::new().add_text("description", "Weekly study sessions");
        server
            .post("/api/groups")
            .multipart(form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_rejects_non_image_upload() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = MultipartForm::new().add_text("title", "Rustaceans").add_part(
            "image",
            Part::bytes(b"#!/bin/sh".to_vec())
                .file_name("run.sh")
                .mime_type("application/x-sh"),
        );
        let response = server.post("/api/groups").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(body["errors"][0].as_str().unwrap().starts_with("image:"));
    }

    #[tokio::test]
    async fn test_my_groups_requires_authentication() {
        let server = TestServer::new(protected_routes(service())).unwrap();
        server
            .get("/api/my-groups")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

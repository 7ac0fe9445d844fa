use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::features::resources::handlers;
use crate::features::resources::services::ResourceService;
use crate::shared::constants::MAX_RESOURCE_FILE_SIZE;

/// Multipart overhead allowed on top of the file itself
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Public read routes
pub fn routes(service: Arc<ResourceService>) -> Router {
    Router::new()
        .route("/api/resources", get(handlers::list_resources))
        .route("/api/resources/{id}", get(handlers::get_resource))
        .route(
            "/api/resources/{id}/download",
            get(handlers::download_resource),
        )
        .with_state(service)
}

/// Routes that require authentication
pub fn protected_routes(service: Arc<ResourceService>) -> Router {
    Router::new()
        .route("/api/my-resources", get(handlers::my_resources))
        .route("/api/resources", post(handlers::create_resource))
        .route(
            "/api/resources/{id}",
            put(handlers::update_resource)
                .patch(handlers::update_resource)
                .delete(handlers::delete_resource),
        )
        .layer(DefaultBodyLimit::max(MAX_RESOURCE_FILE_SIZE + FORM_OVERHEAD))
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

    fn service() -> Arc<ResourceService> {
        Arc::new(ResourceService::new(lazy_pool(), Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_upload_requires_authentication() {
        let server = TestServer::new(protected_routes(service())).unwrap();
        let form = MultipartForm::new().add_text("title", "Graphs");
        server
            .post("/api/resources")
            .multipart(form)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_requires_title() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = MultipartForm::new().add_text("description", "no title");
        server
            .post("/api/resources")
            .multipart(form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_status() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let form = MultipartForm::new()
            .add_text("title", "Graphs")
            .add_text("status", "deleted")
            .add_part(
                "file",
                Part::bytes(b"%PDF".to_vec())
                    .file_name("g.pdf")
                    .mime_type("application/pdf"),
            );
        server
            .post("/api/resources")
            .multipart(form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_listing_rejects_malformed_filter() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .get("/api/resources")
            .add_query_param("category_id", "not-a-uuid")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

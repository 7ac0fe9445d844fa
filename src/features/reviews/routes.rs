use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::reviews::handlers;
use crate::features::reviews::services::ReviewService;

/// Public routes; visibility depends on the optional caller
pub fn routes(service: Arc<ReviewService>) -> Router {
    Router::new()
        .route("/api/reviews", get(handlers::list_reviews))
        .route("/api/reviews/{id}", get(handlers::get_review))
        .with_state(service)
}

pub fn protected_routes(service: Arc<ReviewService>) -> Router {
    Router::new()
        .route("/api/admin/reviews", get(handlers::admin_list_reviews))
        .route("/api/reviews", post(handlers::create_review))
        .route(
            "/api/reviews/{id}",
            put(handlers::update_review)
                .patch(handlers::update_review)
                .delete(handlers::delete_review),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    fn service() -> Arc<ReviewService> {
        Arc::new(ReviewService::new(lazy_pool(), Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_listing_requires_resource_id() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .get("/api/reviews")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_listing_rejects_unknown_status_filter() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .get("/api/reviews")
            .add_query_param("resource_id", Uuid::now_v7())
            .add_query_param("status", "hidden")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_moderation_listing_is_admin_only() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        server
            .get("/api/admin/reviews")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_short_comment_is_rejected() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let response = server
            .post("/api/reviews")
            .json(&json!({
                "resource_id": Uuid::now_v7(),
                "comment": "meh",
                "rating": "neutral"
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_submitting_requires_authentication() {
        let server = TestServer::new(protected_routes(service())).unwrap();
        server
            .post("/api/reviews")
            .json(&json!({
                "resource_id": Uuid::now_v7(),
                "comment": "a genuinely useful resource",
                "rating": "liked"
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

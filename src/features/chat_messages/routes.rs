use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::chat_messages::handlers;
use crate::features::chat_messages::services::ChatMessageService;

pub fn routes(service: Arc<ChatMessageService>) -> Router {
    Router::new()
        .route("/api/chat-messages", get(handlers::list_chat_messages))
        .with_state(service)
}

pub fn protected_routes(service: Arc<ChatMessageService>) -> Router {
    Router::new()
        .route("/api/chat-messages", post(handlers::create_chat_message))
        .route(
            "/api/chat-messages/{id}",
            put(handlers::update_chat_message)
                .patch(handlers::update_chat_message)
                .delete(handlers::delete_chat_message),
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

    fn service() -> Arc<ChatMessageService> {
        Arc::new(ChatMessageService::new(
            lazy_pool(),
            Arc::new(MemoryStore::default()),
        ))
    }

    #[tokio::test]
    async fn test_listing_requires_group_id() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .get("/api/chat-messages")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        let response = server
            .post("/api/chat-messages")
            .json(&json!({"group_id": Uuid::now_v7(), "message": "   "}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(body["errors"][0].as_str().unwrap().starts_with("message:"));
    }

    #[tokio::test]
    async fn test_sending_requires_authentication() {
        let server = TestServer::new(protected_routes(service())).unwrap();
        server
            .post("/api/chat-messages")
            .json(&json!({"group_id": Uuid::now_v7(), "message": "hello"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_edit_requires_message_text() {
        let server = TestServer::new(with_user_auth(protected_routes(service()))).unwrap();
        server
            .put(&format!("/api/chat-messages/{}", Uuid::now_v7()))
            .json(&json!({"resource_id": null}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

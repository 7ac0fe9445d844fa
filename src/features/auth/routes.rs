use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Public auth routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .with_state(service)
}

/// Protected auth routes (require JWT authentication)
pub fn protected_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/user", get(handlers::get_me))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::auth::TokenService;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use std::time::Duration;

    fn service() -> Arc<AuthService> {
        let tokens = TokenService::new(&AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            issuer: "test".to_string(),
            token_ttl: Duration::from_secs(60),
            jwt_leeway: Duration::from_secs(0),
        });
        Arc::new(AuthService::new(
            lazy_pool(),
            Arc::new(tokens),
            Arc::new(MemoryStore::default()),
        ))
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let server = TestServer::new(public_routes(service())).unwrap();
        let response = server
            .post("/api/register")
            .json(&json!({
                "name": "Sara",
                "email": "sara@example.com",
                "password": "secret1",
                "c_password": "secret2"
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_login_rejects_missing_fields() {
        let server = TestServer::new(public_routes(service())).unwrap();
        server
            .post("/api/login")
            .json(&json!({"email": "sara@example.com"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let server = TestServer::new(public_routes(service())).unwrap();
        server
            .post("/api/login")
            .content_type("application/json")
            .bytes("{not json".into())
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_requires_authentication() {
        let server = TestServer::new(protected_routes(service())).unwrap();
        server
            .get("/api/user")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

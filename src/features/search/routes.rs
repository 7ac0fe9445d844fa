use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::search::handlers;
use crate::features::search::services::SearchService;

pub fn routes(service: Arc<SearchService>) -> Router {
    Router::new()
        .route("/api/ai-search", post(handlers::ai_search))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ai::testing::ScriptedGenerator;
    use crate::modules::storage::MemoryStore;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn service() -> Arc<SearchService> {
        Arc::new(SearchService::new(
            lazy_pool(),
            Arc::new(MemoryStore::default()),
            Arc::new(ScriptedGenerator::new(vec![])),
        ))
    }

    #[tokio::test]
    async fn test_short_query_is_rejected() {
        let server = TestServer::new(routes(service())).unwrap();
        let response = server.post("/api/ai-search").json(&json!({"query": "sql"})).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(body["errors"][0].as_str().unwrap().starts_with("query:"));
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let server = TestServer::new(routes(service())).unwrap();
        server
            .post("/api/ai-search")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

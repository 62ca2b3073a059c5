use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions_active": state.sessions.len(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::scripted_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use courier::providers::factory::ProviderType;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = scripted_state(Vec::new(), dir.path());
        state
            .sessions
            .get_or_create("sess_1", || state.build_agent(ProviderType::Ollama))
            .unwrap();
        let app = routes(state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"status": "ok", "sessions_active": 1}));
    }
}

pub mod dto;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server router.
pub use middleware::require_auth;
pub use rest::{
    analyze_handler, batch_handler, dashboard_handler, get_analysis_handler, health_handler,
    history_handler,
};
pub use ws_handler::ws_handler;

use state::AppState;

/// A batch of 50 maximum-length items fits comfortably.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Builds the application routes. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/detection/analyze", post(analyze_handler))
        .route("/api/detection/batch", post(batch_handler))
        .route("/api/detection/history", get(history_handler))
        .route("/api/detection/{id}", get(get_analysis_handler))
        .route("/api/analytics/dashboard", get(dashboard_handler))
        .route("/api/realtime/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(app_state)
}

/// An in-memory application with one provisioned token, returned alongside.
#[cfg(test)]
pub(crate) fn test_state() -> (Arc<AppState>, String) {
    use crate::adapters::{HeuristicClassifier, SimulatedFeed, StaticTokenIdentity};
    use crate::config::Config;
    use misinfo_core::InMemoryStore;
    use uuid::Uuid;

    let token = "test-token".to_string();
    let mut config = Config::from_lookup(|_| None).expect("defaults are valid");
    config.auth_tokens = vec![(token.clone(), Uuid::new_v4())];

    let state = AppState::assemble(
        Arc::new(config.clone()),
        Arc::new(HeuristicClassifier::new()),
        Arc::new(InMemoryStore::new()),
        Arc::new(StaticTokenIdentity::new(config.auth_tokens)),
        Arc::new(SimulatedFeed::new()),
    );
    (Arc::new(state), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_public() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_routes_require_a_known_token() {
        let (state, token) = test_state();
        let app = router(state);

        let anonymous = app
            .clone()
            .oneshot(Request::get("/api/detection/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let stranger = app
            .clone()
            .oneshot(
                Request::get("/api/detection/history")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(stranger.status(), StatusCode::UNAUTHORIZED);

        let known = app
            .oneshot(
                Request::get("/api/detection/history")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(known.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn analyze_round_trip_over_http() {
        let (state, token) = test_state();
        let response = router(state)
            .oneshot(
                Request::post("/api/detection/analyze")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "content": "URGENT: Government conspiracy exposed by anonymous whistleblower",
                            "sourceUrl": "https://twitter.com/x/status/1"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["prediction"]["classification"], "misinformation");
        assert_eq!(json["fromCache"], false);
        assert_eq!(json["verification"]["sourcesChecked"][0], "https://twitter.com/x/status/1");
    }
}

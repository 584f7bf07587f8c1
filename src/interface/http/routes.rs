use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers::{
    action_handler, dashboard_handler, health_handler, refresh_handler, require_secret, AppState,
};

pub fn create_router(state: AppState) -> Router {
    // Everything except the health check sits behind the shared secret
    let protected = Router::new()
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/actions", post(action_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_secret,
        ));

    Router::new()
        .route("/api/health", get(health_handler))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DirectoryRegistry, MemoryStore, ProcessRunner};
    use crate::application::{ActionService, RefreshService};
    use crate::domain::{DashboardSnapshot, PluginId, Section};
    use crate::interface::http::handlers::SECRET_HEADER;
    use crate::ports::SnapshotStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app_state(secret: Option<&str>) -> AppState {
        let (tx, rx) = watch::channel(false);
        std::mem::forget(tx);
        let registry = Arc::new(DirectoryRegistry::new(
            vec![PathBuf::from("/nonexistent/probemon-http")],
            Vec::new(),
        ));
        let runner = Arc::new(ProcessRunner::new(
            Duration::from_secs(5),
            Duration::from_secs(5),
            Duration::from_secs(1),
            4,
            rx.clone(),
        ));
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let refresh = Arc::new(RefreshService::new(
            registry,
            runner.clone(),
            store.clone(),
            5,
            rx,
        ));
        let actions = Arc::new(ActionService::new(runner, store.clone(), refresh.clone()));
        AppState {
            store,
            actions,
            refresh,
            secret: secret.map(str::to_string),
        }
    }

    fn publish_action(state: &AppState, command: &str) {
        let widget = serde_json::from_value(json!({
            "type": "action_button",
            "data": { "label": "Run", "command": command }
        }))
        .unwrap();
        state.store.publish(DashboardSnapshot::new(
            1,
            vec![Section::ok(PluginId::new("50_actions"), "Actions", vec![widget])],
        ));
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(app_state(None));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_returns_the_latest_snapshot() {
        let state = app_state(None);
        publish_action(&state, "echo hi");
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["generation"], 1);
        assert_eq!(body["sections"][0]["title"], "Actions");
    }

    #[tokio::test]
    async fn unvetted_action_is_forbidden() {
        let app = create_router(app_state(None));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/actions")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{ "command": "echo hi" }"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn vetted_action_runs_and_returns_its_result() {
        let state = app_state(None);
        publish_action(&state, "echo from-http");
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/actions")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{ "command": "echo from-http", "actor": "ops" }"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["exit_code"], 0);
        assert_eq!(body["stdout"], "from-http\n");
        assert_eq!(body["actor"], "ops");
    }

    #[tokio::test]
    async fn refresh_is_accepted() {
        let app = create_router(app_state(None));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn secret_gates_api_routes_but_not_health() {
        let app = create_router(app_state(Some("s3cret")));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .header(SECRET_HEADER, "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .header(SECRET_HEADER, "s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

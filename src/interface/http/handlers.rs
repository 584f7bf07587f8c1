use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::{ActionService, RefreshService};
use crate::domain::{ActionError, ActionRequest};
use crate::ports::SnapshotStore;

pub const SECRET_HEADER: &str = "x-agent-secret";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnapshotStore>,
    pub actions: Arc<ActionService>,
    pub refresh: Arc<RefreshService>,
    /// Shared secret required in the `x-agent-secret` header; `None`
    /// disables auth
    pub secret: Option<String>,
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "probemon"
        })),
    )
}

/// Handler for GET /api/dashboard
pub async fn dashboard_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.store.latest();
    (StatusCode::OK, Json(snapshot.as_ref().clone())).into_response()
}

/// Handler for POST /api/actions
pub async fn action_handler(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Response {
    match state.actions.invoke(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            let status = match err {
                ActionError::NotOffered => StatusCode::FORBIDDEN,
                ActionError::AlreadyRunning => StatusCode::CONFLICT,
                ActionError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// Handler for POST /api/refresh: requests an out-of-band cycle without
/// waiting for it. A cycle already in flight absorbs the request.
pub async fn refresh_handler(State(state): State<AppState>) -> Response {
    let refresh = state.refresh.clone();
    tokio::spawn(async move {
        refresh.refresh().await;
    });
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "refresh requested" })),
    )
        .into_response()
}

/// Middleware requiring the shared secret on protected routes
pub async fn require_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(secret) = &state.secret else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), secret.as_bytes()) => {
            next.run(request).await
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response(),
    }
}

/// Full-width comparison so the secret check leaks no timing signal beyond
/// the length
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_behaves_like_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secre"));
        assert!(constant_time_eq(b"", b""));
    }
}

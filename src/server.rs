//! HTTP surface: health check and the A2A JSON-RPC route

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower::{Layer, ServiceExt};
use tracing::{debug, info};

use crate::{
    agent::AgentRegistry,
    codec::JsonRpcResponse,
    layer::EnvelopeValidationLayer,
    protocol::error::A2AError,
    service::{A2aAdapterService, A2aRequest},
};

/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";
/// A2A JSON-RPC endpoint path.
pub const A2A_AGENT_PATH: &str = "/a2a/agent/:agentId";

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
}

/// Build the application router
pub fn router(registry: Arc<AgentRegistry>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(A2A_AGENT_PATH, post(a2a_agent))
        .with_state(AppState { registry })
}

/// Bind `listener` and serve until the process is stopped
pub async fn serve(listener: TcpListener, registry: Arc<AgentRegistry>) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "listening");
    axum::serve(listener, router(registry)).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn a2a_agent(State(st): State<AppState>, Path(agent_id): Path<String>, body: Bytes) -> Response {
    let req = match A2aRequest::from_body(agent_id, &body) {
        Ok(req) => req,
        Err(e) => return error_response(&e, None),
    };
    let request_id = req.request_id().cloned();
    debug!(agent = %req.agent_id, id = ?request_id, "a2a request");

    let service = EnvelopeValidationLayer::new().layer(A2aAdapterService::new(st.registry));
    match service.oneshot(req).await {
        Ok(resp) => (StatusCode::OK, Json(resp.into_envelope())).into_response(),
        Err(e) => error_response(&e, request_id.as_ref()),
    }
}

fn error_response(error: &A2AError, request_id: Option<&serde_json::Value>) -> Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(JsonRpcResponse::from_error(error, request_id))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use serde_json::Value;

    use super::*;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(AgentRegistry::new()));
        let req = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();

        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unknown_agent_is_404() {
        let app = router(Arc::new(AgentRegistry::new()));
        let (status, body) = send(
            app,
            post_json("/a2a/agent/ghost", r#"{"jsonrpc":"2.0","id":"r-1","method":"message/send"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["id"], "r-1");
        assert_eq!(body["error"]["code"], -32602);
        assert_eq!(body["error"]["message"], "Agent 'ghost' not found");
    }

    #[tokio::test]
    async fn test_envelope_checked_before_agent_lookup() {
        let app = router(Arc::new(AgentRegistry::new()));
        let (status, body) = send(app, post_json("/a2a/agent/ghost", r#"{"jsonrpc":"1.0","id":7}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["id"], 7);
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_500() {
        let app = router(Arc::new(AgentRegistry::new()));
        let (status, body) = send(app, post_json("/a2a/agent/weather-agent", "not json")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32603);
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use shared_client::ReadinessProbe;
use tracing::{Instrument, error, info, warn};

use crate::{metrics, telemetry};
use crate::readiness::{Dependencies, Verdict};

/// Error reply body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Basic reply body: `{"id": ..., "msg": "..."}`, empty fields omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msg: String,
}

impl Message {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            id: None,
            msg: msg.into(),
        }
    }
}

/// Path the metrics endpoint is always served on.
pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathsError {
    #[error("paths: health and ready endpoints are both {0}")]
    Duplicate(String),
    #[error("paths: {0} is reserved for metrics")]
    Reserved(String),
    #[error("paths: {0} is not a literal route path")]
    Invalid(String),
}

/// Routes for the liveness and readiness endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    health: String,
    ready: String,
}

impl Paths {
    /// Custom endpoint paths; a missing leading `/` is added.
    ///
    /// Both paths must be literal (no `{capture}`, `*wildcard` or `:segment`),
    /// distinct from each other, and not [`METRICS_PATH`].
    pub fn new(health: &str, ready: &str) -> Result<Self, PathsError> {
        let (health, ready) = (rooted(health), rooted(ready));
        for path in [&health, &ready] {
            if !is_literal(path) {
                return Err(PathsError::Invalid(path.clone()));
            }
            if path == METRICS_PATH {
                return Err(PathsError::Reserved(path.clone()));
            }
        }
        if health == ready {
            return Err(PathsError::Duplicate(health));
        }
        Ok(Self { health, ready })
    }

    pub fn health(&self) -> &str {
        &self.health
    }

    pub fn ready(&self) -> &str {
        &self.ready
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            health: "/health".to_string(),
            ready: "/ready".to_string(),
        }
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn is_literal(path: &str) -> bool {
    !path.contains(['{', '}', '*']) && !path.split('/').any(|seg| seg.starts_with(':'))
}

/// Build the router.
///
/// Exposes:
/// - `GET {paths.health}` — liveness, always `200 {"msg":"OK"}`
/// - `GET {paths.ready}`  — readiness of every dependency
/// - `GET /metrics`       — Prometheus text format
///
/// Requests are handled inside [`telemetry::app_span`].
pub fn router<P>(deps: Arc<Dependencies<P>>, paths: &Paths) -> Router
where
    P: ReadinessProbe + 'static,
{
    Router::new()
        .route(paths.health(), get(health_handler))
        .route(paths.ready(), get(ready_handler::<P>))
        .route(METRICS_PATH, get(metrics_handler))
        .layer(middleware::from_fn(in_app_span))
        .with_state(deps)
}

async fn in_app_span(req: Request, next: Next) -> Response {
    next.run(req).instrument(telemetry::app_span()).await
}

/// Serve `app` on `0.0.0.0:port` until the listener fails.
pub async fn serve(port: u16, app: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting health server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// JSON reply with `Content-Type: application/json`.
pub fn respond<T: Serialize>(code: StatusCode, payload: &T) -> Response {
    (code, Json(payload)).into_response()
}

/// JSON error reply: `{"error": "<err>"}`.
pub fn respond_error(code: StatusCode, err: &dyn std::fmt::Display) -> Response {
    respond(
        code,
        &ErrorBody {
            error: err.to_string(),
        },
    )
}

async fn health_handler() -> Response {
    let code = StatusCode::OK;
    respond(code, &Message::new(reason(code)))
}

async fn ready_handler<P: ReadinessProbe>(State(deps): State<Arc<Dependencies<P>>>) -> Response {
    match deps.check().await {
        Verdict::Ready => {
            info!(function = "ready", "all dependencies ready");
            respond(StatusCode::OK, &Message::new("Ready"))
        }
        Verdict::Unavailable { dependency } => {
            warn!(function = "ready", %dependency, "dependency not ready");
            let code = StatusCode::SERVICE_UNAVAILABLE;
            respond_error(code, &reason(code))
        }
        Verdict::Failed(err) => {
            error!(function = "ready", error = %err, "dependency unreachable");
            respond_error(StatusCode::BAD_GATEWAY, &err)
        }
    }
}

async fn metrics_handler() -> Response {
    match metrics::render() {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(e) => {
            error!(function = "metrics", error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

fn reason(code: StatusCode) -> &'static str {
    code.canonical_reason().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_to_health_and_ready() {
        let paths = Paths::default();
        assert_eq!(paths.health(), "/health");
        assert_eq!(paths.ready(), "/ready");
    }

    #[test]
    fn paths_gain_leading_slash() {
        let paths = Paths::new("livez", "/readyz").unwrap();
        assert_eq!(paths.health(), "/livez");
        assert_eq!(paths.ready(), "/readyz");
    }

    #[test]
    fn paths_must_differ() {
        assert_eq!(
            Paths::new("status", "/status"),
            Err(PathsError::Duplicate("/status".to_string()))
        );
    }

    #[test]
    fn paths_cannot_take_metrics_route() {
        assert_eq!(
            Paths::new("/health", "metrics"),
            Err(PathsError::Reserved("/metrics".to_string()))
        );
        assert_eq!(
            Paths::new("/metrics", "/ready"),
            Err(PathsError::Reserved("/metrics".to_string()))
        );
    }

    #[test]
    fn paths_must_be_literal() {
        for bad in ["/{id}", "/files/*rest", "/:name", "/a/}"] {
            assert_eq!(
                Paths::new(bad, "/ready"),
                Err(PathsError::Invalid(bad.to_string())),
                "{bad}"
            );
        }
        assert!(Paths::new("/svc/health:v2", "/svc/ready").is_ok());
    }

    #[test]
    fn router_builds_for_any_accepted_paths() {
        let deps = Arc::new(Dependencies::<shared_client::Client>::new(Vec::new()));
        let paths = Paths::new("/", "/svc/ready").unwrap();
        let _ = router(deps, &paths);
    }

    #[test]
    fn message_omits_empty_fields() {
        let json = serde_json::to_value(Message::new("OK")).unwrap();
        assert_eq!(json, serde_json::json!({"msg": "OK"}));

        let json = serde_json::to_value(Message {
            id: Some(serde_json::json!(42)),
            msg: String::new(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": 42}));
    }

    #[test]
    fn respond_error_sets_status_and_content_type() {
        let resp = respond_error(StatusCode::BAD_GATEWAY, &"upstream down");
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            resp.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}

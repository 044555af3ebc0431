//! Gateway HTTP server: LINE webhook, weather push trigger, and health probes.

use crate::bot::{Dispatcher, Outcome};
use crate::config::Config;
use crate::line::WebhookBody;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway (config and dispatcher).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the router. Exposed separately from [`run_gateway`] so callers can supply their own
/// dispatcher (e.g. with fake upstreams).
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/hello", get(hello))
        .route("/webhook", post(line_webhook))
        .route("/push/weather", post(push_weather))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::from_config(&config));
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
        dispatcher,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook — LINE webhook. Always answers 200 so the platform does not redeliver;
/// failures (including an oversized or unreadable body) are reported in the body.
async fn line_webhook(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<serde_json::Value> {
    let body = match body {
        Ok(b) => b,
        Err(e) => {
            log::warn!("webhook: unreadable body: {}", e);
            return Json(json!({ "ok": false, "error": format!("unreadable webhook body: {}", e) }));
        }
    };
    let payload: WebhookBody = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("webhook: undecodable body: {}", e);
            return Json(json!({ "ok": false, "error": format!("invalid webhook body: {}", e) }));
        }
    };
    match state.dispatcher.handle_body(&payload).await {
        Ok(Outcome::Replied(intent)) => {
            log::info!("webhook: replied ({})", intent);
            Json(json!({ "ok": true, "handled": intent }))
        }
        Ok(Outcome::Ignored) => Json(json!({ "ok": true, "handled": null })),
        Err(e) => {
            log::warn!("webhook: dispatch failed: {}", e);
            Json(json!({ "ok": false, "error": e.to_string() }))
        }
    }
}

/// Optional overrides for POST /push/weather; config supplies the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushWeatherRequest {
    to: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// POST /push/weather — look up the weather and push the report. Body is optional JSON.
async fn push_weather(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let req: PushWeatherRequest = if body.is_empty() {
        PushWeatherRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "ok": false, "error": format!("invalid request body: {}", e) })),
                )
            }
        }
    };
    let push = &state.config.push;
    let Some(to) = req.to.or_else(|| push.to.clone()).filter(|t| !t.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "push target not configured (push.to)" })),
        );
    };
    let latitude = req.latitude.unwrap_or(push.latitude);
    let longitude = req.longitude.unwrap_or(push.longitude);
    match state.dispatcher.push_weather(&to, latitude, longitude).await {
        Ok(text) => (StatusCode::OK, Json(json!({ "ok": true, "text": text }))),
        Err(e) => {
            log::warn!("push weather failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

async fn hello() -> &'static str {
    "Hello World!"
}

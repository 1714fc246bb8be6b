// SPDX-License-Identifier: PMPL-1.0-or-later
//! URL fetch proxy.
//!
//! `POST /api/analyze {"url": "..."}` downloads the page, runs the rule
//! engine against it with the page URL as base, and returns the engine's
//! raw JSON result unchanged.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::engine::RuleEngine;
use crate::error::{Error, Result};

const INVALID_URL_MESSAGE: &str = "A valid URL is required in the request body.";
const ANALYSIS_FAILED_MESSAGE: &str = "An error occurred during the analysis.";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub engine: Arc<dyn RuleEngine>,
    /// Return error details and source chains to callers
    pub expose_diagnostics: bool,
}

impl AppState {
    pub fn new(engine: Arc<dyn RuleEngine>, expose_diagnostics: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            engine,
            expose_diagnostics,
        }
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/analyze", post(analyze_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Accessibility Analyzer Backend is running!"
}

/// Extract a plausible URL from a request body
fn requested_url(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let url = value.get("url")?.as_str()?;
    if url.starts_with("http") {
        Some(url.to_string())
    } else {
        None
    }
}

async fn analyze_url(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(url) = requested_url(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": INVALID_URL_MESSAGE })),
        )
            .into_response();
    };

    tracing::info!("Received request to analyze URL: {}", url);

    match fetch_and_analyze(&state, &url).await {
        Ok(result) => Json(result).into_response(),
        Err(Error::UpstreamFetch {
            status: Some(code),
            message,
        }) => {
            tracing::warn!(url = %url, "Upstream returned {}", message);
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                status,
                Json(json!({ "error": format!("Failed to fetch URL: {}", message) })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(url = %url, "Error during analysis: {}", e.chain());
            let mut body = json!({ "error": ANALYSIS_FAILED_MESSAGE });
            if state.expose_diagnostics {
                body["details"] = Value::String(e.to_string());
                body["stack"] = Value::String(e.chain());
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn fetch_and_analyze(state: &AppState, url: &str) -> Result<Value> {
    let response = state.client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or_default();
        return Err(Error::UpstreamFetch {
            status: Some(status.as_u16()),
            message: format!("{} {}", status.as_u16(), reason).trim_end().to_string(),
        });
    }

    let html = response.text().await?;
    tracing::debug!(url = %url, bytes = html.len(), "Fetched page");

    state.engine.run(&html, Some(url)).await
}

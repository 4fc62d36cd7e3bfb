//! Jira forwarding proxy.
//!
//! Jira's REST API rejects credentialed cross-origin calls from a page, so
//! this small HTTP service adds the Basic-auth header server-side and
//! forwards to `https://<domain>/rest/api/2/...`. Four GET routes, all
//! requiring `domain`, `email`, and `apiToken` query parameters.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::Result;

pub const DEFAULT_PROXY_PORT: u16 = 3001;

const DEFAULT_JQL: &str = "assignee = currentUser()";
const DEFAULT_MAX_RESULTS: &str = "50";

#[derive(Clone)]
struct ProxyState {
    http: reqwest::Client,
}

/// Validated request credentials: the scheme-stripped site domain and the
/// ready-to-send Authorization header value.
struct JiraAuth {
    domain: String,
    auth_header: String,
}

/// Build the proxy router with permissive CORS (the original consumer is a
/// browser page on another origin).
pub fn router() -> Router {
    let state = ProxyState {
        http: reqwest::Client::new(),
    };
    Router::new()
        .route("/api/jira/myself", get(myself))
        .route("/api/jira/projects", get(projects))
        .route("/api/jira/search", get(search))
        .route("/api/jira/issue/:key", get(issue))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind on localhost and serve until shutdown.
pub async fn serve(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    log::info!("Jira proxy listening on http://127.0.0.1:{}", port);
    axum::serve(listener, router()).await?;
    Ok(())
}

fn jira_auth(params: &HashMap<String, String>) -> Option<JiraAuth> {
    let domain = params.get("domain").filter(|v| !v.is_empty())?;
    let email = params.get("email").filter(|v| !v.is_empty())?;
    let api_token = params.get("apiToken").filter(|v| !v.is_empty())?;

    Some(JiraAuth {
        domain: strip_scheme(domain).to_string(),
        auth_header: format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", email, api_token))
        ),
    })
}

fn strip_scheme(domain: &str) -> &str {
    domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain)
}

fn missing_params() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "missing required parameters" })),
    )
}

fn server_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "server error" })),
    )
}

/// Forward one GET to the tracker: upstream non-success status passes
/// through with a uniform error body; transport or body failures are a 500.
async fn forward(
    state: &ProxyState,
    auth: &JiraAuth,
    path: &str,
    query: &[(&str, &str)],
) -> (StatusCode, Json<Value>) {
    // The domain came in as a query parameter; refuse anything that does not
    // assemble into a real URL instead of handing reqwest garbage.
    let url = match url::Url::parse(&format!("https://{}/rest/api/2/{}", auth.domain, path)) {
        Ok(url) => url,
        Err(err) => {
            log::warn!("Unusable Jira domain '{}': {}", auth.domain, err);
            return server_error();
        }
    };

    let mut request = state
        .http
        .get(url.clone())
        .header("Authorization", &auth.auth_header)
        .header("Accept", "application/json");
    if !query.is_empty() {
        request = request.query(query);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            log::warn!("Forward to {} failed: {}", url, err);
            return server_error();
        }
    };

    let status = response.status();
    log::info!("Forwarded {} ({})", path, status);
    if !status.is_success() {
        return (
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({ "error": "tracker API error" })),
        );
    }

    match response.json::<Value>().await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(err) => {
            log::warn!("Unreadable response from {}: {}", url, err);
            server_error()
        }
    }
}

async fn myself(
    State(state): State<ProxyState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = match jira_auth(&params) {
        Some(auth) => auth,
        None => return missing_params(),
    };
    forward(&state, &auth, "myself", &[]).await
}

async fn projects(
    State(state): State<ProxyState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = match jira_auth(&params) {
        Some(auth) => auth,
        None => return missing_params(),
    };
    // Jira's collection endpoint is singular.
    forward(&state, &auth, "project", &[]).await
}

async fn search(
    State(state): State<ProxyState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = match jira_auth(&params) {
        Some(auth) => auth,
        None => return missing_params(),
    };
    let jql = params.get("jql").map(String::as_str).unwrap_or(DEFAULT_JQL);
    let max_results = params
        .get("maxResults")
        .map(String::as_str)
        .unwrap_or(DEFAULT_MAX_RESULTS);
    forward(
        &state,
        &auth,
        "search",
        &[("jql", jql), ("maxResults", max_results)],
    )
    .await
}

async fn issue(
    State(state): State<ProxyState>,
    Path(key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = match jira_auth(&params) {
        Some(auth) => auth,
        None => return missing_params(),
    };
    let path = format!("issue/{}", key);
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(fields) = params.get("fields") {
        query.push(("fields", fields));
    }
    forward(&state, &auth, &path, &query).await
}

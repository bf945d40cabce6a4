//! HTTP front door.
//!
//! Thin plumbing: parse request parameters, run the appropriate retrieval
//! flow, serialize the outcome. The only non-200 responses are 400 for
//! missing input and 500 for provisioning exhaustion; retrieval itself always
//! answers 200 with either a real code or the sentinel.

use crate::api::ApiMailClient;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::imap::ImapMailbox;
use crate::poller::Poller;
use crate::provision::Provisioner;
use crate::types::Credentials;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the HTTP handlers.
///
/// Each request builds its own poller/provisioner on top of these; no mutable
/// state is shared between requests.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ServiceConfig>,
    api: ApiMailClient,
    imap: ImapMailbox,
}

impl AppState {
    /// Creates the shared state from a service configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client cannot be constructed.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let api = ApiMailClient::new(&config)?;
        let imap = ImapMailbox::new(&config);

        Ok(Self {
            config: Arc::new(config),
            api,
            imap,
        })
    }
}

/// Builds the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/get-code", get(get_code))
        .route("/create-email", get(create_email))
        .route("/get-code2", get(get_private_code))
        .route("/get-private-code", get(get_private_code))
        .route("/:email/:password", get(get_code_path))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct GetCodeParams {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrivateCodeParams {
    email_user: Option<String>,
    email_pass: Option<String>,
    target_email: Option<String>,
}

async fn get_code(
    State(state): State<AppState>,
    Query(params): Query<GetCodeParams>,
) -> Response {
    let (Some(email), Some(password)) = (params.email, params.password) else {
        return bad_request("email and password query parameters are required");
    };

    resolve_code(&state, Credentials::new(email, password)).await
}

async fn get_code_path(
    State(state): State<AppState>,
    Path((email, password)): Path<(String, String)>,
) -> Response {
    resolve_code(&state, Credentials::new(email, password)).await
}

async fn resolve_code(state: &AppState, credentials: Credentials) -> Response {
    info!(identifier = credentials.identifier(), "code request");

    let poller = Poller::new(state.api.clone(), &state.config);
    let outcome = poller.fetch_code(&credentials).await;

    Json(outcome).into_response()
}

async fn get_private_code(
    State(state): State<AppState>,
    Query(params): Query<PrivateCodeParams>,
) -> Response {
    let (Some(user), Some(pass), Some(target)) =
        (params.email_user, params.email_pass, params.target_email)
    else {
        return bad_request("emailUser, emailPass and targetEmail query parameters are required");
    };

    info!(identifier = %user, target = %target, "private code request");

    let credentials = Credentials::new(user, pass);
    let outcome = state.imap.fetch_code(&credentials, &target).await;

    Json(outcome).into_response()
}

async fn create_email(State(state): State<AppState>) -> Response {
    let provisioner = Provisioner::new(state.api.clone(), &state.config);

    match provisioner.provision().await {
        Ok(mailbox) => {
            info!(address = %mailbox.address, "mailbox created");
            Json(mailbox).into_response()
        }
        Err(err) => {
            error!(error = %err, "mailbox provisioning failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "email": "error",
                    "password": "error",
                    "accountInfo": "error",
                })),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

//! API-based mailbox client.
//!
//! Talks to a mail.tm-style provider over HTTP: credentials are exchanged for
//! a bearer token, messages are listed newest-first, and bodies are fetched
//! lazily per message.
//!
//! The polling-facing operations follow the service's "always respond" policy:
//! failures are logged and collapsed into neutral values (`None` token, empty
//! list, empty body) instead of propagating. The provisioning operations keep
//! typed errors because provisioning is allowed to fail terminally.

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::poller::Mailbox;
use crate::types::{AuthToken, Credentials, MessageSummary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Client for the mailbox provider's HTTP API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiMailClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiMailClient {
    /// Creates a client against the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.http_request)
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// Transport errors and 4xx/5xx responses are logged and collapsed into
    /// `None`; the caller treats that as "cannot poll this mailbox".
    pub async fn authenticate(&self, credentials: &Credentials) -> Option<AuthToken> {
        match self.try_authenticate(credentials).await {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(
                    identifier = credentials.identifier(),
                    error = %err,
                    category = %err.category(),
                    "token request failed"
                );
                None
            }
        }
    }

    /// Lists the mailbox's messages, newest first.
    ///
    /// Any failure is logged and treated as "no messages".
    pub async fn list_messages(&self, token: &AuthToken) -> Vec<MessageSummary> {
        match self.try_list_messages(token).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(error = %err, category = %err.category(), "message listing failed");
                Vec::new()
            }
        }
    }

    /// Fetches one message's body text, falling back to its HTML content.
    ///
    /// Any failure is logged and yields an empty string.
    pub async fn fetch_body(&self, token: &AuthToken, message_id: &str) -> String {
        match self.try_fetch_body(token, message_id).await {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    message_id,
                    error = %err,
                    category = %err.category(),
                    "message fetch failed"
                );
                String::new()
            }
        }
    }

    /// Returns the provider's available mailbox domains.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn domains(&self) -> Result<Vec<String>> {
        let collection: Collection<DomainEntry> = self.get_json("/domains", None).await?;
        Ok(collection
            .member
            .into_iter()
            .map(|entry| entry.domain)
            .collect())
    }

    /// Registers a new mailbox account.
    ///
    /// Returns the provider's raw account object.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn create_account(&self, address: &str, password: &str) -> Result<serde_json::Value> {
        let payload = AccountRequest { address, password };
        self.post_json("/accounts", &payload).await
    }

    async fn try_authenticate(&self, credentials: &Credentials) -> Result<AuthToken> {
        let payload = TokenRequest {
            address: credentials.identifier(),
            password: credentials.secret(),
        };
        let response: TokenResponse = self.post_json("/token", &payload).await?;

        debug!(identifier = credentials.identifier(), "obtained bearer token");

        Ok(AuthToken::new(response.token))
    }

    async fn try_list_messages(&self, token: &AuthToken) -> Result<Vec<MessageSummary>> {
        let collection: Collection<MessageSummary> =
            self.get_json("/messages", Some(token)).await?;

        debug!(count = collection.member.len(), "listed messages");

        Ok(collection.member)
    }

    async fn try_fetch_body(&self, token: &AuthToken, message_id: &str) -> Result<String> {
        let endpoint = format!("/messages/{message_id}");
        let detail: MessageDetail = self.get_json(&endpoint, Some(token)).await?;
        Ok(detail.into_body_text())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&AuthToken>,
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await.map_err(|source| Error::ApiTransport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        Self::decode(endpoint, response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| Error::ApiTransport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Self::decode(endpoint, response).await
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        response.json().await.map_err(|source| Error::ApiDecode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

impl Mailbox for ApiMailClient {
    async fn authenticate(&self, credentials: &Credentials) -> Option<AuthToken> {
        ApiMailClient::authenticate(self, credentials).await
    }

    async fn list_messages(&self, token: &AuthToken) -> Vec<MessageSummary> {
        ApiMailClient::list_messages(self, token).await
    }

    async fn fetch_body(&self, token: &AuthToken, message_id: &str) -> String {
        ApiMailClient::fetch_body(self, token, message_id).await
    }
}

// Wire types for the provider API.

#[derive(Serialize)]
struct TokenRequest<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Hydra collection wrapper used by the provider's list endpoints.
#[derive(Deserialize)]
struct Collection<T> {
    #[serde(rename = "hydra:member", default = "Vec::new")]
    member: Vec<T>,
}

#[derive(Deserialize)]
struct DomainEntry {
    domain: String,
}

#[derive(Serialize)]
struct AccountRequest<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    html: Option<HtmlContent>,
}

/// The provider returns `html` either as a single string or as an array of
/// document fragments.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HtmlContent {
    One(String),
    Many(Vec<String>),
}

impl MessageDetail {
    /// Text content, falling back to HTML when text is absent or empty.
    fn into_body_text(self) -> String {
        if let Some(text) = self.text {
            if !text.is_empty() {
                return text;
            }
        }

        match self.html {
            Some(HtmlContent::One(html)) => html,
            Some(HtmlContent::Many(parts)) => parts.join("\n"),
            None => String::new(),
        }
    }
}

//! Request-scoped data types shared across the mailbox backends.
//!
//! Everything here is transient: credentials arrive with a request, tokens
//! live for one polling sequence, and nothing is persisted.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Mailbox credentials supplied per request.
///
/// The secret is stored as a [`SecretString`] to prevent accidental logging.
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: SecretString,
}

impl Credentials {
    /// Creates credentials from a mailbox address/login and password.
    #[must_use]
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Returns the mailbox address or login.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the password.
    ///
    /// Intentionally the only way to reach the secret, so call sites that
    /// expose it are easy to audit.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Bearer token obtained from the mailbox provider's token endpoint.
///
/// Valid for one polling sequence; discarded afterwards.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

/// Minimal metadata for one message in a mailbox listing.
///
/// The provider returns the collection newest-first; selection logic relies
/// on that order.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSummary {
    /// Provider-assigned message id, used to fetch the body.
    pub id: String,
    /// Sender information.
    #[serde(rename = "from", default)]
    pub sender: Sender,
    /// Message subject.
    #[serde(default)]
    pub subject: String,
}

impl MessageSummary {
    /// Returns the sender address, lowercased for comparisons.
    #[must_use]
    pub fn sender_address(&self) -> String {
        self.sender.address.to_lowercase()
    }
}

/// Sender block of a message summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    /// The sender's address.
    #[serde(default)]
    pub address: String,
}

/// A freshly created disposable mailbox.
///
/// Serializes into the `/create-email` wire shape.
#[derive(Clone, Serialize)]
pub struct ProvisionedMailbox {
    /// The full mailbox address.
    #[serde(rename = "email")]
    pub address: String,
    /// The generated password.
    pub password: String,
    /// Raw account object as returned by the provider.
    #[serde(rename = "accountInfo")]
    pub account: serde_json::Value,
}

impl std::fmt::Debug for ProvisionedMailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedMailbox")
            .field("address", &self.address)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

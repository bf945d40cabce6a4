//! Error types for the mailcode crate.
//!
//! All errors implement [`std::error::Error`] and carry their upstream cause.
//! Per the service's "always respond" policy, most of these never reach the
//! HTTP layer: they are logged where they occur and collapsed into neutral
//! values or a [`CodeOutcome::NotFound`](crate::outcome::CodeOutcome). The
//! typed forms exist for logging, tests, and the provisioning path, which is
//! the one operation allowed to fail terminally.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during code retrieval and mailbox provisioning.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Mailbox provider API (HTTP)
    // ─────────────────────────────────────────────────────────────────────────
    /// Transport-level failure talking to the mailbox provider API.
    #[error("mailbox API request failed: {endpoint}")]
    ApiTransport {
        /// The endpoint path that failed.
        endpoint: String,
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The mailbox provider API answered with a non-success status.
    #[error("mailbox API returned {status} for {endpoint}")]
    ApiStatus {
        /// The endpoint path that failed.
        endpoint: String,
        /// The HTTP status code.
        status: reqwest::StatusCode,
    },

    /// The mailbox provider API answered with a body we could not decode.
    #[error("mailbox API returned an undecodable body for {endpoint}")]
    ApiDecode {
        /// The endpoint path that failed.
        endpoint: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// Mailbox provisioning exhausted its retry budget.
    #[error("mailbox provisioning failed after {attempts} attempts")]
    ProvisionExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<Error>,
    },

    /// The provider's domain list was empty, leaving nothing to register under.
    #[error("mailbox provider returned no usable domains")]
    NoDomains,

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection (mail-server protocol backend)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP protocol
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP login failed.
    #[error("IMAP login failed for {identifier}")]
    ImapLogin {
        /// The mailbox login used.
        identifier: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select mailbox.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP search failed.
    #[error("IMAP search failed")]
    ImapSearch {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP fetch failed.
    #[error("IMAP fetch failed for UID {uid}")]
    ImapFetch {
        /// The UID that failed.
        uid: u32,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to read a fetched message from the stream.
    #[error("failed to read message from fetch stream")]
    FetchMessage {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    ImapLogout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// An IMAP operation exceeded its timeout.
    #[error("IMAP {operation} timed out after {timeout:?}")]
    ImapTimeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Message parsing
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse a raw email message.
    #[error("failed to parse email")]
    ParseEmail {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// Failed to extract a text body from a parsed message.
    #[error("failed to extract email body")]
    ExtractBody {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might
    /// succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ApiTransport { .. }
            | Error::ApiStatus { .. }
            | Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::ConnectTimeout { .. }
            | Error::ImapLogin { .. }
            | Error::SelectMailbox { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::FetchMessage { .. }
            | Error::ImapTimeout { .. } => true,

            Error::InvalidConfig { .. }
            | Error::InvalidDnsName { .. }
            | Error::ApiDecode { .. }
            | Error::ProvisionExhausted { .. }
            | Error::NoDomains
            | Error::ImapLogout { .. }
            | Error::ParseEmail { .. }
            | Error::ExtractBody { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. } | Error::InvalidDnsName { .. } => {
                ErrorCategory::Configuration
            }

            Error::ImapLogin { .. } => ErrorCategory::Auth,

            // Rejected credentials, not a transport fault.
            Error::ApiStatus { status, .. }
                if *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN =>
            {
                ErrorCategory::Auth
            }

            Error::ApiTransport { .. }
            | Error::ApiStatus { .. }
            | Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::ConnectTimeout { .. }
            | Error::ImapTimeout { .. } => ErrorCategory::Transport,

            Error::ProvisionExhausted { .. } | Error::NoDomains => ErrorCategory::Provision,

            Error::SelectMailbox { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::FetchMessage { .. }
            | Error::ImapLogout { .. } => ErrorCategory::Protocol,

            Error::ApiDecode { .. } | Error::ParseEmail { .. } | Error::ExtractBody { .. } => {
                ErrorCategory::Parse
            }
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Bad credentials or unreachable auth endpoint.
    Auth,
    /// Network or timeout errors on any call.
    Transport,
    /// Account creation exhausted its retries.
    Provision,
    /// Mail-server protocol errors.
    Protocol,
    /// Malformed message or response body.
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Auth => write!(f, "auth"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Provision => write!(f, "provision"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Parse => write!(f, "parse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let err = Error::InvalidConfig {
            message: "missing host".into(),
        };
        assert!(!err.is_retryable());

        let err = Error::TcpConnect {
            target: "imap.firstmail.ltd:993".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.is_retryable());

        let err = Error::NoDomains;
        assert!(!err.is_retryable());

        // Exhausted provisioning already consumed its retry budget.
        let err = Error::ProvisionExhausted {
            attempts: 5,
            source: Box::new(Error::NoDomains),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let err = Error::ApiStatus {
            endpoint: "/token".into(),
            status: reqwest::StatusCode::UNAUTHORIZED,
        };
        assert_eq!(err.category(), ErrorCategory::Auth);

        let err = Error::ApiStatus {
            endpoint: "/token".into(),
            status: reqwest::StatusCode::FORBIDDEN,
        };
        assert_eq!(err.category(), ErrorCategory::Auth);

        let err = Error::ApiStatus {
            endpoint: "/messages".into(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.category(), ErrorCategory::Transport);

        let err = Error::ProvisionExhausted {
            attempts: 5,
            source: Box::new(Error::NoDomains),
        };
        assert_eq!(err.category(), ErrorCategory::Provision);

        let err = Error::ConnectTimeout {
            target: "imap.firstmail.ltd:993".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_exhausted_error_keeps_final_cause() {
        let err = Error::ProvisionExhausted {
            attempts: 5,
            source: Box::new(Error::NoDomains),
        };
        let msg = err.to_string();
        assert!(msg.contains("5 attempts"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

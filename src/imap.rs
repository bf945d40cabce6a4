//! Protocol-based mailbox client.
//!
//! Reads a verification code straight off a mail server: one authenticated
//! session per call, ordered as connect → login → select → search → fetch →
//! parse, with the session logged out on every exit path.
//!
//! The operation's contract is "always produces a code-shaped result": guard
//! failures and every connection-, search-, fetch-, or parse-level error
//! resolve to [`CodeOutcome::NotFound`] instead of propagating.

use crate::config::{ServiceConfig, TimeoutConfig};
use crate::connection;
use crate::error::{Error, Result};
use crate::extractor::CodeExtractor;
use crate::outcome::CodeOutcome;
use crate::parser;
use crate::session::{self, ImapSession};
use crate::types::Credentials;
use email_address::EmailAddress;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const INBOX: &str = "INBOX";

/// Client for reading verification codes over the mail-server protocol.
#[derive(Debug, Clone)]
pub struct ImapMailbox {
    host: String,
    port: u16,
    timeouts: TimeoutConfig,
    extractor: CodeExtractor,
}

impl ImapMailbox {
    /// Creates a client against the configured mail server.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            host: config.imap_host.clone(),
            port: config.imap_port,
            timeouts: config.timeouts.clone(),
            extractor: CodeExtractor::new(),
        }
    }

    /// Retrieves a code from the newest message addressed to `target_recipient`.
    ///
    /// Missing credentials or a malformed target short-circuit without
    /// attempting a connection.
    #[instrument(
        name = "ImapMailbox::fetch_code",
        skip_all,
        fields(identifier = credentials.identifier(), target = %target_recipient)
    )]
    pub async fn fetch_code(
        &self,
        credentials: &Credentials,
        target_recipient: &str,
    ) -> CodeOutcome {
        if credentials.identifier().is_empty() || credentials.secret().is_empty() {
            warn!("missing mailbox credentials, resolving without a code");
            return CodeOutcome::NotFound;
        }

        if target_recipient.parse::<EmailAddress>().is_err() {
            warn!("malformed target recipient, resolving without a code");
            return CodeOutcome::NotFound;
        }

        match self.try_fetch_code(credentials, target_recipient).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    error = %err,
                    category = %err.category(),
                    "protocol fetch failed, resolving without a code"
                );
                CodeOutcome::NotFound
            }
        }
    }

    async fn try_fetch_code(
        &self,
        credentials: &Credentials,
        target_recipient: &str,
    ) -> Result<CodeOutcome> {
        let target_addr = format!("{}:{}", self.host, self.port);

        let tls_stream = tokio::time::timeout(
            self.timeouts.connect,
            connection::establish_tls_connection(&self.host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: self.timeouts.connect,
        })??;

        let mut session = with_timeout(
            self.timeouts.auth,
            "login",
            session::authenticate(tls_stream, credentials.identifier(), credentials.secret()),
        )
        .await?;

        // The session is live from here on; every path below must reach the
        // logout.
        let outcome = self.scan_inbox(&mut session, target_recipient).await;
        self.close_session(&mut session).await;

        outcome
    }

    /// Select, search, fetch, parse, extract. Errors propagate to the caller,
    /// which still owns the session teardown.
    async fn scan_inbox(
        &self,
        session: &mut ImapSession,
        target_recipient: &str,
    ) -> Result<CodeOutcome> {
        with_timeout(
            self.timeouts.select,
            "select",
            session::select_mailbox(session, INBOX),
        )
        .await?;

        let uids = with_timeout(
            self.timeouts.fetch,
            "search",
            session::search_by_recipient(session, target_recipient),
        )
        .await?;

        // The most recent match carries the highest UID.
        let Some(uid) = uids.into_iter().max() else {
            debug!("no message addressed to target");
            return Ok(CodeOutcome::NotFound);
        };

        let raw = with_timeout(
            self.timeouts.fetch,
            "fetch",
            session::fetch_raw_message(session, uid),
        )
        .await?;

        let Some(raw) = raw else {
            debug!(uid, "fetched message had no body");
            return Ok(CodeOutcome::NotFound);
        };

        let text = parser::body_text(&raw)?;
        let code = self.extractor.extract(&text).map(str::to_string);

        if code.is_none() {
            debug!(uid, "no code in message body");
        }

        Ok(CodeOutcome::from(code))
    }

    /// Best-effort logout; failures are logged, never propagated.
    async fn close_session(&self, session: &mut ImapSession) {
        match tokio::time::timeout(self.timeouts.logout, session::logout(session)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "session logout failed"),
            Err(_) => warn!(
                timeout_secs = self.timeouts.logout.as_secs(),
                "session logout timed out"
            ),
        }
    }
}

async fn with_timeout<T, F>(duration: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| Error::ImapTimeout {
            operation,
            timeout: duration,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    /// A client pointed at a local listener that accepts nothing; any
    /// connection attempt is observable through the returned listener.
    async fn local_client() -> (ImapMailbox, tokio::net::TcpListener) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServiceConfig::builder()
            .imap_host(addr.ip().to_string())
            .imap_port(addr.port())
            .build()
            .unwrap();
        (ImapMailbox::new(&config), listener)
    }

    async fn assert_no_connection(listener: tokio::net::TcpListener) {
        let accepted =
            tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err(), "guard must not open a connection");
    }

    #[tokio::test]
    async fn test_target_without_at_sign_short_circuits() {
        let (client, listener) = local_client().await;
        let creds = Credentials::new("box@tohru.org", "pw");

        let outcome = client.fetch_code(&creds, "not-an-address").await;

        assert_eq!(outcome, CodeOutcome::NotFound);
        assert_no_connection(listener).await;
    }

    #[tokio::test]
    async fn test_empty_identifier_short_circuits() {
        let (client, listener) = local_client().await;
        let creds = Credentials::new("", "pw");

        let outcome = client.fetch_code(&creds, "target@tohru.org").await;

        assert_eq!(outcome, CodeOutcome::NotFound);
        assert_no_connection(listener).await;
    }

    #[tokio::test]
    async fn test_empty_secret_short_circuits() {
        let (client, listener) = local_client().await;
        let creds = Credentials::new("box@tohru.org", "");

        let outcome = client.fetch_code(&creds, "target@tohru.org").await;

        assert_eq!(outcome, CodeOutcome::NotFound);
        assert_no_connection(listener).await;
    }

    #[tokio::test]
    async fn test_connection_failure_resolves_not_found() {
        // Nothing listens on this port; the refused connection must resolve
        // to the sentinel outcome rather than an error.
        let config = ServiceConfig::builder()
            .imap_host("127.0.0.1")
            .imap_port(1)
            .build()
            .unwrap();
        let mailbox = ImapMailbox::new(&config);
        let creds = Credentials::new("box@tohru.org", "pw");

        let outcome = mailbox.fetch_code(&creds, "target@tohru.org").await;
        assert_eq!(outcome, CodeOutcome::NotFound);
    }
}

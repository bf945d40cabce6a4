//! Polling controller for the API-based mailbox backend.
//!
//! One retrieval sequence walks three states:
//!
//! 1. **Authenticating** — exchange credentials for a session token. Failure
//!    resolves immediately without a code.
//! 2. **Polling** — bounded inbox checks with a fixed inter-attempt delay;
//!    the first extracted code resolves the sequence, skipping any remaining
//!    attempts.
//! 3. **Resolved** — exactly one observable outcome: a real code, or
//!    [`CodeOutcome::NotFound`]. Errors never surface as a distinct result.

use crate::config::ServiceConfig;
use crate::extractor::CodeExtractor;
use crate::outcome::CodeOutcome;
use crate::retry::RetryPolicy;
use crate::types::{AuthToken, Credentials, MessageSummary};
use std::future::Future;
use tracing::{debug, instrument};

/// Read-side seam over a remote mailbox.
///
/// Implementations follow the "always respond" policy: failures collapse into
/// neutral values (`None`, empty list, empty string) rather than errors. The
/// trait exists so the polling controller can be exercised against scripted
/// mailboxes in tests.
pub trait Mailbox: Send + Sync {
    /// Exchanges credentials for a session token, or `None` on any failure.
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Option<AuthToken>> + Send;

    /// Lists messages newest-first; empty on any failure.
    fn list_messages(&self, token: &AuthToken)
        -> impl Future<Output = Vec<MessageSummary>> + Send;

    /// Fetches one message's body text; empty string on any failure.
    fn fetch_body(
        &self,
        token: &AuthToken,
        message_id: &str,
    ) -> impl Future<Output = String> + Send;
}

impl<M: Mailbox> Mailbox for &M {
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Option<AuthToken>> + Send {
        (**self).authenticate(credentials)
    }

    fn list_messages(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Vec<MessageSummary>> + Send {
        (**self).list_messages(token)
    }

    fn fetch_body(
        &self,
        token: &AuthToken,
        message_id: &str,
    ) -> impl Future<Output = String> + Send {
        (**self).fetch_body(token, message_id)
    }
}

/// Bounded-attempt polling over a [`Mailbox`].
#[derive(Debug)]
pub struct Poller<M> {
    mailbox: M,
    policy: RetryPolicy,
    allowed_senders: Vec<String>,
    extractor: CodeExtractor,
}

impl<M: Mailbox> Poller<M> {
    /// Creates a poller with cadence and allow-list from `config`.
    #[must_use]
    pub fn new(mailbox: M, config: &ServiceConfig) -> Self {
        Self::with_policy(
            mailbox,
            RetryPolicy::from(&config.polling),
            config.allowed_senders.clone(),
        )
    }

    /// Creates a poller with an explicit retry policy and allow-list.
    ///
    /// Allow-list entries are compared lowercased; an empty list admits any
    /// sender.
    #[must_use]
    pub fn with_policy(mailbox: M, policy: RetryPolicy, allowed_senders: Vec<String>) -> Self {
        Self {
            mailbox,
            policy,
            allowed_senders: allowed_senders
                .into_iter()
                .map(|sender| sender.to_lowercase())
                .collect(),
            extractor: CodeExtractor::new(),
        }
    }

    /// Runs one retrieval sequence to completion.
    #[instrument(
        name = "Poller::fetch_code",
        skip_all,
        fields(identifier = credentials.identifier())
    )]
    pub async fn fetch_code(&self, credentials: &Credentials) -> CodeOutcome {
        let Some(token) = self.mailbox.authenticate(credentials).await else {
            debug!("authentication failed, resolving without a code");
            return CodeOutcome::NotFound;
        };

        let code = self
            .policy
            .run(|attempt| self.check_inbox(&token, attempt))
            .await;

        CodeOutcome::from(code)
    }

    /// One polling attempt: list, filter, select newest, fetch, extract.
    async fn check_inbox(&self, token: &AuthToken, attempt: u32) -> Option<String> {
        let messages = self.mailbox.list_messages(token).await;
        if messages.is_empty() {
            debug!(attempt, "mailbox is empty");
            return None;
        }

        let Some(candidate) = self.select_candidate(&messages) else {
            debug!(
                attempt,
                total = messages.len(),
                "no message from an allow-listed sender"
            );
            return None;
        };

        debug!(
            attempt,
            message_id = %candidate.id,
            sender = %candidate.sender.address,
            subject = %candidate.subject,
            "checking candidate message"
        );

        let body = self.mailbox.fetch_body(token, &candidate.id).await;
        let code = self.extractor.extract(&body).map(str::to_string);

        if code.is_none() {
            debug!(attempt, message_id = %candidate.id, "no code in message body");
        }

        code
    }

    /// Picks the newest qualifying message.
    ///
    /// The listing is newest-first, so the first message passing the
    /// allow-list filter is the newest qualifying one.
    fn select_candidate<'a>(&self, messages: &'a [MessageSummary]) -> Option<&'a MessageSummary> {
        if self.allowed_senders.is_empty() {
            return messages.first();
        }

        messages
            .iter()
            .find(|message| self.allowed_senders.contains(&message.sender_address()))
    }
}

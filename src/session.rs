//! Mail-server session operations for the protocol-based backend.
//!
//! Thin wrappers over async-imap with typed errors. The caller owns the
//! session lifecycle and is responsible for logging out on every exit path.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for a mail-server session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authenticates to the mail server and returns a session.
#[instrument(name = "session::authenticate", skip_all, fields(identifier = %identifier))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    identifier: &str,
    secret: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("authenticating to mail server");

    client
        .login(identifier, secret)
        .await
        .map_err(|e| Error::ImapLogin {
            identifier: identifier.to_string(),
            source: e.0,
        })
}

/// Selects a mailbox folder (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Searches for messages addressed to `recipient`, returning their UIDs.
#[instrument(name = "session::search_by_recipient", skip(session), fields(recipient = %recipient))]
pub(crate) async fn search_by_recipient(
    session: &mut ImapSession,
    recipient: &str,
) -> Result<Vec<u32>> {
    // Double quotes would terminate the quoted search string early.
    let sanitized = recipient.replace('"', "");
    let query = format!("TO \"{sanitized}\"");

    let uids = session
        .uid_search(&query)
        .await
        .map_err(|source| Error::ImapSearch { source })?;

    let uids: Vec<u32> = uids.into_iter().collect();

    debug!(uid_count = uids.len(), "search complete");

    Ok(uids)
}

/// Fetches the raw RFC822 content of one message by UID.
///
/// Returns `None` when the server answers the fetch without a body.
pub(crate) async fn fetch_raw_message(
    session: &mut ImapSession,
    uid: u32,
) -> Result<Option<Vec<u8>>> {
    debug!(uid, "fetching message");

    let mut stream = session
        .uid_fetch(uid.to_string(), "BODY[]")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?;

    let mut raw = None;
    while let Some(message) = stream.next().await {
        let message = message.map_err(|source| Error::FetchMessage { source })?;
        if let Some(body) = message.body() {
            raw = Some(body.to_vec());
        }
    }

    Ok(raw)
}

/// Logs out from the mail-server session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}

//! # mailcode
//!
//! Retrieves one-time verification codes delivered to disposable mailboxes,
//! exposed over a small HTTP API.
//!
//! Two mailbox backends are supported:
//!
//! - **API-based**: a mail.tm-style provider; credentials are exchanged for a
//!   bearer token and the inbox is polled over HTTP.
//! - **Protocol-based**: a direct IMAP session against a mail server,
//!   searching for messages addressed to a target recipient.
//!
//! Both feed the same extraction step (first 6-digit token in the body) and
//! the same outcome type: [`CodeOutcome::Found`] or [`CodeOutcome::NotFound`],
//! where the latter serializes as the legacy `"111111"` sentinel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailcode::{ApiMailClient, Credentials, Poller, ServiceConfig};
//!
//! # async fn example() -> mailcode::Result<()> {
//! let config = ServiceConfig::builder()
//!     .poll_attempts(5)
//!     .build()?;
//!
//! let client = ApiMailClient::new(&config)?;
//! let poller = Poller::new(client, &config);
//!
//! let credentials = Credentials::new("box@tohru.org", "mv5a63mn");
//! let outcome = poller.fetch_code(&credentials).await;
//! println!("code: {}", outcome.wire_code());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Retrieval follows an "always respond" policy: upstream failures are logged
//! and collapsed into [`CodeOutcome::NotFound`] rather than propagated. The
//! typed [`Error`] surfaces only from configuration and from mailbox
//! provisioning, which is allowed to fail terminally.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod imap;
pub mod outcome;
pub mod poller;
pub mod provision;
pub mod retry;
pub mod types;

// Internal modules
mod connection;
mod parser;
mod session;

// Re-exports for ergonomic API
pub use api::ApiMailClient;
pub use config::{PollingConfig, ProvisionConfig, ServiceConfig, ServiceConfigBuilder, TimeoutConfig};
pub use error::{Error, ErrorCategory, Result};
pub use extractor::CodeExtractor;
pub use http::{create_router, AppState};
pub use imap::ImapMailbox;
pub use outcome::{CodeOutcome, SENTINEL_CODE};
pub use poller::{Mailbox, Poller};
pub use provision::Provisioner;
pub use retry::RetryPolicy;
pub use types::{AuthToken, Credentials, MessageSummary, ProvisionedMailbox, Sender};

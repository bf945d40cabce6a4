//! Service configuration.
//!
//! Use [`ServiceConfigBuilder`] to create a configuration with sensible
//! defaults:
//!
//! ```
//! use mailcode::ServiceConfig;
//!
//! let config = ServiceConfig::builder()
//!     .poll_attempts(10)
//!     .allowed_sender("no-reply@example.com")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Default base URL of the mailbox provider HTTP API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mail.tm";

/// Default mail-server endpoint for the protocol-based backend.
pub const DEFAULT_IMAP_HOST: &str = "imap.firstmail.ltd";

/// Configuration for the code-retrieval service.
///
/// Create using [`ServiceConfig::builder()`]. Credentials are never part of
/// the configuration; they are supplied per request.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the mailbox provider HTTP API.
    pub api_base_url: String,
    /// Mail-server hostname for the protocol-based backend.
    pub imap_host: String,
    /// Mail-server port (default: 993 for implicit TLS).
    pub imap_port: u16,
    /// Sender allow-list, lowercased. Empty means any sender qualifies.
    pub allowed_senders: Vec<String>,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Polling cadence for code retrieval.
    pub polling: PollingConfig,
    /// Retry cadence for mailbox provisioning.
    pub provisioning: ProvisionConfig,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the full mail-server address as "host:port".
    #[must_use]
    pub fn imap_address(&self) -> String {
        format!("{}:{}", self.imap_host, self.imap_port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfigBuilder::default()
            .build()
            .expect("default config is valid")
    }
}

/// Timeout configuration for individual network operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing a TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for mail-server authentication.
    pub auth: Duration,
    /// Timeout for selecting the inbox folder.
    pub select: Duration,
    /// Timeout for search and message fetch operations.
    pub fetch: Duration,
    /// Timeout for session logout.
    pub logout: Duration,
    /// Per-request timeout for the provider HTTP API.
    pub http_request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
            http_request: Duration::from_secs(30),
        }
    }
}

/// Polling cadence for the code-retrieval loop.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Maximum number of inbox checks per request.
    pub attempts: u32,
    /// Delay between consecutive checks.
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(5),
        }
    }
}

/// Retry cadence for mailbox account creation.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Maximum number of account-creation attempts.
    pub attempts: u32,
    /// Delay between consecutive attempts.
    pub interval: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(3),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    api_base_url: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    allowed_senders: Vec<String>,
    timeouts: Option<TimeoutConfig>,
    polling: Option<PollingConfig>,
    provisioning: Option<ProvisionConfig>,
}

impl ServiceConfigBuilder {
    /// Sets the mailbox provider API base URL.
    #[must_use]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the mail-server hostname for the protocol-based backend.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the mail-server port.
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Adds one sender address to the allow-list.
    #[must_use]
    pub fn allowed_sender(mut self, sender: impl Into<String>) -> Self {
        self.allowed_senders.push(sender.into().to_lowercase());
        self
    }

    /// Replaces the sender allow-list.
    #[must_use]
    pub fn allowed_senders<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_senders = senders
            .into_iter()
            .map(|s| s.into().to_lowercase())
            .collect();
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets polling configuration.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the number of inbox checks per request.
    #[must_use]
    pub fn poll_attempts(mut self, attempts: u32) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .attempts = attempts;
        self
    }

    /// Sets the delay between inbox checks.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets provisioning retry configuration.
    #[must_use]
    pub fn provisioning(mut self, provisioning: ProvisionConfig) -> Self {
        self.provisioning = Some(provisioning);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a cadence has zero attempts or an endpoint is empty.
    pub fn build(self) -> Result<ServiceConfig> {
        let api_base_url = self
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if api_base_url.is_empty() {
            return Err(Error::InvalidConfig {
                message: "api_base_url must not be empty".into(),
            });
        }

        let imap_host = self
            .imap_host
            .unwrap_or_else(|| DEFAULT_IMAP_HOST.to_string());
        if imap_host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "imap_host must not be empty".into(),
            });
        }

        let polling = self.polling.unwrap_or_default();
        if polling.attempts == 0 {
            return Err(Error::InvalidConfig {
                message: "polling.attempts must be at least 1".into(),
            });
        }

        let provisioning = self.provisioning.unwrap_or_default();
        if provisioning.attempts == 0 {
            return Err(Error::InvalidConfig {
                message: "provisioning.attempts must be at least 1".into(),
            });
        }

        Ok(ServiceConfig {
            api_base_url,
            imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            allowed_senders: self.allowed_senders,
            timeouts: self.timeouts.unwrap_or_default(),
            polling,
            provisioning,
        })
    }
}

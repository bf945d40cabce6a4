//! Disposable mailbox provisioning.
//!
//! Picks a random domain from the provider's list, generates a random
//! local-part and password, and registers the account, retrying on any
//! failure. This is the one operation in the service allowed to fail
//! terminally; it raises [`Error::ProvisionExhausted`] once the retry budget
//! is spent.

use crate::api::ApiMailClient;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::ProvisionedMailbox;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use std::future::Future;
use tracing::{debug, info, instrument, warn};

const LOCAL_PART_LEN: usize = 10;
const PASSWORD_LEN: usize = 12;

/// Account-creation surface of the mailbox provider API.
///
/// Split out so provisioning retry behavior can be tested against scripted
/// providers.
pub trait AccountApi: Send + Sync {
    /// Returns the provider's available mailbox domains.
    fn domains(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Registers a new mailbox account, returning the raw account object.
    fn create_account(
        &self,
        address: &str,
        password: &str,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}

impl AccountApi for ApiMailClient {
    async fn domains(&self) -> Result<Vec<String>> {
        ApiMailClient::domains(self).await
    }

    async fn create_account(&self, address: &str, password: &str) -> Result<serde_json::Value> {
        ApiMailClient::create_account(self, address, password).await
    }
}

/// Retry wrapper around mailbox-account creation.
#[derive(Debug)]
pub struct Provisioner<A = ApiMailClient> {
    api: A,
    policy: RetryPolicy,
}

impl<A: AccountApi> Provisioner<A> {
    /// Creates a provisioner with the retry cadence from `config`.
    #[must_use]
    pub fn new(api: A, config: &ServiceConfig) -> Self {
        Self::with_policy(api, RetryPolicy::from(&config.provisioning))
    }

    /// Creates a provisioner with an explicit retry policy.
    #[must_use]
    pub fn with_policy(api: A, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Creates a fresh disposable mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProvisionExhausted`] once every attempt has failed,
    /// carrying the final attempt's error as its cause.
    #[instrument(name = "Provisioner::provision", skip_all)]
    pub async fn provision(&self) -> Result<ProvisionedMailbox> {
        let attempts = self.policy.attempts.max(1);

        self.policy
            .run_result(|attempt| self.try_provision(attempt))
            .await
            .map_err(|source| Error::ProvisionExhausted {
                attempts,
                source: Box::new(source),
            })
    }

    /// One provisioning attempt.
    async fn try_provision(&self, attempt: u32) -> Result<ProvisionedMailbox> {
        let result = self.create_random_account().await;

        if let Err(err) = &result {
            warn!(
                attempt,
                error = %err,
                category = %err.category(),
                "provisioning attempt failed"
            );
        }

        result
    }

    async fn create_random_account(&self) -> Result<ProvisionedMailbox> {
        let domains = self.api.domains().await?;

        // Randoms are drawn in a block so the rng is gone before the next
        // suspension point.
        let (address, password) = {
            let mut rng = rand::thread_rng();
            let domain = domains.choose(&mut rng).ok_or(Error::NoDomains)?;
            let local_part = random_alphanumeric(&mut rng, LOCAL_PART_LEN).to_lowercase();
            let password = random_alphanumeric(&mut rng, PASSWORD_LEN);
            (format!("{local_part}@{domain}"), password)
        };

        debug!(address = %address, "registering mailbox account");

        let account = self.api.create_account(&address, &password).await?;

        info!(address = %address, "provisioned disposable mailbox");

        Ok(ProvisionedMailbox {
            address,
            password,
            account,
        })
    }
}

fn random_alphanumeric<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

//! # Subnet Fixtures
//!
//! Helpers that put a subtensor ledger into a known state for tests: create and activate
//! subnets, lease them, fund accounts, tune hyperparameters, register neurons, stake, set
//! weights and swap keys.
//!
//! Every operation follows the same shape. It reads the value it is about to change,
//! returns early if the ledger already holds the target, otherwise submits the call
//! (wrapped in `Sudo.sudo` when the call is privileged), waits for finality and reads
//! the value back to assert the call took effect. Calling a setter twice with the same
//! target submits nothing the second time.
use std::sync::Arc;

use ledger_client::call::Call;
use ledger_client::config::FixtureConfig;
use ledger_client::ledger::{Ledger, SubxtLedger};
use ledger_client::signer::AdminCredential;
use ledger_client::storage::{Reading, StorageKey};
use ledger_client::tx_submitter::{RetryPolicy, TxReceipt, TxSubmitter};
use ledger_client::wait::PollConfig;
use log::debug;
use snafu::ensure;
use subxt_signer::sr25519::Keypair;

use crate::error::{AssertionSnafu, Result};

/// Error handling module.
pub mod error;

/// Subnet registration and activation.
pub mod network;

/// Subnets leased through a crowdloan.
pub mod leasing;

/// Sudo-gated hyperparameter setters.
pub mod hyperparams;

/// Balance funding.
pub mod balances;

/// Neuron registration and weights.
pub mod neurons;

/// Staking and delegation.
pub mod staking;

/// Coldkey and hotkey swaps.
pub mod keys;

/// Calls relayed through `Proxy.proxy`.
pub mod proxy;

/// EVM pallet settings.
pub mod evm;

#[cfg(test)]
mod test_utils;

/// Entry point for all fixture operations against one ledger.
///
/// Carries the administrator credential used for sudo calls, the submitter with its retry
/// policy, and the polling bounds used when an operation has to wait for the chain.
pub struct SubnetFixtures<L> {
    /// Submits and confirms calls.
    submitter: TxSubmitter<L>,
    /// Signs every `Sudo.sudo` envelope.
    admin: AdminCredential,
    /// Bounds for block-height waits.
    poll: PollConfig,
}

impl SubnetFixtures<SubxtLedger> {
    /// Connects to the node named in `config` and loads its admin key.
    pub async fn connect(config: &FixtureConfig) -> Result<Self> {
        let admin = AdminCredential::from_uri(&config.admin_uri)?;
        let ledger = SubxtLedger::connect(&config.rpc_url).await?;
        Ok(Self::new(
            Arc::new(ledger),
            admin,
            config.retry_policy(),
            config.poll_config(),
        ))
    }
}

impl<L: Ledger> SubnetFixtures<L> {
    /// Creates a new `SubnetFixtures` over a shared ledger.
    pub fn new(ledger: Arc<L>, admin: AdminCredential, policy: RetryPolicy, poll: PollConfig) -> Self {
        Self {
            submitter: TxSubmitter::new(ledger, policy),
            admin,
            poll,
        }
    }

    /// The ledger operations read from and submit to.
    pub fn ledger(&self) -> &L {
        self.submitter.ledger()
    }

    /// The administrator credential.
    pub fn admin(&self) -> &AdminCredential {
        &self.admin
    }

    /// The submitter, for calls no fixture covers.
    pub fn submitter(&self) -> &TxSubmitter<L> {
        &self.submitter
    }

    /// Polling bounds used while waiting on the chain.
    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Submits `call` signed by `signer` and waits for finality.
    pub(crate) async fn submit(&self, call: Call, signer: &Keypair) -> Result<TxReceipt> {
        Ok(self.submitter.submit(&call, signer).await?)
    }

    /// Wraps `call` in `Sudo.sudo`, signs it with the admin key and waits for finality.
    pub(crate) async fn sudo(&self, call: Call) -> Result<TxReceipt> {
        Ok(self
            .submitter
            .submit(&Call::sudo(call), self.admin.keypair())
            .await?)
    }

    /// Drives `key` to `target` through a sudo call.
    ///
    /// Skips the submission when the ledger already holds `target`, otherwise submits
    /// `Sudo.sudo(call)` and asserts the value read back afterwards.
    pub(crate) async fn sudo_set(
        &self,
        key: StorageKey,
        target: impl Into<Reading>,
        call: Call,
    ) -> Result<()> {
        let target = target.into();
        if self.ledger().read(&key).await?.as_ref() == Some(&target) {
            debug!("⏭️ {} is already {}, skipping", key, target);
            return Ok(());
        }

        self.sudo(call).await?;
        self.assert_reads(&key, &target).await
    }

    /// Asserts the ledger holds `expected` under `key`.
    pub(crate) async fn assert_reads(&self, key: &StorageKey, expected: &Reading) -> Result<()> {
        let actual = self.ledger().read(key).await?;
        ensure!(
            actual.as_ref() == Some(expected),
            AssertionSnafu {
                what: key.to_string(),
                expected: expected.to_string(),
                actual: describe(actual.as_ref()),
            }
        );
        Ok(())
    }
}

/// Renders an optional reading for assertion messages.
pub(crate) fn describe(reading: Option<&Reading>) -> String {
    match reading {
        Some(reading) => reading.to_string(),
        None => "nothing".to_string(),
    }
}

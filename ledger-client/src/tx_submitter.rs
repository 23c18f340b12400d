//! substrate transaction submitter
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use subxt::utils::H256;
use subxt_signer::sr25519::Keypair;
use tokio::time::sleep;

use crate::call::Call;
use crate::error::{Error, Result};
use crate::ledger::{Ledger, TxOutcome};

/// Attempts made when no policy is configured.
pub const DEFAULT_MAX_ATTEMPTS: usize = 4;

/// Base delay between attempts when no policy is configured.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// How many times a transiently failing submission is retried, and how long to wait
/// between attempts. The wait grows linearly with the attempt number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on attempts, including the first one.
    pub max_attempts: usize,
    /// Delay after the first failed attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Proof that a call was finalized and dispatched successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Block the extrinsic was finalized in.
    pub block_hash: H256,
    /// Attempt that succeeded, starting at 1.
    pub attempts: usize,
}

/// Submits calls to a [`Ledger`] and waits for finality, retrying transient failures.
///
/// Every attempt goes back through [`Ledger::submit`], so the call is signed again with
/// whatever nonce the account has by then.
#[derive(Debug)]
pub struct TxSubmitter<L> {
    /// The ledger transactions go to.
    ledger: Arc<L>,
    /// Retry bound and backoff.
    policy: RetryPolicy,
}

impl<L> Clone for TxSubmitter<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            policy: self.policy,
        }
    }
}

impl<L: Ledger> TxSubmitter<L> {
    /// Creates a new `TxSubmitter` over a shared ledger.
    pub fn new(ledger: Arc<L>, policy: RetryPolicy) -> Self {
        Self { ledger, policy }
    }

    /// The ledger this submitter writes to.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The configured retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Submits `call` signed by `signer` using the configured attempt bound.
    pub async fn submit(&self, call: &Call, signer: &Keypair) -> Result<TxReceipt> {
        self.submit_with_attempts(call, signer, self.policy.max_attempts)
            .await
    }

    /// Submits a transaction with automatic retry logic.
    ///
    /// # Returns
    ///
    /// * `Ok(TxReceipt)` once the call is finalized and dispatched successfully.
    /// * `Err(Error::LedgerRejected)` as soon as the ledger definitively refuses the call,
    ///   either at dispatch or at validation. Such failures are never retried.
    /// * `Err(Error::RetriesExhausted)` when every attempt failed transiently.
    pub async fn submit_with_attempts(
        &self,
        call: &Call,
        signer: &Keypair,
        max_attempts: usize,
    ) -> Result<TxReceipt> {
        let max_attempts = max_attempts.max(1);
        let label = call.label();
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            match self.ledger.submit(call, signer).await {
                TxOutcome::Finalized { block_hash } => {
                    info!(
                        "✅ {} finalized in block {:?} on attempt {}",
                        label, block_hash, attempt
                    );
                    return Ok(TxReceipt {
                        block_hash,
                        attempts: attempt,
                    });
                }
                TxOutcome::DispatchFailed { block_hash, reason } => {
                    error!(
                        "❌ {} failed in block {:?}: {}",
                        label, block_hash, reason
                    );
                    return Err(Error::LedgerRejected {
                        call: label,
                        reason,
                    });
                }
                TxOutcome::SubmissionFailed {
                    reason,
                    transient: false,
                } => {
                    error!("❌ {} was refused: {}", label, reason);
                    return Err(Error::LedgerRejected {
                        call: label,
                        reason,
                    });
                }
                TxOutcome::SubmissionFailed {
                    reason,
                    transient: true,
                } => {
                    if attempt < max_attempts {
                        warn!(
                            "⚠️ Attempt {} of {} failed: {}. Retrying...",
                            attempt, label, reason
                        );
                        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
                        sleep(self.policy.backoff.saturating_mul(factor)).await;
                    }
                    last_reason = reason;
                }
            }
        }

        error!(
            "❌ Failed to submit {} after {} attempts: {}",
            label, max_attempts, last_reason
        );
        Err(Error::RetriesExhausted {
            call: label,
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}

//! Follows a submitted transaction to a terminal status and classifies the result.
use log::{error, info, warn};
use subxt::tx::{TxInBlock, TxProgress, TxStatus};
use subxt::utils::H256;
use subxt::{OnlineClient, PolkadotConfig};

use crate::ledger::TxOutcome;

/// Watches the progress of a submitted transaction until it is finalized, dropped or
/// invalidated, logging each status update along the way.
pub(crate) async fn watch(
    mut progress: TxProgress<PolkadotConfig, OnlineClient<PolkadotConfig>>,
) -> TxOutcome {
    while let Some(event) = progress.next().await {
        match event {
            Ok(TxStatus::Validated) => info!("📄 Transaction has been validated."),
            Ok(TxStatus::Broadcasted { num_peers }) => {
                info!("📡 Transaction broadcasted to {} peers.", num_peers);
            }
            Ok(TxStatus::InBestBlock(details)) => {
                info!(
                    "📦 Transaction is in the best block {:?}",
                    details.block_hash()
                );
            }
            Ok(TxStatus::InFinalizedBlock(details)) => {
                info!(
                    "✅ Transaction finalized in block {:?}",
                    details.block_hash()
                );
                return check_extrinsic_success(details).await;
            }
            Ok(TxStatus::NoLongerInBestBlock) => {
                warn!("⚠️ Transaction is no longer in the best block. It might have been replaced or forked.");
            }
            Ok(TxStatus::Error { message }) => {
                error!("❌ Error while watching transaction progress: {message}");
                return TxOutcome::SubmissionFailed {
                    reason: message,
                    transient: true,
                };
            }
            Ok(TxStatus::Dropped { message }) => {
                error!("❌ Error transaction dropped: {message}");
                let transient = is_transient_message(&message);
                return TxOutcome::SubmissionFailed {
                    reason: message,
                    transient,
                };
            }
            Ok(TxStatus::Invalid { message }) => {
                error!("❌ Error transaction invalid: {message}");
                let transient = is_transient_message(&message);
                return TxOutcome::SubmissionFailed {
                    reason: message,
                    transient,
                };
            }
            Err(err) => {
                error!("❌ Error while watching transaction progress: {}", err);
                return submission_failed(&err);
            }
        }
    }

    warn!("⚠️ Transaction status stream ended before finality.");
    TxOutcome::SubmissionFailed {
        reason: "status stream ended before finality".to_string(),
        transient: true,
    }
}

/// Checks if the transaction (extrinsic) execution was successful.
async fn check_extrinsic_success(
    details: TxInBlock<PolkadotConfig, OnlineClient<PolkadotConfig>>,
) -> TxOutcome {
    let block_hash = details.block_hash();
    finalized_outcome(block_hash, details.wait_for_success().await.map(|_| ()))
}

/// Classifies the dispatch result of an extrinsic in a finalized block.
///
/// Once the block is finalized the extrinsic can never be included again, so failing to
/// read its events is reported as definitive: resubmitting would repeat the call.
fn finalized_outcome(block_hash: H256, result: Result<(), subxt::Error>) -> TxOutcome {
    match result {
        Ok(()) => {
            info!("✅ Extrinsic execution was successful.");
            TxOutcome::Finalized { block_hash }
        }
        Err(subxt::Error::Runtime(dispatch_error)) => {
            error!("❌ Extrinsic execution failed: {}", dispatch_error);
            TxOutcome::DispatchFailed {
                block_hash,
                reason: dispatch_error.to_string(),
            }
        }
        Err(err) => {
            error!("❌ Could not fetch events of finalized extrinsic: {}", err);
            TxOutcome::SubmissionFailed {
                reason: format!("outcome unknown in finalized block {block_hash:?}: {err}"),
                transient: false,
            }
        }
    }
}

/// Classifies a subxt error raised before the transaction reached a terminal status.
pub(crate) fn submission_failed(err: &subxt::Error) -> TxOutcome {
    let reason = err.to_string();
    let transient =
        matches!(err, subxt::Error::Rpc(_) | subxt::Error::Io(_)) || is_transient_message(&reason);
    TxOutcome::SubmissionFailed { reason, transient }
}

/// Whether a pool or rpc message describes a condition a re-signed attempt can get past.
pub(crate) fn is_transient_message(message: &str) -> bool {
    is_stale_nonce_error(message) || is_background_disconnect(message)
}

/// Another transaction from the same account won the nonce race.
fn is_stale_nonce_error(err: &str) -> bool {
    err.contains("Priority is too low")
        || err.contains("Transaction is outdated")
        || err.contains("Stale")
}

/// The websocket under the client went away.
fn is_background_disconnect(err: &str) -> bool {
    err.contains("background task closed")
        || err.contains("connection closed")
        || err.contains("restart required")
}

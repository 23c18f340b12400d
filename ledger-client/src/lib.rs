//! # Subtensor Ledger Client
//!
//! This library provides the plumbing for driving a subtensor ledger from test code:
//! typed extrinsics and storage keys, signed submission with finality tracking and
//! bounded retries, polling for state conditions, and key and address handling.

/// Error handling module.
///
/// Defines a custom error type using the `snafu` crate to provide detailed and structured
/// error messages for various failures encountered when interacting with the blockchain.
pub mod error;

/// Extrinsics understood by the ledger, and the sudo and proxy envelopes around them.
pub mod call;

/// Storage items and runtime constants read back from the ledger.
pub mod storage;

/// The ledger abstraction and its subxt backed implementation.
pub mod ledger;

/// Reconnecting RPC client construction.
pub mod client;

/// Cryptographic signer module.
///
/// Provides functionality for loading substrate keys from disks and secret uris, and the
/// admin credential used for sudo calls.
pub mod signer;

/// Transaction submission module.
///
/// Manages the process of submitting transactions, handling retries and waiting for
/// finality.
pub mod tx_submitter;

/// Tx progress tracking
pub(crate) mod tx_progress;

/// Polling helpers
pub mod wait;

/// ss58 and EVM address handling.
pub mod address;

/// TAO units
pub mod units;

/// Fixture configuration.
pub mod config;

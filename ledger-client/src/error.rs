use std::time::Duration;

use snafu::Snafu;

/// Represents errors that can occur while talking to the ledger, loading keys,
/// and submitting transactions.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Error when reading a substrate key from a file.
    #[snafu(display("Failed to read substrate key from file '{}': {}", path, source))]
    KeyFileRead {
        /// The path of the key file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Error when parsing a key from a hexadecimal string.
    #[snafu(display("Failed to parse key as hex: {}", source))]
    KeyParse {
        /// The underlying hex parsing error.
        source: hex::FromHexError,
    },

    /// Error when the parsed key length is invalid.
    ///
    /// sr25519 secret keys must be exactly 32 bytes long.
    #[snafu(display("Invalid key length: expected 32 bytes, got {}", length))]
    InvalidKeyLength {
        /// The actual length of the provided key.
        length: usize,
    },

    /// Error when failing to create a keypair from a secret key or uri.
    #[snafu(display("Failed to create keypair: {}", source))]
    KeypairCreation {
        /// The underlying signer error.
        source: subxt_signer::sr25519::Error,
    },

    /// The secret uri could not be parsed.
    #[snafu(display("Invalid secret uri: {}", source))]
    SecretUri {
        /// The underlying parse error.
        source: subxt_signer::SecretUriError,
    },

    /// An EVM address was not 20 hex encoded bytes.
    #[snafu(display("Invalid EVM address '{}'", address))]
    InvalidEthAddress {
        /// The rejected input.
        address: String,
    },

    /// An ss58 address could not be decoded.
    #[snafu(display("Invalid ss58 address '{}'", address))]
    InvalidSs58Address {
        /// The rejected input.
        address: String,
    },

    /// A token amount does not fit in the ledger balance type.
    #[snafu(display("Amount of {} TAO overflows the balance type", amount))]
    AmountOverflow {
        /// The amount in whole TAO.
        amount: u64,
    },

    /// Error when attempting to connect to the chain.
    #[snafu(display("Error connecting to chain: {source}"))]
    ChainConnection {
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// Error when the reconnecting rpc client cannot be built.
    #[snafu(display("Error building rpc client for {url}: {message}"))]
    RpcClient {
        /// Target url.
        url: String,
        /// Error reported by the rpc client builder.
        message: String,
    },

    /// Error when reading a storage entry.
    #[snafu(display("Error reading {key}: {source}"))]
    Storage {
        /// Human readable storage key.
        key: String,
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// Error when reading a runtime constant.
    #[snafu(display("Error reading constant {key}: {source}"))]
    Constant {
        /// Human readable constant key.
        key: String,
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// Error when reading the latest block.
    #[snafu(display("Error fetching latest block: {source}"))]
    LatestBlock {
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// A value read from the ledger could not be decoded.
    #[snafu(display("Error decoding {key}: {message}"))]
    Decode {
        /// Human readable storage or constant key.
        key: String,
        /// Decoder message.
        message: String,
    },

    /// A value read from the ledger did not have the expected shape.
    #[snafu(display("Unexpected value for {key}: expected {expected}"))]
    UnexpectedValue {
        /// Human readable storage key.
        key: String,
        /// What the caller expected to find.
        expected: &'static str,
    },

    /// The ledger definitively refused the transaction. Not retried.
    #[snafu(display("Ledger rejected {call}: {reason}"))]
    LedgerRejected {
        /// Name of the rejected call.
        call: String,
        /// Reason reported by the ledger.
        reason: String,
    },

    /// Every attempt ended in a transient submission failure.
    #[snafu(display("Gave up on {call} after {attempts} attempts: {reason}"))]
    RetriesExhausted {
        /// Name of the call.
        call: String,
        /// Number of attempts made.
        attempts: usize,
        /// Reason of the last failure.
        reason: String,
    },

    /// A polled condition did not hold before the deadline.
    #[snafu(display("Timed out after {:?} waiting for {what}", waited))]
    Timeout {
        /// Description of the awaited condition.
        what: String,
        /// How long we waited.
        waited: Duration,
    },

    /// Configuration could not be parsed from the environment.
    #[snafu(display("Invalid configuration: {source}"))]
    ConfigParse {
        /// The underlying clap error.
        source: clap::Error,
    },
}

/// Type alias for results that return a `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

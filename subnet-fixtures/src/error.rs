use snafu::Snafu;

/// Errors surfaced by fixture operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Talking to the ledger failed: a read, a submission that was rejected or ran out
    /// of attempts, or a wait that timed out.
    #[snafu(context(false), display("{source}"))]
    Ledger {
        /// The underlying ledger client error.
        source: ledger_client::error::Error,
    },

    /// The ledger accepted the call but the state read back afterwards is not what the
    /// call should have produced.
    #[snafu(display("Assertion failed on {what}: expected {expected}, got {actual}"))]
    Assertion {
        /// What was read back.
        what: String,
        /// What the call should have left behind.
        expected: String,
        /// What was actually found.
        actual: String,
    },
}

/// Type alias for results that return a `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

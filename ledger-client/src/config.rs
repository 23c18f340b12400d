//! Connection and timing settings for fixture runs.
use std::time::Duration;

use clap::{Args, Parser};
use snafu::ResultExt;
use url::Url;

use crate::error::{ConfigParseSnafu, Result};
use crate::tx_submitter::RetryPolicy;
use crate::wait::PollConfig;

/// Where the ledger lives, who administers it, and how patiently to talk to it.
///
/// Every field can be set on the command line or through its `FIXTURES_*` environment
/// variable.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct FixtureConfig {
    /// WebSocket URL of the subtensor node
    #[arg(long, env = "FIXTURES_RPC_URL", default_value = "ws://127.0.0.1:9944")]
    pub rpc_url: Url,

    /// Secret uri of the sudo key (e.g. //Alice)
    #[arg(long, env = "FIXTURES_ADMIN_URI", default_value = "//Alice")]
    pub admin_uri: String,

    /// Submission attempts before giving up on transient failures
    #[arg(long, env = "FIXTURES_MAX_ATTEMPTS", default_value_t = 4)]
    pub max_attempts: usize,

    /// Base delay between submission attempts, in milliseconds
    #[arg(long, env = "FIXTURES_RETRY_BACKOFF_MS", default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Delay between two polls of chain state, in milliseconds
    #[arg(long, env = "FIXTURES_POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// How long to poll chain state before giving up, in seconds
    #[arg(long, env = "FIXTURES_POLL_TIMEOUT_SECS", default_value_t = 600)]
    pub poll_timeout_secs: u64,
}

/// Standalone parser so the settings can be loaded without a host CLI.
#[derive(Parser, Debug)]
#[command(name = "subnet-fixtures")]
struct FixtureCli {
    /// Flattened settings.
    #[command(flatten)]
    config: FixtureConfig,
}

impl FixtureConfig {
    /// Loads the settings from `FIXTURES_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::try_parse_from(["subnet-fixtures"])
    }

    /// Parses the settings from command line style arguments. The first item is the
    /// program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        FixtureCli::try_parse_from(args)
            .map(|cli| cli.config)
            .context(ConfigParseSnafu)
    }

    /// Retry policy for submissions.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Polling bounds for state waits.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn flags_override_defaults() {
        let config = FixtureConfig::try_parse_from([
            "subnet-fixtures",
            "--rpc-url",
            "ws://10.0.0.2:9945",
            "--admin-uri",
            "//Bob",
            "--max-attempts",
            "2",
            "--retry-backoff-ms",
            "100",
            "--poll-interval-ms",
            "250",
            "--poll-timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(config.rpc_url.as_str(), "ws://10.0.0.2:9945/");
        assert_eq!(config.admin_uri, "//Bob");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                max_attempts: 2,
                backoff: Duration::from_millis(100),
            }
        );
        assert_eq!(
            config.poll_config(),
            PollConfig {
                interval: Duration::from_millis(250),
                timeout: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = FixtureConfig::try_parse_from(["subnet-fixtures", "--rpc-url", "not a url"])
            .unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        let err = FixtureConfig::try_parse_from(["subnet-fixtures", "--max-attempts", "-1"])
            .unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}

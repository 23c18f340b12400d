//! Polling for conditions on external state.
use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::time::{sleep, Instant};

use crate::error::{Error, Result};

/// Default delay between two evaluations of a condition.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on how long a condition is polled.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// How often a condition is evaluated and for how long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between evaluations.
    pub interval: Duration,
    /// Deadline measured from the first evaluation.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Evaluates `condition` until it returns `true`, sleeping `poll.interval` in between.
///
/// Errors from the condition end the wait immediately. If it still does not hold once
/// `poll.timeout` has passed, returns [`Error::Timeout`]. The condition is always
/// evaluated at least once, so a zero timeout checks it exactly once. A timeout too large
/// to represent as an instant means there is no deadline.
pub async fn wait_until<F, Fut>(poll: &PollConfig, what: &str, mut condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let started = Instant::now();
    let deadline = started.checked_add(poll.timeout);

    loop {
        if condition().await? {
            debug!("{what} after {:?}", started.elapsed());
            return Ok(());
        }

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                return Err(Error::Timeout {
                    what: what.to_string(),
                    waited: now - started,
                });
            }
            Some(deadline) => poll.interval.min(deadline - now),
            None => poll.interval,
        };

        sleep(pause).await;
    }
}

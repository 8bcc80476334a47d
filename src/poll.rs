//! Bounded decision polling.
//!
//! The loop is a small state machine: each cycle sleeps for the configured
//! interval, fetches the decision once, and either finishes on a terminal
//! verdict, retries on pending/transient results while budget remains, or
//! fails on a non-transient error. Polling is strictly sequential — the
//! inter-attempt delay is intentional backpressure on the provider, not a
//! parallelism opportunity — and every wait is bounded by the same attempt
//! budget, so an abandoned run never leaks a background poll.

use std::time::Duration;

use tracing::{debug, warn};

use crate::Result;
use crate::client::SessionClient;
use crate::decision::{self, DecisionEnvelope};
use crate::error::Error;
use crate::types::SessionId;

/// Attempt budget and pacing for decision polling.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    /// Production default: 10 attempts, several seconds apart.
    fn default() -> Self {
        PollPolicy {
            max_attempts: 10,
            interval: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        let policy = PollPolicy {
            max_attempts,
            interval,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::validation("poll policy requires at least one attempt"));
        }
        Ok(())
    }
}

/// What one bounded polling run produced.
///
/// `exhausted` with no terminal decision is a deferred-result signal, not an
/// error; the caller can resume out-of-band with the session id alone.
#[derive(Clone, Debug)]
pub struct PollOutcome {
    pub terminal: Option<DecisionEnvelope>,
    pub attempts_used: u32,
    pub exhausted: bool,
}

/// Polls the decision endpoint until a terminal verdict or budget
/// exhaustion. Never issues more than `policy.max_attempts` fetches.
pub(crate) async fn poll_decision(
    client: &SessionClient,
    session: &SessionId,
    policy: &PollPolicy,
) -> Result<PollOutcome> {
    policy.validate()?;

    let mut attempts = 0u32;
    while attempts < policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        attempts += 1;

        match client.fetch_decision(session).await {
            Ok(raw) => {
                let envelope = decision::normalize(raw);
                if envelope.status.is_terminal() {
                    debug!(
                        session_id = %session,
                        status = %envelope.status,
                        attempt = attempts,
                        "terminal decision received"
                    );
                    return Ok(PollOutcome {
                        terminal: Some(envelope),
                        attempts_used: attempts,
                        exhausted: false,
                    });
                }
                debug!(
                    session_id = %session,
                    status = %envelope.status,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    "decision not ready"
                );
            }
            Err(err) if err.is_transient() && attempts < policy.max_attempts => {
                warn!(
                    session_id = %session,
                    attempt = attempts,
                    error = %err,
                    "transient decision fetch failure, will retry"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(PollOutcome {
        terminal: None,
        attempts_used: attempts,
        exhausted: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    #[test]
    fn zero_attempt_budget_is_rejected() {
        let err = PollPolicy::new(0, Duration::from_secs(1)).expect_err("must reject");
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn default_policy_paces_in_seconds() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert!(policy.interval >= Duration::from_secs(2));
        assert!(policy.validate().is_ok());
    }
}

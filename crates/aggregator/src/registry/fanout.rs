//! Concurrent fan-out with a global deadline.
//!
//! Every call of one logical request is started at once and polled together.
//! Each call owns a slot indexed by its declaration position, so the output
//! order is fixed no matter which call completes first. When the deadline
//! passes, unfinished calls are dropped and reported as timeouts.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::config::FetchPolicy;
use crate::errors::RetryClass;
use crate::models::{ProviderFailure, ProviderId};

type Attempt<'a, T> = Box<dyn Fn() -> BoxFuture<'a, Result<T, ProviderFailure>> + Send + Sync + 'a>;

/// One provider's share of a fan-out.
///
/// Holds a factory rather than a single future so the call can be re-issued
/// when retries are enabled.
pub struct ProviderCall<'a, T> {
    provider: ProviderId,
    attempt: Attempt<'a, T>,
}

impl<'a, T> ProviderCall<'a, T> {
    pub fn new<F>(provider: ProviderId, attempt: F) -> Self
    where
        F: Fn() -> BoxFuture<'a, Result<T, ProviderFailure>> + Send + Sync + 'a,
    {
        Self {
            provider,
            attempt: Box::new(attempt),
        }
    }
}

/// Per-call state machine. `Pending` is the only non-terminal state.
#[derive(Debug)]
pub enum CallState<T> {
    Pending,
    Succeeded(T),
    Failed(ProviderFailure),
    TimedOut,
}

impl<T> CallState<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallState::Pending)
    }
}

/// Final state of one call plus bookkeeping for diagnostics.
#[derive(Debug)]
pub struct CallOutcome<T> {
    pub provider: ProviderId,
    pub state: CallState<T>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl<T> CallOutcome<T> {
    /// Collapse into a result, turning a deadline miss into a `Timeout` failure.
    pub fn into_result(self, deadline: Duration) -> Result<T, ProviderFailure> {
        match self.state {
            CallState::Succeeded(value) => Ok(value),
            CallState::Failed(failure) => Err(failure),
            CallState::TimedOut | CallState::Pending => Err(ProviderFailure::timeout(
                self.provider,
                format!("No response within the {}ms request deadline", deadline.as_millis()),
            )),
        }
    }
}

/// Runs provider calls concurrently under a [`FetchPolicy`].
#[derive(Clone, Debug)]
pub struct FanOut {
    policy: FetchPolicy,
}

impl FanOut {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Run every call and return one outcome per call, in input order.
    pub async fn run<'a, T: Send + 'a>(&self, calls: Vec<ProviderCall<'a, T>>) -> Vec<CallOutcome<T>> {
        let started = Instant::now();
        let deadline = started + self.policy.deadline;

        let mut outcomes: Vec<CallOutcome<T>> = calls
            .iter()
            .map(|call| CallOutcome {
                provider: call.provider.clone(),
                state: CallState::Pending,
                attempts: 0,
                elapsed: Duration::ZERO,
            })
            .collect();

        let mut in_flight: FuturesUnordered<_> = calls
            .iter()
            .enumerate()
            .map(|(index, call)| async move {
                let (result, attempts) = self.call_with_retries(call, deadline).await;
                (index, result, attempts)
            })
            .collect();

        loop {
            match timeout_at(deadline, in_flight.next()).await {
                Ok(Some((index, result, attempts))) => {
                    let slot = &mut outcomes[index];
                    slot.attempts = attempts;
                    slot.elapsed = started.elapsed();
                    slot.state = match result {
                        Ok(value) => CallState::Succeeded(value),
                        Err(failure) => {
                            debug!("{} failed after {} attempt(s): {}", slot.provider, attempts, failure);
                            CallState::Failed(failure)
                        }
                    };
                }
                Ok(None) => break,
                Err(_) => {
                    let pending: Vec<&str> = outcomes
                        .iter()
                        .filter(|o| !o.state.is_terminal())
                        .map(|o| o.provider.as_ref())
                        .collect();
                    warn!(
                        "Request deadline of {:?} elapsed, abandoning {:?}",
                        self.policy.deadline, pending
                    );
                    break;
                }
            }
        }

        // Dropping the remaining futures abandons their in-flight requests
        drop(in_flight);

        for outcome in outcomes.iter_mut().filter(|o| !o.state.is_terminal()) {
            outcome.state = CallState::TimedOut;
            outcome.attempts = outcome.attempts.max(1);
            outcome.elapsed = started.elapsed();
        }

        outcomes
    }

    async fn call_with_retries<T>(
        &self,
        call: &ProviderCall<'_, T>,
        deadline: Instant,
    ) -> (Result<T, ProviderFailure>, u32) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = match self.policy.provider_timeout {
                Some(limit) => match timeout(limit, (call.attempt)()).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderFailure::timeout(
                        call.provider.clone(),
                        format!("Attempt exceeded {}ms", limit.as_millis()),
                    )),
                },
                None => (call.attempt)().await,
            };

            match result {
                Err(failure)
                    if failure.reason.retry_class() == RetryClass::Transient
                        && attempts <= self.policy.retries
                        && Instant::now() < deadline =>
                {
                    debug!(
                        "Retrying {} after transient failure ({})",
                        call.provider, failure.reason
                    );
                }
                other => return (other, attempts),
            }
        }
    }
}

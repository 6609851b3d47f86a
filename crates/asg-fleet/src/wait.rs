//! Bounded polling of remote resources.
//!
//! Every stage that has to wait for a resource (image, load balancer, auto
//! scaling group) goes through [`wait_until_ready`]: fetch the current state,
//! classify it, and either return, fail, or sleep one tick and try again
//! until the deadline.

use crate::aws::ControlPlaneError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long to wait for a resource and how often to look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum time to wait before giving up
    pub timeout: Duration,
    /// Fixed delay between two fetches
    pub tick: Duration,
}

/// Classification of one observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T> {
    /// Not there yet, check again after a tick
    Pending,
    /// Usable; polling stops with this value
    Ready(T),
    /// The resource will never become ready; carries the observed state
    Failed(String),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("timed out after {timeout:?} waiting for {resource} ({attempts} attempts)")]
    Timeout {
        resource: String,
        timeout: Duration,
        attempts: u32,
    },

    #[error("{resource} reached unexpected state {state:?}")]
    TerminalState { resource: String, state: String },

    #[error("cannot check the state of {resource}")]
    Fatal {
        resource: String,
        #[source]
        source: ControlPlaneError,
    },
}

/// Poll `fetch` until `classify` reports the resource ready or failed, or
/// until `policy.timeout` has elapsed.
///
/// Transient fetch errors are logged and retried on the normal tick; they
/// neither abort the wait nor change the deadline. Any other fetch error is
/// returned immediately as [`PollError::Fatal`].
///
/// # Example
/// ```ignore
/// let image = wait_until_ready(
///     policy,
///     &image_id,
///     || plane.image_state(&image_id),
///     |state| match state {
///         ImageState::Available => Readiness::Ready(()),
///         ImageState::Pending => Readiness::Pending,
///         other => Readiness::Failed(other.to_string()),
///     },
/// )
/// .await?;
/// ```
pub async fn wait_until_ready<S, T, F, Fut, C>(
    policy: PollPolicy,
    resource: &str,
    mut fetch: F,
    mut classify: C,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, ControlPlaneError>>,
    C: FnMut(S) -> Readiness<T>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempts = 0u32;

    while Instant::now() < deadline {
        attempts += 1;

        match fetch().await {
            Ok(state) => match classify(state) {
                Readiness::Ready(value) => {
                    debug!(resource = %resource, attempts, "Resource ready");
                    return Ok(value);
                }
                Readiness::Failed(state) => {
                    return Err(PollError::TerminalState {
                        resource: resource.to_string(),
                        state,
                    });
                }
                Readiness::Pending => {
                    debug!(
                        resource = %resource,
                        attempt = attempts,
                        tick = ?policy.tick,
                        "Resource not ready, retrying"
                    );
                }
            },
            Err(e) if e.is_transient() => {
                warn!(
                    resource = %resource,
                    attempt = attempts,
                    error = %e,
                    "Cannot fetch resource state, retrying"
                );
            }
            Err(e) => {
                return Err(PollError::Fatal {
                    resource: resource.to_string(),
                    source: e,
                });
            }
        }

        tokio::time::sleep(policy.tick).await;
    }

    Err(PollError::Timeout {
        resource: resource.to_string(),
        timeout: policy.timeout,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsError;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn policy(timeout_secs: u64) -> PollPolicy {
        PollPolicy {
            timeout: Duration::from_secs(timeout_secs),
            tick: Duration::from_secs(1),
        }
    }

    fn classify(state: &'static str) -> Readiness<()> {
        match state {
            "available" => Readiness::Ready(()),
            "pending" => Readiness::Pending,
            other => Readiness::Failed(other.to_string()),
        }
    }

    fn throttled() -> ControlPlaneError {
        ControlPlaneError::call("DescribeImages", AwsError::Throttled)
    }

    /// Replays `script` one fetch at a time, repeating the last entry.
    struct Script {
        steps: RefCell<VecDeque<Result<&'static str, ControlPlaneError>>>,
        fetches: RefCell<u32>,
    }

    impl Script {
        fn new(steps: Vec<Result<&'static str, ControlPlaneError>>) -> Self {
            Self {
                steps: RefCell::new(steps.into()),
                fetches: RefCell::new(0),
            }
        }

        async fn fetch(&self) -> Result<&'static str, ControlPlaneError> {
            *self.fetches.borrow_mut() += 1;
            let mut steps = self.steps.borrow_mut();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                match steps.front().unwrap() {
                    Ok(state) => Ok(*state),
                    Err(_) => Err(throttled()),
                }
            }
        }

        fn fetches(&self) -> u32 {
            *self.fetches.borrow()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_pending_states() {
        let script = Script::new(vec![Ok("pending"), Ok("pending"), Ok("available")]);
        let start = Instant::now();

        let result = wait_until_ready(policy(3), "ami-1", || script.fetch(), classify).await;

        assert!(result.is_ok());
        assert_eq!(script.fetches(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_does_not_abort() {
        let script = Script::new(vec![
            Ok("pending"),
            Err(throttled()),
            Ok("pending"),
            Ok("available"),
        ]);

        let result = wait_until_ready(policy(4), "ami-1", || script.fetch(), classify).await;

        assert!(result.is_ok());
        assert_eq!(script.fetches(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_does_not_shorten_deadline() {
        let script = Script::new(vec![Err(throttled()), Ok("pending")]);

        let result = wait_until_ready(policy(5), "ami-1", || script.fetch(), classify).await;

        match result {
            Err(PollError::Timeout { attempts, timeout, .. }) => {
                assert_eq!(attempts, 5);
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_stops_immediately() {
        let script = Script::new(vec![Ok("failed"), Ok("available")]);

        let result = wait_until_ready(policy(10), "ami-1", || script.fetch(), classify).await;

        match result {
            Err(PollError::TerminalState { resource, state }) => {
                assert_eq!(resource, "ami-1");
                assert_eq!(state, "failed");
            }
            other => panic!("expected terminal state, got {other:?}"),
        }
        assert_eq!(script.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_pending_times_out() {
        let script = Script::new(vec![Ok("pending")]);
        let start = Instant::now();

        let result = wait_until_ready(policy(3), "ami-1", || script.fetch(), classify).await;

        assert!(matches!(result, Err(PollError::Timeout { attempts: 3, .. })));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cardinality_error_is_fatal() {
        let fetches = RefCell::new(0u32);
        let result: Result<(), PollError> = wait_until_ready(
            policy(10),
            "ami-1",
            || {
                *fetches.borrow_mut() += 1;
                async {
                    Err::<&'static str, _>(ControlPlaneError::Cardinality {
                        operation: "DescribeImages",
                        resource: "image",
                        id: "ami-1".to_string(),
                        count: 0,
                    })
                }
            },
            classify,
        )
        .await;

        assert!(matches!(result, Err(PollError::Fatal { .. })));
        assert_eq!(*fetches.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_never_fetches() {
        let script = Script::new(vec![Ok("available")]);
        let result = wait_until_ready(
            PollPolicy {
                timeout: Duration::ZERO,
                tick: Duration::ZERO,
            },
            "ami-1",
            || script.fetch(),
            classify,
        )
        .await;

        assert!(matches!(result, Err(PollError::Timeout { attempts: 0, .. })));
        assert_eq!(script.fetches(), 0);
    }
}

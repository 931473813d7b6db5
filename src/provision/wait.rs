//! # Operation and Running-State Waiters
//!
//! Every create call against the control plane returns an operation handle,
//! not a completed resource. [`wait_for_operation`] polls the operation on a
//! fixed interval until it reaches `DONE` and inspects the terminal payload:
//! `DONE` with an error attached is a failure, not a success.
//! [`wait_until_running`] polls the instance descriptor itself until the
//! guest reaches `RUNNING`, which measures time-to-ready rather than merely
//! time-to-operation-completion.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::gcp::gce::{
    Compute, GceError, Instance, OpScope, OperationErrorBody, OperationStatus,
};

/// How to poll: a fixed interval, and an optional overall deadline.
///
/// The default preserves the baseline behavior (2-second interval, no bound);
/// callers that need a bounded wait set `deadline`.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(2),
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn with_deadline(deadline: Duration) -> Self {
        PollPolicy {
            deadline: Some(deadline),
            ..Default::default()
        }
    }
}

/// A wait that did not end in success.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The operation reached `DONE` carrying an error payload.
    #[error("operation {name} failed: {error}")]
    Operation {
        name: String,
        error: OperationErrorBody,
    },

    /// The poll deadline elapsed before a terminal state was observed.
    #[error("deadline of {deadline:?} exceeded while waiting for {what}")]
    DeadlineExceeded { what: String, deadline: Duration },

    /// A poll itself failed (transport or API error).
    #[error(transparent)]
    Gce(#[from] GceError),
}

/// Blocks (at poll boundaries) until the named operation reaches `DONE`.
///
/// Returns `Ok(())` on clean completion, [`WaitError::Operation`] if the
/// terminal payload carries an error, and [`WaitError::DeadlineExceeded`] if
/// the policy's deadline elapses first.
pub async fn wait_for_operation<C: Compute>(
    client: &C,
    scope: &OpScope,
    name: &str,
    policy: &PollPolicy,
) -> Result<(), WaitError> {
    // Wall-clock anchor: the bound covers poll latency too, and holds even
    // with a zero interval.
    let start = Instant::now();
    loop {
        let op = client.get_operation(scope, name).await?;
        if op.status == OperationStatus::Done {
            return match op.error {
                Some(error) => Err(WaitError::Operation {
                    name: name.to_string(),
                    error,
                }),
                None => Ok(()),
            };
        }
        if let Some(deadline) = policy.deadline {
            if start.elapsed() >= deadline {
                return Err(WaitError::DeadlineExceeded {
                    what: format!("operation {}", name),
                    deadline,
                });
            }
        }
        sleep(policy.interval).await;
    }
}

/// Polls the instance descriptor until its status reaches `RUNNING`.
///
/// A `NotFound` while polling is tolerated: the control plane is eventually
/// consistent and a freshly inserted instance can briefly be invisible.
/// Returns the running descriptor (callers usually want the external IP).
pub async fn wait_until_running<C: Compute>(
    client: &C,
    zone: &str,
    name: &str,
    policy: &PollPolicy,
) -> Result<Instance, WaitError> {
    let start = Instant::now();
    loop {
        match client.get_instance(zone, name).await {
            Ok(instance) if instance.is_running() => return Ok(instance),
            Ok(_) => {}
            Err(GceError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        if let Some(deadline) = policy.deadline {
            if start.elapsed() >= deadline {
                return Err(WaitError::DeadlineExceeded {
                    what: format!("instance {} to reach RUNNING", name),
                    deadline,
                });
            }
        }
        sleep(policy.interval).await;
    }
}

//! # Zone Fallback
//!
//! Materializes one logical instance across an ordered list of candidate
//! zones. Zones are tried strictly in the given order and never concurrently:
//! the ordering is caller-significant (e.g. try a stockout-prone zone last to
//! deliberately probe for capacity). The first zone where create, operation
//! completion, and running-state all succeed wins; every trial is recorded as
//! a [`ProvisioningAttempt`] so the run leaves an audit trail.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::gcp::gce::{Compute, Instance, OpScope, instance_request};
use crate::provision::spec::InstanceSpec;
use crate::provision::wait::{self, PollPolicy, WaitError};

/// One zone trial. The ordered sequence over all attempts for a resource is
/// the audit trail of the provisioning request.
#[derive(Debug, Clone)]
pub struct ProvisioningAttempt {
    pub instance_name: String,
    pub zone: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Succeeded { duration_secs: f64 },
    Failed { error: String },
}

impl ProvisioningAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded { .. })
    }

    pub fn duration_secs(&self) -> Option<f64> {
        match self.outcome {
            AttemptOutcome::Succeeded { duration_secs } => Some(duration_secs),
            AttemptOutcome::Failed { .. } => None,
        }
    }
}

/// A successful provisioning run: the winning attempt, the full trail, and
/// the running instance's descriptor.
#[derive(Debug)]
pub struct ZoneOutcome {
    pub winner: ProvisioningAttempt,
    pub attempts: Vec<ProvisioningAttempt>,
    pub instance: Instance,
}

/// Every candidate zone failed. Carries the full attempt trail and the last
/// underlying error for diagnostics.
#[derive(Debug)]
pub struct AllZonesExhausted {
    pub name: String,
    pub attempts: Vec<ProvisioningAttempt>,
    pub last: Option<WaitError>,
}

impl fmt::Display for AllZonesExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(last) => write!(
                f,
                "all {} candidate zones exhausted for '{}'; last error: {}",
                self.attempts.len(),
                self.name,
                last
            ),
            None => write!(f, "no candidate zones given for '{}'", self.name),
        }
    }
}

impl std::error::Error for AllZonesExhausted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last.as_ref().map(|e| e as _)
    }
}

/// Provisions `spec` in the first candidate zone that accepts it.
///
/// Per zone: build the zonal request, insert, wait for the operation, wait
/// for `RUNNING`. Any failure at any step records a failed attempt and falls
/// through to the next candidate; success returns immediately without trying
/// later zones.
pub async fn provision_instance<C: Compute>(
    client: &C,
    spec: &InstanceSpec,
    policy: &PollPolicy,
) -> Result<ZoneOutcome, AllZonesExhausted> {
    let mut attempts = Vec::new();
    let mut last: Option<WaitError> = None;

    for zone in &spec.zones {
        let started_at = Utc::now();
        let clock = Instant::now();
        match try_zone(client, spec, zone, policy).await {
            Ok(instance) => {
                let winner = ProvisioningAttempt {
                    instance_name: spec.name.clone(),
                    zone: zone.clone(),
                    started_at,
                    ended_at: Utc::now(),
                    outcome: AttemptOutcome::Succeeded {
                        duration_secs: clock.elapsed().as_secs_f64(),
                    },
                };
                attempts.push(winner.clone());
                return Ok(ZoneOutcome {
                    winner,
                    attempts,
                    instance,
                });
            }
            Err(error) => {
                attempts.push(ProvisioningAttempt {
                    instance_name: spec.name.clone(),
                    zone: zone.clone(),
                    started_at,
                    ended_at: Utc::now(),
                    outcome: AttemptOutcome::Failed {
                        error: error.to_string(),
                    },
                });
                last = Some(error);
            }
        }
    }

    Err(AllZonesExhausted {
        name: spec.name.clone(),
        attempts,
        last,
    })
}

async fn try_zone<C: Compute>(
    client: &C,
    spec: &InstanceSpec,
    zone: &str,
    policy: &PollPolicy,
) -> Result<Instance, WaitError> {
    let request = instance_request(spec, client.project(), zone);
    let op = client.insert_instance(zone, &request).await?;
    wait::wait_for_operation(client, &OpScope::zonal(zone), &op.name, policy).await?;
    wait::wait_until_running(client, zone, &spec.name, policy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::fake::{FakeCompute, op_done, op_done_err};
    use crate::provision::spec::BootSource;
    use std::time::Duration;

    fn spec(zones: &[&str]) -> InstanceSpec {
        InstanceSpec::new(
            "flask-vm-clone-1",
            zones.iter().map(|z| z.to_string()).collect(),
            "e2-medium",
            BootSource::Snapshot {
                self_link: "https://fake/global/snapshots/base-snapshot-flask-vm".to_string(),
            },
        )
    }

    fn instant() -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn first_zone_success_tries_nothing_else() {
        let fake = FakeCompute::new("test-project");
        let outcome = provision_instance(&fake, &spec(&["us-west1-a", "us-west1-b"]), &instant())
            .await
            .unwrap();
        assert_eq!(outcome.winner.zone, "us-west1-a");
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(*fake.inserted_zones.lock().unwrap(), vec!["us-west1-a"]);
    }

    #[tokio::test]
    async fn falls_through_failed_zones_in_order() {
        let fake = FakeCompute::new("test-project");
        fake.queue_insert(op_done_err("op-a", "ZONE_RESOURCE_POOL_EXHAUSTED"));
        fake.queue_insert(op_done_err("op-b", "ZONE_RESOURCE_POOL_EXHAUSTED"));
        fake.queue_insert(op_done("op-c"));

        let outcome = provision_instance(
            &fake,
            &spec(&["us-west1-a", "us-west1-b", "us-west1-c"]),
            &instant(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.winner.zone, "us-west1-c");
        assert!(outcome.winner.duration_secs().is_some());
        assert_eq!(
            *fake.inserted_zones.lock().unwrap(),
            vec!["us-west1-a", "us-west1-b", "us-west1-c"]
        );
        // Trail shape: Failed(a), Failed(b), Succeeded(c).
        assert_eq!(outcome.attempts.len(), 3);
        assert!(!outcome.attempts[0].succeeded());
        assert_eq!(outcome.attempts[0].zone, "us-west1-a");
        assert!(!outcome.attempts[1].succeeded());
        assert_eq!(outcome.attempts[1].zone, "us-west1-b");
        assert!(outcome.attempts[2].succeeded());
    }

    #[tokio::test]
    async fn exhaustion_carries_last_zone_error() {
        let fake = FakeCompute::new("test-project");
        fake.queue_insert(op_done_err("op-a", "QUOTA_EXCEEDED"));
        fake.queue_insert(op_done_err("op-b", "ZONE_RESOURCE_POOL_EXHAUSTED"));

        let err = provision_instance(&fake, &spec(&["us-west1-a", "us-west1-b"]), &instant())
            .await
            .unwrap_err();

        assert_eq!(err.attempts.len(), 2);
        assert!(err.attempts.iter().all(|a| !a.succeeded()));
        // The attached error is the last zone's failure, not the first's.
        let last = err.last.as_ref().unwrap().to_string();
        assert!(last.contains("ZONE_RESOURCE_POOL_EXHAUSTED"));
        assert!(err.to_string().contains("flask-vm-clone-1"));
    }

    #[tokio::test]
    async fn requests_are_rebuilt_per_zone() {
        let fake = FakeCompute::new("test-project");
        fake.queue_insert(op_done_err("op-a", "ZONE_RESOURCE_POOL_EXHAUSTED"));
        fake.queue_insert(op_done("op-b"));

        provision_instance(&fake, &spec(&["us-west1-a", "us-west1-b"]), &instant())
            .await
            .unwrap();

        let requests = fake.inserted_requests.lock().unwrap();
        assert!(requests[0].machine_type.contains("us-west1-a"));
        assert!(requests[1].machine_type.contains("us-west1-b"));
    }
}

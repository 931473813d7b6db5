//! # Idempotent Ensure
//!
//! "Create if absent" for uniquely named resources against a control plane
//! with no native upsert: probe for existence first, treat `NotFound` as the
//! creation trigger, and treat any other lookup failure as fatal. Calling
//! `create` speculatively before probing would risk duplicate resources and
//! quota exhaustion; this module is the only create-or-reuse path.

use std::future::Future;

use thiserror::Error;

use crate::gcp::gce::{Compute, FirewallRule, GceError, OpScope, Snapshot};
use crate::provision::wait::{self, PollPolicy, WaitError};

#[derive(Debug, Error)]
pub enum EnsureError {
    /// The existence probe failed with something other than `NotFound`;
    /// propagated unmodified.
    #[error(transparent)]
    Lookup(GceError),

    /// Creation (or waiting on its operation) failed.
    #[error(transparent)]
    Create(#[from] WaitError),

    /// The resource is still absent after a successful create. The control
    /// plane contradicted itself; surfacing beats retry-looping here.
    #[error("{0} missing after successful creation")]
    MissingAfterCreate(String),
}

/// Returns the existing resource, or creates it and re-fetches.
///
/// `get` is probed first: a hit returns immediately and `create` is never
/// invoked, so at most one underlying resource can exist for the name.
pub async fn ensure<T, GetFut, CreateFut>(
    get: impl Fn() -> GetFut,
    create: impl FnOnce() -> CreateFut,
) -> Result<T, EnsureError>
where
    GetFut: Future<Output = Result<T, GceError>>,
    CreateFut: Future<Output = Result<(), WaitError>>,
{
    match get().await {
        Ok(found) => return Ok(found),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(EnsureError::Lookup(e)),
    }
    create().await?;
    match get().await {
        Ok(created) => Ok(created),
        Err(GceError::NotFound(what)) => Err(EnsureError::MissingAfterCreate(what)),
        Err(e) => Err(EnsureError::Lookup(e)),
    }
}

/// Ensures a snapshot of `disk` named `name` exists and returns it.
///
/// Snapshots are global by name: a second call for the same name performs no
/// create and returns the first snapshot's descriptor.
pub async fn ensure_snapshot<C: Compute>(
    client: &C,
    zone: &str,
    disk: &str,
    name: &str,
    policy: &PollPolicy,
) -> Result<Snapshot, EnsureError> {
    ensure(
        || client.get_snapshot(name),
        || async {
            let op = client
                .create_snapshot(zone, disk, name)
                .await
                .map_err(WaitError::from)?;
            wait::wait_for_operation(client, &OpScope::zonal(zone), &op.name, policy).await
        },
    )
    .await
}

/// Ensures a firewall rule exists and returns the live descriptor.
pub async fn ensure_firewall<C: Compute>(
    client: &C,
    rule: &FirewallRule,
    policy: &PollPolicy,
) -> Result<FirewallRule, EnsureError> {
    ensure(
        || client.get_firewall(&rule.name),
        || async {
            let op = client.insert_firewall(rule).await.map_err(WaitError::from)?;
            wait::wait_for_operation(client, &OpScope::Global, &op.name, policy).await
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::fake::FakeCompute;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn instant() -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn existing_firewall_is_reused_without_create() {
        let fake = FakeCompute::new("test-project");
        let rule = FirewallRule::ingress_allow("allow-5000", 5000, "allow-5000");
        let mut existing = rule.clone();
        existing.self_link = "https://fake/global/firewalls/allow-5000".to_string();
        fake.plant_firewall(existing.clone());

        let got = ensure_firewall(&fake, &rule, &instant()).await.unwrap();
        assert_eq!(got.self_link, existing.self_link);
        assert!(fake.firewall_creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_firewall_is_created_once() {
        let fake = FakeCompute::new("test-project");
        let rule = FirewallRule::ingress_allow("allow-5000", 5000, "allow-5000");
        let got = ensure_firewall(&fake, &rule, &instant()).await.unwrap();
        assert!(got.self_link.ends_with("allow-5000"));
        assert_eq!(fake.firewall_creates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_requested_twice_creates_once() {
        let fake = FakeCompute::new("test-project");
        let first = ensure_snapshot(&fake, "us-west1-a", "flask-vm", "base-snapshot-x", &instant())
            .await
            .unwrap();
        let second = ensure_snapshot(&fake, "us-west1-a", "flask-vm", "base-snapshot-x", &instant())
            .await
            .unwrap();
        assert_eq!(fake.snapshot_creates.lock().unwrap().len(), 1);
        assert_eq!(first.self_link, second.self_link);
    }

    #[tokio::test]
    async fn pre_existing_snapshot_self_link_is_returned() {
        let fake = FakeCompute::new("test-project");
        fake.plant_snapshot(Snapshot {
            name: "base-snapshot-x".to_string(),
            self_link: "https://fake/global/snapshots/base-snapshot-x".to_string(),
            status: "READY".to_string(),
            source_disk: "disk".to_string(),
        });
        let got = ensure_snapshot(&fake, "us-west1-a", "flask-vm", "base-snapshot-x", &instant())
            .await
            .unwrap();
        assert_eq!(got.self_link, "https://fake/global/snapshots/base-snapshot-x");
        assert!(fake.snapshot_creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_not_found_lookup_failure_is_fatal() {
        let fake = FakeCompute::new("test-project");
        fake.plant_lookup_error(
            "base-snapshot-x",
            GceError::Api {
                status: StatusCode::FORBIDDEN,
                body: "permission denied".to_string(),
            },
        );
        let err = ensure_snapshot(&fake, "us-west1-a", "flask-vm", "base-snapshot-x", &instant())
            .await
            .unwrap_err();
        assert!(matches!(err, EnsureError::Lookup(GceError::Api { .. })));
        // The probe failure must not trigger creation.
        assert!(fake.snapshot_creates.lock().unwrap().is_empty());
    }
}

//! # Google Compute Engine (GCE) Client
//!
//! A typed client for the Compute Engine API surface this crate drives:
//! instance create/get/list, image lookup by family, disk snapshot creation,
//! snapshot and firewall lookup, and zonal/global operation polling.
//!
//! ## Submodules
//! - `client`: The REST client making API requests to GCE.
//! - `builders`: Turns a logical [`crate::provision::InstanceSpec`] into the
//!   wire-level request body for one concrete zone.
//! - `types`: Data structures serialized to and deserialized from the API.
//! - `error`: The error taxonomy for control-plane calls.

pub mod builders;
pub mod client;
pub mod error;
pub mod types;

pub use builders::instance_request;
pub use client::ComputeClient;
pub use error::GceError;
pub use types::*;

/// The control-plane capability consumed by the orchestration layer.
///
/// Every method performs exactly one remote call and does not retry; retry
/// decisions belong to the zone-fallback boundary. `ComputeClient` is the
/// production implementation; tests substitute a scripted fake.
#[allow(async_fn_in_trait)]
pub trait Compute {
    /// The project all zonal/global resource paths are scoped to.
    fn project(&self) -> &str;

    /// Starts creating an instance; returns the zonal operation handle.
    async fn insert_instance(
        &self,
        zone: &str,
        request: &InstanceRequest,
    ) -> Result<Operation, GceError>;

    /// Fetches an instance descriptor, or `GceError::NotFound`.
    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance, GceError>;

    /// Lists instances in a zone.
    async fn list_instances(&self, zone: &str) -> Result<Vec<Instance>, GceError>;

    /// Fetches the current state of a zonal or global operation.
    async fn get_operation(&self, scope: &OpScope, name: &str) -> Result<Operation, GceError>;

    /// Starts snapshotting a zonal disk; returns the zonal operation handle.
    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        name: &str,
    ) -> Result<Operation, GceError>;

    /// Fetches a snapshot (snapshots are global), or `GceError::NotFound`.
    async fn get_snapshot(&self, name: &str) -> Result<Snapshot, GceError>;

    /// Starts creating a firewall rule; returns the global operation handle.
    async fn insert_firewall(&self, rule: &FirewallRule) -> Result<Operation, GceError>;

    /// Fetches a firewall rule, or `GceError::NotFound`.
    async fn get_firewall(&self, name: &str) -> Result<FirewallRule, GceError>;

    /// Resolves the latest image of a family in the given image project.
    async fn image_from_family(&self, project: &str, family: &str) -> Result<Image, GceError>;
}

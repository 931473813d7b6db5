//! # Provisioning Orchestration
//!
//! The operation-completion state machine and the policies layered on top of
//! the [`Compute`](crate::gcp::gce::Compute) client:
//!
//! - `wait`: polls an asynchronous operation (or an instance's status) until
//!   it reaches a terminal state, with a fixed interval and optional deadline.
//! - `ensure`: create-if-absent for uniquely named resources (snapshots,
//!   firewall rules) against a control plane with no native upsert.
//! - `fallback`: tries one logical instance across an ordered list of
//!   candidate zones, stopping at the first success.
//! - `chain`: packages credentials and configuration into a first-tier
//!   instance's metadata so it can provision a second-tier instance itself.
//! - `timing`: per-creation wall-clock records and the markdown report.

pub mod chain;
pub mod ensure;
pub mod fallback;
pub mod spec;
pub mod timing;
pub mod wait;

#[cfg(test)]
pub(crate) mod fake;

pub use chain::{ChainConfig, ChainPayload};
pub use ensure::{ensure_firewall, ensure_snapshot};
pub use fallback::{AllZonesExhausted, ProvisioningAttempt, ZoneOutcome, provision_instance};
pub use spec::{BootSource, InstanceSpec};
pub use timing::TimingRecorder;
pub use wait::{PollPolicy, WaitError, wait_for_operation, wait_until_running};

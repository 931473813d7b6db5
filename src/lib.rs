// # vmfleet: GCE Fleet Provisioning
//
// This crate provisions Google Compute Engine resources (instances, disk
// snapshots, firewall rules) through the asynchronous GCE control plane, and
// chains provisioning across two tiers: a bootstrap instance that, once
// running, provisions a second instance using credentials and configuration
// delivered through its metadata channel.
//
// The interesting machinery lives in two modules:
// - `gcp`: service-account auth and a typed REST client for the Compute API.
// - `provision`: operation waiting, idempotent ensure, zone fallback, the
//   chained two-tier protocol, and timing reports.

/// Orchestrator configuration (zones, shapes, image coordinates).
pub mod config;

/// Google Cloud Platform utilities: auth and the Compute Engine client.
pub mod gcp;

/// Provisioning orchestration: waiters, ensure, zone fallback, chaining.
pub mod provision;

//! # Google Cloud Platform Utilities
//!
//! Authentication and a typed client for the Compute Engine API.
//!
//! ## Submodules
//! - `auth`: Service-account JWT flow for obtaining OAuth2 access tokens.
//! - `gce`: The Compute Engine client, wire types, and request builders.
//! - `types`: Service-agnostic GCP types shared across services.

pub mod auth;
pub mod gce;
pub mod types;

use once_cell::sync::Lazy;

/// Shared HTTP client for all GCP API calls (connection reuse).
pub(crate) static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

pub use auth::{access_token, credentials_path, load_service_account};

//! # GCE API Client
//!
//! The production [`Compute`] implementation: a thin, typed wrapper over the
//! Compute Engine REST API. Every method issues exactly one HTTP request with
//! the client's bearer token; HTTP 404 on lookups becomes
//! [`GceError::NotFound`], other non-2xx responses become [`GceError::Api`].

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::gcp::HTTP;
use crate::gcp::gce::Compute;
use crate::gcp::gce::error::GceError;
use crate::gcp::gce::types::*;
use crate::gcp::types::ServiceAccount;

const GCE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// An authenticated Compute Engine client bound to one project.
///
/// Constructed explicitly and passed by reference into every component; there
/// is no ambient global client.
pub struct ComputeClient {
    token: String,
    project: String,
}

impl ComputeClient {
    /// Obtains an access token for the service account and binds the client
    /// to `project` (defaults to the key's `project_id`).
    pub async fn connect(
        service_account: &ServiceAccount,
        project: Option<String>,
    ) -> Result<Self> {
        let token = crate::gcp::auth::access_token(service_account)
            .await
            .context("Failed to get access token")?;
        let project = project.unwrap_or_else(|| service_account.project_id.clone());
        Ok(ComputeClient { token, project })
    }

    fn project_url(&self, tail: &str) -> String {
        format!("{}/projects/{}/{}", GCE_API_BASE, self.project, tail)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, GceError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GceError::NotFound(what.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GceError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, GceError> {
        let response = HTTP
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;
        Self::decode(response, what).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        what: &str,
    ) -> Result<T, GceError> {
        let response = HTTP
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::decode(response, what).await
    }
}

impl Compute for ComputeClient {
    fn project(&self) -> &str {
        &self.project
    }

    async fn insert_instance(
        &self,
        zone: &str,
        request: &InstanceRequest,
    ) -> Result<Operation, GceError> {
        let url = self.project_url(&format!("zones/{}/instances", zone));
        self.post_json(&url, request, &format!("instances.insert {}", request.name))
            .await
    }

    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance, GceError> {
        let url = self.project_url(&format!("zones/{}/instances/{}", zone, name));
        self.get_json(&url, &format!("instance {}", name)).await
    }

    async fn list_instances(&self, zone: &str) -> Result<Vec<Instance>, GceError> {
        let url = self.project_url(&format!("zones/{}/instances", zone));
        let body: InstanceListResponse = self.get_json(&url, "instances.list").await?;
        Ok(body.items)
    }

    async fn get_operation(&self, scope: &OpScope, name: &str) -> Result<Operation, GceError> {
        let url = match scope {
            OpScope::Zonal(zone) => self.project_url(&format!("zones/{}/operations/{}", zone, name)),
            OpScope::Global => self.project_url(&format!("global/operations/{}", name)),
        };
        self.get_json(&url, &format!("operation {}", name)).await
    }

    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        name: &str,
    ) -> Result<Operation, GceError> {
        let url = self.project_url(&format!("zones/{}/disks/{}/createSnapshot", zone, disk));
        let body = serde_json::json!({ "name": name });
        self.post_json(&url, &body, &format!("disks.createSnapshot {}", name))
            .await
    }

    async fn get_snapshot(&self, name: &str) -> Result<Snapshot, GceError> {
        let url = self.project_url(&format!("global/snapshots/{}", name));
        self.get_json(&url, &format!("snapshot {}", name)).await
    }

    async fn insert_firewall(&self, rule: &FirewallRule) -> Result<Operation, GceError> {
        let url = self.project_url("global/firewalls");
        self.post_json(&url, rule, &format!("firewalls.insert {}", rule.name))
            .await
    }

    async fn get_firewall(&self, name: &str) -> Result<FirewallRule, GceError> {
        let url = self.project_url(&format!("global/firewalls/{}", name));
        self.get_json(&url, &format!("firewall {}", name)).await
    }

    async fn image_from_family(&self, project: &str, family: &str) -> Result<Image, GceError> {
        // Image families live in their own project (e.g. ubuntu-os-cloud).
        let url = format!(
            "{}/projects/{}/global/images/family/{}",
            GCE_API_BASE, project, family
        );
        self.get_json(&url, &format!("image family {}", family))
            .await
    }
}

//! # Google Compute Engine (GCE) Data Types
//!
//! Rust structs modeling the JSON objects used in the Compute Engine API:
//! the `instances.insert` request body, instance/snapshot/firewall/image
//! descriptors, and the asynchronous operation resource returned by every
//! create call.
//!
//! For detailed information on each field, refer to the official GCE API
//! documentation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scope of an asynchronous operation: zonal operations are polled under
/// their zone, global ones (firewalls) under the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpScope {
    Zonal(String),
    Global,
}

impl OpScope {
    pub fn zonal(zone: impl Into<String>) -> Self {
        OpScope::Zonal(zone.into())
    }
}

/// Status of an asynchronous operation. Transitions monotonically
/// `PENDING`/`RUNNING` -> `DONE`. `DONE` does not imply success; the
/// operation's `error` field must be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

/// An asynchronous control-plane operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub status: OperationStatus,
    /// Present only when the operation finished with a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrorBody>,
    #[serde(rename = "operationType", default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(rename = "targetLink", default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
}

/// The `error` payload of a finished operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationErrorBody {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for OperationErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "unspecified operation error");
        }
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.code, e.message)?;
        }
        Ok(())
    }
}

/// Instance status reported by the API once the instance has fully started.
pub const INSTANCE_RUNNING: &str = "RUNNING";

/// An instance descriptor as returned by `instances.get`/`instances.list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "machineType", default)]
    pub machine_type: String,
    #[serde(default)]
    pub zone: String,
    #[serde(rename = "selfLink", default)]
    pub self_link: String,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
    #[serde(rename = "networkInterfaces", default)]
    pub network_interfaces: Vec<NetworkInterfaceStatus>,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.status == INSTANCE_RUNNING
    }

    /// Source URL of the boot disk, if the descriptor carries one.
    pub fn boot_disk_source(&self) -> Option<&str> {
        self.disks
            .iter()
            .find(|d| d.boot)
            .map(|d| d.source.as_str())
    }

    /// First external NAT IP across all NICs and access configs.
    pub fn external_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .flat_map(|ni| ni.access_configs.iter())
            .find_map(|ac| ac.nat_ip.as_deref())
    }
}

/// Extracts the disk name from a disk source URL (`.../disks/<name>`).
pub fn disk_name_from_source(source: &str) -> Option<&str> {
    source.rsplit_once("/disks/").map(|(_, name)| name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedDisk {
    #[serde(default)]
    pub boot: bool,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "deviceName", default)]
    pub device_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceStatus {
    #[serde(default)]
    pub network: String,
    #[serde(rename = "accessConfigs", default)]
    pub access_configs: Vec<AccessConfigStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfigStatus {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "natIP", default, skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
}

/// Response body of `instances.list`.
#[derive(Debug, Deserialize)]
pub struct InstanceListResponse {
    #[serde(default)]
    pub items: Vec<Instance>,
}

/// A disk snapshot. Snapshots are global resources addressed by unique name;
/// a second request for an existing name must reuse the first's `selfLink`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(rename = "selfLink", default)]
    pub self_link: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "sourceDisk", default)]
    pub source_disk: String,
}

/// A boot image resolved from an image family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    #[serde(rename = "selfLink", default)]
    pub self_link: String,
}

/// A firewall rule (global resource). The same struct serves as insert body
/// and lookup result; `selfLink` is absent on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    pub network: String,
    pub direction: String,
    #[serde(rename = "sourceRanges", default)]
    pub source_ranges: Vec<String>,
    #[serde(rename = "targetTags", default)]
    pub target_tags: Vec<String>,
    #[serde(default)]
    pub allowed: Vec<FirewallAllowed>,
    #[serde(rename = "selfLink", default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallAllowed {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    #[serde(default)]
    pub ports: Vec<String>,
}

impl FirewallRule {
    /// An ingress rule allowing one TCP port from anywhere to instances
    /// carrying `tag`, on the default network.
    pub fn ingress_allow(name: &str, port: u16, tag: &str) -> Self {
        FirewallRule {
            name: name.to_string(),
            network: "global/networks/default".to_string(),
            direction: "INGRESS".to_string(),
            source_ranges: vec!["0.0.0.0/0".to_string()],
            target_tags: vec![tag.to_string()],
            allowed: vec![FirewallAllowed {
                ip_protocol: "tcp".to_string(),
                ports: vec![port.to_string()],
            }],
            self_link: String::new(),
        }
    }
}

/// Request body for creating a new GCE virtual machine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRequest {
    pub name: String,
    /// The machine type path (e.g. `projects/p/zones/z/machineTypes/e2-medium`).
    #[serde(rename = "machineType")]
    pub machine_type: String,
    pub description: String,
    /// Network tags; firewall rules target these.
    pub tags: Tags,
    pub disks: Vec<DiskRequest>,
    #[serde(rename = "networkInterfaces")]
    pub network_interfaces: Vec<NetworkInterfaceRequest>,
    /// Metadata key/value pairs available to the instance at runtime.
    pub metadata: Metadata,
    pub labels: HashMap<String, String>,
}

/// A boot disk for a new instance, initialized from an image or a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskRequest {
    #[serde(rename = "autoDelete")]
    pub auto_delete: bool,
    pub boot: bool,
    #[serde(rename = "deviceName")]
    pub device_name: String,
    #[serde(rename = "initializeParams")]
    pub initialize_params: InitializeParams,
    pub mode: String,
    #[serde(rename = "type")]
    pub disk_type: String,
}

/// Disk initialization: exactly one of `source_image`/`source_snapshot` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "diskSizeGb")]
    pub disk_size_gb: String,
    #[serde(rename = "sourceImage", default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(rename = "sourceSnapshot", default, skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceRequest {
    pub network: String,
    #[serde(rename = "accessConfigs")]
    pub access_configs: Vec<AccessConfigRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfigRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub config_type: String,
}

/// Instance metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub items: Vec<MetadataItem>,
}

/// A single metadata key-value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

/// A list of network tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tags {
    pub items: Vec<String>,
}

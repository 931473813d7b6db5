//! Logical description of one instance to provision.
//!
//! An [`InstanceSpec`] is caller-constructed per provisioning request and
//! carries everything the zone-fallback loop needs: the unique name, the
//! preference-ordered zone candidates, the machine shape, and the boot
//! source. The wire-level request body for a concrete zone is derived by
//! [`crate::gcp::gce::instance_request`].

use crate::gcp::gce::types::MetadataItem;

/// GCE metadata key executed by the guest agent at boot.
pub const STARTUP_SCRIPT_KEY: &str = "startup-script";

/// Where the boot disk contents come from. Exactly one source; image links
/// are pre-resolved (family lookup happens before spec construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootSource {
    Image { self_link: String },
    Snapshot { self_link: String },
}

/// A logical instance to materialize in the first zone (of `zones`, in
/// order) that accepts it. The name is the resource identity: re-submitting
/// a spec with the same name must never create a duplicate.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    /// Candidate zones, tried strictly in this order.
    pub zones: Vec<String>,
    /// Machine type short name (e.g. `e2-medium`).
    pub machine_type: String,
    pub boot: BootSource,
    pub disk_size_gb: u32,
    /// Network path (e.g. `global/networks/default`).
    pub network: String,
    /// Network tags; must match the firewall rules meant to cover this
    /// instance.
    pub tags: Vec<String>,
    pub metadata: Vec<MetadataItem>,
}

impl InstanceSpec {
    pub fn new(
        name: impl Into<String>,
        zones: Vec<String>,
        machine_type: impl Into<String>,
        boot: BootSource,
    ) -> Self {
        InstanceSpec {
            name: name.into(),
            zones,
            machine_type: machine_type.into(),
            boot,
            disk_size_gb: 10,
            network: "global/networks/default".to_string(),
            tags: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(MetadataItem {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Attaches a startup script under the key the guest agent executes.
    pub fn with_startup_script(self, script: impl Into<String>) -> Self {
        self.with_metadata(STARTUP_SCRIPT_KEY, script)
    }
}

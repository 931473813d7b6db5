//! # GCE Instance Request Builders
//!
//! Turns a logical [`InstanceSpec`] into the `instances.insert` request body
//! for one concrete candidate zone. Zone-scoped fields (machine type path,
//! boot disk) are substituted per zone so the zone-fallback loop can retry
//! the same spec elsewhere without rebuilding it.

use std::collections::HashMap;

use crate::gcp::gce::types::*;
use crate::provision::spec::{BootSource, InstanceSpec};

/// Builds the wire request for creating `spec` in `zone`.
pub fn instance_request(spec: &InstanceSpec, project: &str, zone: &str) -> InstanceRequest {
    let (source_image, source_snapshot) = match &spec.boot {
        BootSource::Image { self_link } => (Some(self_link.clone()), None),
        BootSource::Snapshot { self_link } => (None, Some(self_link.clone())),
    };

    InstanceRequest {
        name: spec.name.clone(),
        machine_type: format!(
            "projects/{}/zones/{}/machineTypes/{}",
            project, zone, spec.machine_type
        ),
        description: String::new(),
        tags: Tags {
            items: spec.tags.clone(),
        },
        disks: vec![DiskRequest {
            auto_delete: true,
            boot: true,
            device_name: spec.name.clone(),
            initialize_params: InitializeParams {
                disk_size_gb: spec.disk_size_gb.to_string(),
                source_image,
                source_snapshot,
            },
            mode: "READ_WRITE".to_string(),
            disk_type: "PERSISTENT".to_string(),
        }],
        network_interfaces: vec![NetworkInterfaceRequest {
            network: spec.network.clone(),
            access_configs: vec![AccessConfigRequest {
                name: "External NAT".to_string(),
                config_type: "ONE_TO_ONE_NAT".to_string(),
            }],
        }],
        metadata: Metadata {
            items: spec.metadata.clone(),
        },
        labels: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::spec::STARTUP_SCRIPT_KEY;

    fn image_spec() -> InstanceSpec {
        InstanceSpec::new(
            "flask-vm",
            vec!["us-west1-b".to_string()],
            "e2-standard-2",
            BootSource::Image {
                self_link: "projects/ubuntu-os-cloud/global/images/ubuntu-2204".to_string(),
            },
        )
    }

    #[test]
    fn build_request_paths() {
        let req = instance_request(&image_spec(), "my-project", "us-west1-b");
        assert_eq!(req.name, "flask-vm");
        assert!(req.machine_type.ends_with("/machineTypes/e2-standard-2"));
        assert!(req.machine_type.contains("my-project"));
        assert!(req.machine_type.contains("us-west1-b"));
        assert_eq!(req.disks.len(), 1);
    }

    #[test]
    fn image_boot_source() {
        let req = instance_request(&image_spec(), "p", "us-west1-b");
        let params = &req.disks[0].initialize_params;
        assert!(params.source_image.as_deref().unwrap().contains("ubuntu-2204"));
        assert!(params.source_snapshot.is_none());
    }

    #[test]
    fn snapshot_boot_source() {
        let spec = InstanceSpec::new(
            "flask-vm-clone-1",
            vec!["us-west1-a".to_string()],
            "e2-medium",
            BootSource::Snapshot {
                self_link: "projects/p/global/snapshots/base-snapshot-flask-vm".to_string(),
            },
        );
        let req = instance_request(&spec, "p", "us-west1-a");
        let params = &req.disks[0].initialize_params;
        assert!(params.source_image.is_none());
        assert!(
            params
                .source_snapshot
                .as_deref()
                .unwrap()
                .ends_with("base-snapshot-flask-vm")
        );
    }

    #[test]
    fn tags_and_startup_script_propagate() {
        let spec = image_spec()
            .with_tags(vec!["allow-5000".to_string()])
            .with_startup_script("#!/bin/bash\necho hi\n");
        let req = instance_request(&spec, "p", "us-west1-b");
        assert_eq!(req.tags.items, vec!["allow-5000"]);
        let item = req
            .metadata
            .items
            .iter()
            .find(|i| i.key == STARTUP_SCRIPT_KEY)
            .unwrap();
        assert!(item.value.starts_with("#!/bin/bash"));
    }
}

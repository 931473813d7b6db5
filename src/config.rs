//! Orchestrator configuration: the zones, shapes, and image coordinates a
//! deployment uses. Constructed explicitly and passed in rather than read
//! from ambient globals.

use std::time::Duration;

use crate::provision::wait::PollPolicy;

#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Candidate zones tried in order by the fallback provisioner.
    pub zones: Vec<String>,
    pub machine_type: String,
    pub image_project: String,
    pub image_family: String,
    pub network: String,
    pub disk_size_gb: u32,
    /// Application port opened by the firewall rule and printed in the URL.
    pub port: u16,
    /// Network tag shared by the firewall rule and every provisioned tier.
    pub tag: String,
    pub poll: PollPolicy,
}

impl Default for FleetConfig {
    fn default() -> Self {
        FleetConfig {
            zones: vec![
                "us-west1-a".to_string(),
                "us-west1-b".to_string(),
                "us-west1-c".to_string(),
            ],
            machine_type: "e2-medium".to_string(),
            image_project: "ubuntu-os-cloud".to_string(),
            image_family: "ubuntu-2204-lts".to_string(),
            network: "global/networks/default".to_string(),
            disk_size_gb: 10,
            port: 5000,
            tag: "allow-5000".to_string(),
            poll: PollPolicy::with_deadline(Duration::from_secs(900)),
        }
    }
}

impl FleetConfig {
    /// Firewall rule name for the configured port/tag pair.
    pub fn firewall_name(&self) -> String {
        self.tag.clone()
    }
}

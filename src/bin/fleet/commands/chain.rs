use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vmfleet::config::FleetConfig;
use vmfleet::gcp::gce::{Compute, ComputeClient};
use vmfleet::gcp::types::ServiceAccount;
use vmfleet::provision::chain::{ChainConfig, ChainPayload, default_bootstrap_plan};
use vmfleet::provision::provision_instance;
use vmfleet::provision::spec::{BootSource, InstanceSpec};

use crate::common::{ClientArgs, PollArgs, spinner};

#[derive(Args, Debug)]
pub struct ChainArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Name of the bootstrap (first-tier) instance
    #[arg(name = "INSTANCE_NAME")]
    pub name: String,

    /// Candidate zones for the bootstrap instance, tried in order
    #[arg(long = "zone")]
    pub zones: Vec<String>,

    #[arg(long, default_value = "e2-medium")]
    pub machine_type: String,

    #[arg(long, default_value = "e2-medium")]
    pub target_machine_type: String,

    #[arg(long, default_value = "ubuntu-os-cloud")]
    pub image_project: String,

    #[arg(long, default_value = "ubuntu-2204-lts")]
    pub image_family: String,

    /// URL the bootstrap host downloads this provisioning binary from
    #[arg(long)]
    pub agent_url: String,

    /// Startup script file for the second-tier instance
    #[arg(long)]
    pub target_startup_script: Option<PathBuf>,

    #[arg(long, default_value = "allow-5000")]
    pub tag: String,
}

fn fleet_config(args: &ChainArgs) -> FleetConfig {
    let mut config = FleetConfig::default();
    if !args.zones.is_empty() {
        config.zones = args.zones.clone();
    }
    config.machine_type = args.machine_type.clone();
    config.image_project = args.image_project.clone();
    config.image_family = args.image_family.clone();
    config.tag = args.tag.clone();
    config.poll = args.poll.policy();
    config
}

pub async fn run(args: ChainArgs) -> Result<()> {
    // The same key is used here and, via the metadata channel, on the
    // bootstrap host. Scope it narrowly: everything that can describe the
    // first-tier instance can read it.
    let credentials_path = vmfleet::gcp::credentials_path(args.client.credentials.as_deref())?;
    let credentials_json = std::fs::read_to_string(&credentials_path).with_context(|| {
        format!(
            "Failed to read service account key {}",
            credentials_path.display()
        )
    })?;
    let service_account: ServiceAccount =
        serde_json::from_str(&credentials_json).context("Invalid service account key file")?;
    let client = ComputeClient::connect(&service_account, args.client.project.clone()).await?;
    let config = fleet_config(&args);

    let chain_config = ChainConfig {
        project: client.project().to_string(),
        zone: config.zones[0].clone(),
        target_name: format!("{}-vm2", args.name),
        target_machine_type: args.target_machine_type.clone(),
        image_project: config.image_project.clone(),
        image_family: config.image_family.clone(),
        network: config.network.clone(),
        tags: vec![config.tag.clone()],
    };

    let target_startup_script = match &args.target_startup_script {
        Some(path) => Some(std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read target startup script {}", path.display())
        })?),
        None => None,
    };

    let payload = ChainPayload {
        config: chain_config.clone(),
        credentials_json,
        target_startup_script: target_startup_script.clone(),
        plan: default_bootstrap_plan(&args.agent_url, target_startup_script.is_some()),
    };

    let image = client
        .image_from_family(&config.image_project, &config.image_family)
        .await
        .with_context(|| format!("Failed to resolve image family {}", config.image_family))?;

    let mut spec = InstanceSpec::new(
        &args.name,
        config.zones.clone(),
        &config.machine_type,
        BootSource::Image {
            self_link: image.self_link,
        },
    )
    .with_tags(chain_config.tags.clone());
    spec.network = config.network.clone();
    spec.metadata = payload.metadata_items()?;

    let bar = spinner(format!("Provisioning bootstrap '{}'...", args.name));
    let outcome = provision_instance(&client, &spec, &config.poll).await;
    bar.finish_and_clear();
    let outcome = outcome?;

    println!(
        "{} in {}: {:.2} seconds",
        args.name,
        outcome.winner.zone,
        outcome.winner.duration_secs().unwrap_or_default()
    );
    println!(
        "The bootstrap host will provision '{}' on its own.",
        chain_config.target_name
    );
    println!(
        "There is no acknowledgment channel back; check `fleet instances --zone {}` for the target.",
        chain_config.zone
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(zones: Vec<String>) -> ChainArgs {
        ChainArgs {
            client: ClientArgs {
                credentials: None,
                project: None,
            },
            poll: PollArgs {
                poll_interval: 2,
                wait_timeout: 900,
            },
            name: "bastion".to_string(),
            zones,
            machine_type: "e2-medium".to_string(),
            target_machine_type: "e2-medium".to_string(),
            image_project: "ubuntu-os-cloud".to_string(),
            image_family: "ubuntu-2204-lts".to_string(),
            agent_url: "https://example.com/fleet".to_string(),
            target_startup_script: None,
            tag: "allow-5000".to_string(),
        }
    }

    #[test]
    fn defaults_come_from_fleet_config() {
        let config = fleet_config(&args(Vec::new()));
        let defaults = FleetConfig::default();
        assert_eq!(config.zones, defaults.zones);
        assert_eq!(config.network, defaults.network);
    }

    #[test]
    fn explicit_zones_override_the_defaults() {
        let config = fleet_config(&args(vec!["us-east1-b".to_string()]));
        assert_eq!(config.zones, vec!["us-east1-b"]);
        assert_eq!(config.tag, "allow-5000");
    }
}

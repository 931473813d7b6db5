use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vmfleet::config::FleetConfig;
use vmfleet::gcp::gce::{Compute, FirewallRule};
use vmfleet::provision::fallback::AttemptOutcome;
use vmfleet::provision::spec::{BootSource, InstanceSpec};
use vmfleet::provision::{ensure_firewall, provision_instance};

use crate::common::{ClientArgs, PollArgs, spinner};

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    #[arg(name = "INSTANCE_NAME")]
    pub name: String,

    /// Candidate zones, tried in order (repeatable)
    #[arg(long = "zone")]
    pub zones: Vec<String>,

    #[arg(long, default_value = "e2-standard-2")]
    pub machine_type: String,

    #[arg(long, default_value = "ubuntu-os-cloud")]
    pub image_project: String,

    #[arg(long, default_value = "ubuntu-2204-lts")]
    pub image_family: String,

    /// Startup script file attached to the instance metadata
    #[arg(long)]
    pub startup_script: Option<PathBuf>,

    /// Application port opened by the firewall rule
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Network tag shared by the firewall rule and the instance
    #[arg(long, default_value = "allow-5000")]
    pub tag: String,
}

fn fleet_config(args: &DeployArgs) -> FleetConfig {
    let mut config = FleetConfig::default();
    if !args.zones.is_empty() {
        config.zones = args.zones.clone();
    }
    config.machine_type = args.machine_type.clone();
    config.image_project = args.image_project.clone();
    config.image_family = args.image_family.clone();
    config.port = args.port;
    config.tag = args.tag.clone();
    config.poll = args.poll.policy();
    config
}

pub async fn run(args: DeployArgs) -> Result<()> {
    let client = args.client.connect().await?;
    let config = fleet_config(&args);

    println!(
        "Ensuring firewall rule '{}' (tcp:{})...",
        config.firewall_name(),
        config.port
    );
    let rule = FirewallRule::ingress_allow(&config.firewall_name(), config.port, &config.tag);
    ensure_firewall(&client, &rule, &config.poll).await?;

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
    .with_tags(vec![config.tag.clone()]);
    spec.network = config.network.clone();
    spec.disk_size_gb = config.disk_size_gb;
    if let Some(path) = &args.startup_script {
        let script = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read startup script {}", path.display()))?;
        spec = spec.with_startup_script(script);
    }

    let bar = spinner(format!("Provisioning '{}'...", args.name));
    let outcome = provision_instance(&client, &spec, &config.poll).await;
    bar.finish_and_clear();
    let outcome = outcome?;

    for attempt in &outcome.attempts {
        if let AttemptOutcome::Failed { error } = &attempt.outcome {
            eprintln!("  {}: {}", attempt.zone, error);
        }
    }
    println!(
        "{} in {}: {:.2} seconds",
        outcome.winner.instance_name,
        outcome.winner.zone,
        outcome.winner.duration_secs().unwrap_or_default()
    );

    match outcome.instance.external_ip() {
        Some(ip) => {
            println!("\nVisit:");
            println!("http://{}:{}", ip, config.port);
        }
        None => println!("Instance is running but has no external IP yet."),
    }
    Ok(())
}

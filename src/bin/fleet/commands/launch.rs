use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use vmfleet::gcp::gce::ComputeClient;
use vmfleet::gcp::types::ServiceAccount;
use vmfleet::provision::chain::{ChainConfig, launch_target};

use crate::common::PollArgs;

/// Default location the bootstrap script fetches the target's startup
/// script to; used when `--startup-script` is not given and the file exists.
const DEFAULT_TARGET_STARTUP: &str = "/srv/target-startup.sh";

#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub poll: PollArgs,

    /// Chain config fetched from the metadata channel
    #[arg(long, default_value = "/srv/chain-config.json")]
    pub config: PathBuf,

    /// Credential blob fetched from the metadata channel
    #[arg(long, default_value = "/srv/service-credentials.json")]
    pub credentials: PathBuf,

    /// Startup script for the target instance
    #[arg(long)]
    pub startup_script: Option<PathBuf>,
}

pub async fn run(args: LaunchArgs) -> Result<()> {
    let config: ChainConfig = serde_json::from_str(
        &std::fs::read_to_string(&args.config)
            .with_context(|| format!("Failed to read chain config {}", args.config.display()))?,
    )
    .context("Invalid chain config")?;

    let service_account: ServiceAccount = serde_json::from_str(
        &std::fs::read_to_string(&args.credentials).with_context(|| {
            format!(
                "Failed to read service account key {}",
                args.credentials.display()
            )
        })?,
    )
    .context("Invalid service account key file")?;

    let client = ComputeClient::connect(&service_account, Some(config.project.clone())).await?;

    let startup_path = args
        .startup_script
        .clone()
        .or_else(|| {
            let default = Path::new(DEFAULT_TARGET_STARTUP);
            default.exists().then(|| default.to_path_buf())
        });
    let startup_script = match &startup_path {
        Some(path) => Some(std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read target startup script {}", path.display())
        })?),
        None => None,
    };

    println!(
        "Provisioning target '{}' in {}...",
        config.target_name, config.zone
    );
    let outcome = launch_target(&client, &config, startup_script, &args.poll.policy()).await?;

    println!(
        "{} in {}: {:.2} seconds",
        config.target_name,
        outcome.winner.zone,
        outcome.winner.duration_secs().unwrap_or_default()
    );
    if let Some(ip) = outcome.instance.external_ip() {
        println!("Target external IP: {}", ip);
    }
    Ok(())
}

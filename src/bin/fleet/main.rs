use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fleet",
    about = "GCE fleet provisioning: deploy/clone/chain/launch"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List GCE instances in a zone
    Instances(commands::instances::InstancesArgs),

    /// Provision an application instance (firewall rule, image, zone fallback)
    Deploy(commands::deploy::DeployArgs),

    /// Snapshot a base instance and provision clones from the snapshot
    Clone(commands::clone::CloneArgs),

    /// Provision a bootstrap instance that provisions a second instance itself
    Chain(commands::chain::ChainArgs),

    /// Second hop: run on the bootstrap host against the fetched chain config
    Launch(commands::launch::LaunchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Instances(args) => commands::instances::run(args).await,
        Commands::Deploy(args) => commands::deploy::run(args).await,
        Commands::Clone(args) => commands::clone::run(args).await,
        Commands::Chain(args) => commands::chain::run(args).await,
        Commands::Launch(args) => commands::launch::run(args).await,
    }
}

mod commands;
mod common;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vmfleet::config::FleetConfig;
use vmfleet::gcp::gce::Compute;
use vmfleet::gcp::gce::types::disk_name_from_source;
use vmfleet::provision::spec::{BootSource, InstanceSpec};
use vmfleet::provision::{TimingRecorder, ensure_snapshot, provision_instance};

use crate::common::{ClientArgs, PollArgs, spinner};

#[derive(Args, Debug)]
pub struct CloneArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Base instance to snapshot and clone
    #[arg(long)]
    pub instance: String,

    /// Zone the base instance lives in
    #[arg(long, default_value = "us-west1-a")]
    pub base_zone: String,

    /// Number of clones to provision
    #[arg(long, default_value_t = 3)]
    pub count: u32,

    /// Candidate zones for each clone, tried in order (repeatable)
    #[arg(long = "zone")]
    pub zones: Vec<String>,

    #[arg(long, default_value = "e2-medium")]
    pub machine_type: String,

    /// Startup script file attached to each clone
    #[arg(long)]
    pub startup_script: Option<PathBuf>,

    #[arg(long, default_value = "allow-5000")]
    pub tag: String,

    /// Where to write the timing report
    #[arg(long, default_value = "TIMING.md")]
    pub report: PathBuf,
}

pub async fn run(args: CloneArgs) -> Result<()> {
    let client = args.client.connect().await?;

    let mut config = FleetConfig::default();
    if !args.zones.is_empty() {
        config.zones = args.zones.clone();
    }
    config.machine_type = args.machine_type.clone();
    config.tag = args.tag.clone();
    config.poll = args.poll.policy();

    println!("Your running instances are:");
    for instance in client.list_instances(&args.base_zone).await? {
        println!("{}", instance.name);
    }

    let base = client
        .get_instance(&args.base_zone, &args.instance)
        .await
        .with_context(|| format!("Failed to fetch base instance {}", args.instance))?;
    let disk_source = base
        .boot_disk_source()
        .context("base instance has no boot disk")?;
    let disk = disk_name_from_source(disk_source)
        .with_context(|| format!("unrecognized disk source URL: {}", disk_source))?;

    let snapshot_name = format!("base-snapshot-{}", args.instance);
    println!(
        "Ensuring snapshot {} (from disk {})...",
        snapshot_name, disk
    );
    let snapshot =
        ensure_snapshot(&client, &args.base_zone, disk, &snapshot_name, &config.poll).await?;

    let startup_script = match &args.startup_script {
        Some(path) => Some(std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read startup script {}", path.display())
        })?),
        None => None,
    };

    let mut recorder = TimingRecorder::new("VM Clone Timing");
    recorder.note("Base instance", &args.instance);
    recorder.note("Snapshot", &snapshot_name);

    for i in 1..=args.count {
        let clone_name = format!("{}-clone-{}", args.instance, i);
        let mut spec = InstanceSpec::new(
            &clone_name,
            config.zones.clone(),
            &config.machine_type,
            BootSource::Snapshot {
                self_link: snapshot.self_link.clone(),
            },
        )
        .with_tags(vec![config.tag.clone()]);
        spec.network = config.network.clone();
        if let Some(script) = &startup_script {
            spec = spec.with_startup_script(script.clone());
        }

        let bar = spinner(format!("Provisioning '{}'...", clone_name));
        let outcome = provision_instance(&client, &spec, &config.poll).await;
        bar.finish_and_clear();
        let outcome =
            outcome.with_context(|| format!("Failed to create {} in all zones", clone_name))?;

        println!(
            "{} in {}: {:.2} seconds",
            clone_name,
            outcome.winner.zone,
            outcome.winner.duration_secs().unwrap_or_default()
        );
        recorder.record(&outcome.winner);
    }

    std::fs::write(&args.report, recorder.render())
        .with_context(|| format!("Failed to write {}", args.report.display()))?;
    println!("Wrote {}", args.report.display());
    Ok(())
}

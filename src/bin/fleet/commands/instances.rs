use anyhow::Result;
use clap::Args;

use vmfleet::gcp::gce::Compute;

use crate::common::{ClientArgs, last_segment, print_table};

#[derive(Args, Debug)]
pub struct InstancesArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[arg(long, default_value = "us-west1-a")]
    pub zone: String,
}

pub async fn run(args: InstancesArgs) -> Result<()> {
    let client = args.client.connect().await?;
    let instances = client.list_instances(&args.zone).await?;

    let rows: Vec<[String; 5]> = instances
        .iter()
        .map(|inst| {
            [
                inst.status.clone(),
                inst.name.clone(),
                last_segment(&inst.machine_type).to_string(),
                if inst.zone.is_empty() {
                    args.zone.clone()
                } else {
                    last_segment(&inst.zone).to_string()
                },
                inst.external_ip().unwrap_or("-").to_string(),
            ]
        })
        .collect();

    print_table(
        &["Status", "Name", "Machine Type", "Zone", "External IP"],
        &rows,
    );
    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;

use vmfleet::gcp::gce::ComputeClient;
use vmfleet::gcp::load_service_account;
use vmfleet::provision::wait::PollPolicy;

/// Credential and project selection, shared by every subcommand that talks
/// to the control plane.
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Service-account key file (default: GOOGLE_APPLICATION_CREDENTIALS)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Project ID (default: the key file's project_id)
    #[arg(long)]
    pub project: Option<String>,
}

impl ClientArgs {
    pub async fn connect(&self) -> Result<ComputeClient> {
        let service_account = load_service_account(self.credentials.as_deref())?;
        ComputeClient::connect(&service_account, self.project.clone()).await
    }
}

/// Polling knobs shared by the waiting commands.
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Seconds between control-plane polls
    #[arg(long, default_value_t = 2)]
    pub poll_interval: u64,

    /// Overall wait deadline in seconds (0 = wait forever)
    #[arg(long, default_value_t = 900)]
    pub wait_timeout: u64,
}

impl PollArgs {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval),
            deadline: match self.wait_timeout {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Spinner shown while blocking on a long control-plane wait.
pub fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

pub fn last_segment(s: &str) -> &str {
    s.rsplit('/').next().unwrap_or(s)
}

pub fn print_table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) {
    let mut widths = [0usize; N];
    for (i, h) in headers.iter().enumerate() {
        widths[i] = widths[i].max(display_width(h));
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    for (i, h) in headers.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{:width$}", h, width = widths[i]);
    }
    println!();

    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{}", "-".repeat(*w));
    }
    println!();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                print!("  ");
            }
            print!("{:width$}", cell, width = widths[i]);
        }
        println!();
    }
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

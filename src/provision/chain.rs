//! # Chained Two-Tier Provisioning
//!
//! A first-tier instance, once running, provisions a second-tier instance on
//! its own. Everything the second hop needs (a credential blob, the target
//! configuration, and the bootstrap steps) travels through the first-tier
//! instance's metadata channel as self-contained blobs under stable keys;
//! retrieval is by key, never by position. The first-tier bootstrap is not a
//! hand-concatenated script-in-script: it is rendered from a structured
//! [`BootstrapPlan`] (artifacts to fetch, then commands to run), which keeps
//! the payload testable independently of shell quoting.
//!
//! There is no acknowledgment path from the second hop back to the
//! orchestrator; chain success is observed externally (e.g. by fetching the
//! target's address) or not at all.

use serde::{Deserialize, Serialize};

use crate::gcp::gce::types::MetadataItem;
use crate::gcp::gce::{Compute, GceError};
use crate::provision::fallback::{self, AllZonesExhausted, ZoneOutcome};
use crate::provision::spec::{BootSource, InstanceSpec, STARTUP_SCRIPT_KEY};
use crate::provision::wait::PollPolicy;

/// Metadata key for the credential blob.
///
/// The metadata channel is readable by anyone who can describe the instance,
/// so the key material placed here must be narrowly scoped and treated as
/// disposable.
pub const CREDENTIALS_KEY: &str = "service-credentials";

/// Metadata key for the serialized [`ChainConfig`].
pub const CHAIN_CONFIG_KEY: &str = "chain-config";

/// Metadata key for the target instance's own startup script.
pub const TARGET_STARTUP_KEY: &str = "target-startup-script";

/// Where the metadata server exposes instance attributes from inside a guest.
const METADATA_ATTRIBUTES_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/attributes";

/// Everything the second hop needs to provision the target instance.
///
/// Crosses a process/host boundary with no shared memory, so it must
/// round-trip through serialization with no field loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub project: String,
    pub zone: String,
    pub target_name: String,
    pub target_machine_type: String,
    pub image_project: String,
    pub image_family: String,
    pub network: String,
    /// Network tags applied to BOTH tiers, so ingress rules created for the
    /// logical application cover them uniformly.
    pub tags: Vec<String>,
}

/// One metadata blob the first-tier bootstrap fetches to a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapArtifact {
    pub key: String,
    pub dest: String,
}

/// Ordered bootstrap steps for the first tier: fetch the named artifacts,
/// then run the commands.
#[derive(Debug, Clone, Default)]
pub struct BootstrapPlan {
    pub artifacts: Vec<BootstrapArtifact>,
    pub commands: Vec<String>,
}

impl BootstrapPlan {
    pub fn fetch(mut self, key: impl Into<String>, dest: impl Into<String>) -> Self {
        self.artifacts.push(BootstrapArtifact {
            key: key.into(),
            dest: dest.into(),
        });
        self
    }

    pub fn run(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }
}

/// Renders the first-tier startup script from a plan: one metadata fetch per
/// artifact, then the command list.
pub fn render_startup_script(plan: &BootstrapPlan) -> String {
    let mut script = String::from("#!/bin/bash\nset -euxo pipefail\n\nmkdir -p /srv\ncd /srv\n\n");
    for artifact in &plan.artifacts {
        script.push_str(&format!(
            "curl -sf -H \"Metadata-Flavor: Google\" \\\n  {}/{} -o {}\n",
            METADATA_ATTRIBUTES_URL, artifact.key, artifact.dest
        ));
    }
    script.push('\n');
    for command in &plan.commands {
        script.push_str(command);
        script.push('\n');
    }
    script
}

/// The default bootstrap: fetch credentials and config (and the target's
/// startup script when present), install the provisioning binary from
/// `agent_url`, and run the second hop with no dependency on the
/// orchestrator's process state.
pub fn default_bootstrap_plan(agent_url: &str, with_target_startup: bool) -> BootstrapPlan {
    let mut plan = BootstrapPlan::default()
        .fetch(CREDENTIALS_KEY, "/srv/service-credentials.json")
        .fetch(CHAIN_CONFIG_KEY, "/srv/chain-config.json");
    if with_target_startup {
        plan = plan.fetch(TARGET_STARTUP_KEY, "/srv/target-startup.sh");
    }
    plan.run(format!("curl -sfL {} -o /srv/fleet", agent_url))
        .run("chmod +x /srv/fleet")
        .run(
            "/srv/fleet launch --credentials /srv/service-credentials.json \
             --config /srv/chain-config.json",
        )
}

/// The complete payload placed in the first-tier instance's metadata.
#[derive(Debug, Clone)]
pub struct ChainPayload {
    pub config: ChainConfig,
    pub credentials_json: String,
    pub target_startup_script: Option<String>,
    pub plan: BootstrapPlan,
}

impl ChainPayload {
    /// Assembles the metadata items: the rendered bootstrap under the
    /// startup-script key plus one self-contained blob per stable key.
    pub fn metadata_items(&self) -> Result<Vec<MetadataItem>, serde_json::Error> {
        let mut items = vec![
            MetadataItem {
                key: STARTUP_SCRIPT_KEY.to_string(),
                value: render_startup_script(&self.plan),
            },
            MetadataItem {
                key: CREDENTIALS_KEY.to_string(),
                value: self.credentials_json.clone(),
            },
            MetadataItem {
                key: CHAIN_CONFIG_KEY.to_string(),
                value: serde_json::to_string_pretty(&self.config)?,
            },
        ];
        if let Some(script) = &self.target_startup_script {
            items.push(MetadataItem {
                key: TARGET_STARTUP_KEY.to_string(),
                value: script.clone(),
            });
        }
        Ok(items)
    }
}

/// Derives the second-tier spec from a chain config. The target carries the
/// first tier's tags (tag-consistency invariant).
pub fn target_spec(
    config: &ChainConfig,
    image_self_link: String,
    startup_script: Option<String>,
) -> InstanceSpec {
    let mut spec = InstanceSpec::new(
        &config.target_name,
        vec![config.zone.clone()],
        &config.target_machine_type,
        BootSource::Image {
            self_link: image_self_link,
        },
    )
    .with_tags(config.tags.clone());
    spec.network = config.network.clone();
    if let Some(script) = startup_script {
        spec = spec.with_startup_script(script);
    }
    spec
}

/// Errors from the second hop.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to resolve image family {family} in {project}: {source}")]
    ImageLookup {
        project: String,
        family: String,
        #[source]
        source: GceError,
    },
    #[error(transparent)]
    Provision(#[from] AllZonesExhausted),
}

/// Runs the second hop: resolve the target image, derive the target spec,
/// and drive the same create -> await -> running flow. Executed on the
/// first-tier host by the `launch` CLI subcommand, parameterized solely by
/// the fetched `ChainConfig` and credential.
pub async fn launch_target<C: Compute>(
    client: &C,
    config: &ChainConfig,
    startup_script: Option<String>,
    policy: &PollPolicy,
) -> Result<ZoneOutcome, LaunchError> {
    let image = client
        .image_from_family(&config.image_project, &config.image_family)
        .await
        .map_err(|source| LaunchError::ImageLookup {
            project: config.image_project.clone(),
            family: config.image_family.clone(),
            source,
        })?;
    let spec = target_spec(config, image.self_link, startup_script);
    Ok(fallback::provision_instance(client, &spec, policy).await?)
}

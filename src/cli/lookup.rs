//! Tree, events and logs command handlers

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use release_tree::config::Config;
use release_tree::gateway::{GatewayClient, GatewaySettings};
use release_tree::kube::discovery::DiscoveryResolver;
use release_tree::kube::fetch::LiveFetcher;
use release_tree::platform::{AccessReviewAuthorizer, AllowAll, Authorizer, KubeControlPlane};
use release_tree::services::{EventTarget, ReleaseTreeService};
use release_tree::tree::{HealthRegistry, TreeBuilder};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Identifies one deployed component
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
    /// Control-plane namespace of the component
    #[arg(long, short = 'n')]
    pub namespace: String,

    /// Project that owns the component
    #[arg(long, short = 'p')]
    pub project: String,

    /// Component name
    #[arg(long, short = 'c')]
    pub component: String,

    /// Environment the release is deployed to
    #[arg(long, short = 'e')]
    pub environment: String,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

/// Selects a resource for the events command
#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Kind of the resource (e.g., Deployment, Pod)
    #[arg(long)]
    pub kind: String,

    /// Name of the resource
    #[arg(long)]
    pub name: String,

    /// Data-plane namespace, when it differs from the one in the release
    #[arg(long)]
    pub resource_namespace: Option<String>,

    /// Only events for this object UID
    #[arg(long)]
    pub uid: Option<String>,
}

impl EventArgs {
    pub fn target(&self) -> EventTarget {
        EventTarget {
            kind: self.kind.clone(),
            name: self.name.clone(),
            namespace: self.resource_namespace.clone(),
            uid: self.uid.clone(),
        }
    }
}

/// Selects a pod for the logs command
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Pod name
    #[arg(long)]
    pub pod: String,

    /// Only lines newer than this many seconds
    #[arg(long)]
    pub since_seconds: Option<i64>,
}

/// Wire the service from configuration
pub async fn build_service(config: &Config) -> Result<ReleaseTreeService> {
    tracing::debug!("Initializing Kubernetes client");
    let client = release_tree::kube::create_client().await?;

    let authorizer: Arc<dyn Authorizer> = if config.authz.enabled {
        Arc::new(AccessReviewAuthorizer::new(client.clone()))
    } else {
        Arc::new(AllowAll)
    };
    let store = Arc::new(KubeControlPlane::new(client.clone()));

    let tree = match &config.gateway.url {
        Some(url) => {
            let settings = GatewaySettings {
                base_url: url.clone(),
                timeout: Duration::from_secs(config.gateway.timeout_seconds),
                ca_file: config.gateway.ca_file.clone(),
                insecure_skip_verify: config.gateway.insecure_skip_verify,
            };
            let gateway = GatewayClient::new(&settings)?;
            let fetcher =
                LiveFetcher::with_limit(Arc::new(gateway), config.fetch.max_response_bytes);
            Some(TreeBuilder::new(
                Arc::new(DiscoveryResolver::new(client)),
                fetcher,
                Arc::new(HealthRegistry::with_defaults()),
            ))
        }
        None => {
            tracing::warn!("No gateway.url configured; live lookups will fail");
            None
        }
    };

    Ok(ReleaseTreeService::new(authorizer, store, tree))
}

pub async fn handle_tree_command(config: &Config, args: ReleaseArgs) -> Result<()> {
    let service = build_service(config).await?;
    let response = with_timeout(
        config,
        service.get_release_resource_tree(
            &args.namespace,
            &args.project,
            &args.component,
            &args.environment,
        ),
    )
    .await?
    .with_context(|| {
        format!(
            "Failed to get resource tree for {}/{} in {}",
            args.project, args.component, args.environment
        )
    })?;

    print_output(&response, args.output)
}

pub async fn handle_events_command(config: &Config, args: EventArgs) -> Result<()> {
    let service = build_service(config).await?;
    let target = args.target();
    let release = &args.release;
    let response = with_timeout(
        config,
        service.get_resource_events(
            &release.namespace,
            &release.project,
            &release.component,
            &release.environment,
            &target,
        ),
    )
    .await?
    .with_context(|| format!("Failed to get events for {} {}", target.kind, target.name))?;

    print_output(&response, release.output)
}

pub async fn handle_logs_command(config: &Config, args: LogArgs) -> Result<()> {
    let service = build_service(config).await?;
    let release = &args.release;
    let response = with_timeout(
        config,
        service.get_resource_logs(
            &release.namespace,
            &release.project,
            &release.component,
            &release.environment,
            &args.pod,
            args.since_seconds,
        ),
    )
    .await?
    .with_context(|| format!("Failed to get logs for pod {}", args.pod))?;

    print_output(&response, release.output)
}

async fn with_timeout<F: std::future::Future>(config: &Config, fut: F) -> Result<F::Output> {
    let limit = Duration::from_secs(config.request_timeout_seconds);
    tokio::time::timeout(limit, fut)
        .await
        .with_context(|| format!("Request timed out after {}s", limit.as_secs()))
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = render(value, format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).context("Failed to serialize output as YAML")
        }
    }
}

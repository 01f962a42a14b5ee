// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kube_crd_provider::constants::MANIFEST_SUFFIX;
use kube_crd_provider::kubernetes::create_client;
use kube_crd_provider::manifest;
use kube_crd_provider::resources::Registry;
use kube_crd_provider::state::{DataSourceConfig, ManifestState, ResourceState, StateMetadata};
use kube_crd_provider::{Provider, ProviderConfig};

#[derive(Parser)]
#[command(name = "kube-crd-provider")]
#[command(version)]
#[command(about = "Manage cert-manager custom resources with server-side apply", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubeconfig file to use instead of the inferred configuration
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Default field manager for server-side apply
    #[arg(long, global = true)]
    field_manager: Option<String>,

    /// Wait this long for the CRD to be served before talking to the cluster, e.g. `1m`
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    wait_for_crd: Option<Duration>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List resource and data source types
    Resources,

    /// Print the schema of a resource or data source type
    Schema {
        type_name: String,

        /// Print the data source schema instead
        #[arg(long)]
        data_source: bool,
    },

    /// Render a manifest without contacting the cluster
    Manifest {
        type_name: String,

        /// Manifest data source configuration (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    #[command(flatten)]
    Cluster(ClusterCommand),
}

/// Commands that talk to the cluster
#[derive(Subcommand)]
enum ClusterCommand {
    /// Create a resource from a plan
    Create {
        type_name: String,

        /// Plan file (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Refresh a resource state from the cluster
    Read {
        type_name: String,

        /// State file (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Apply a new plan over an existing state
    Update {
        type_name: String,

        /// Prior state file
        #[arg(long)]
        prior: PathBuf,

        /// Plan file (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Delete the object behind a state
    Delete {
        type_name: String,

        /// State file (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Import an existing object by `namespace/name` or `name`
    Import { type_name: String, id: String },

    /// Read an object as a data source
    Get {
        type_name: String,

        #[arg(long)]
        name: String,

        #[arg(short, long)]
        namespace: Option<String>,
    },
}

impl ClusterCommand {
    fn type_name(&self) -> &str {
        match self {
            ClusterCommand::Create { type_name, .. }
            | ClusterCommand::Read { type_name, .. }
            | ClusterCommand::Update { type_name, .. }
            | ClusterCommand::Delete { type_name, .. }
            | ClusterCommand::Import { type_name, .. }
            | ClusterCommand::Get { type_name, .. } => type_name,
        }
    }
}

#[derive(Serialize)]
struct TypeListing {
    resources: Vec<String>,
    data_sources: Vec<String>,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ProviderConfig> {
    let mut config = ProviderConfig::from_env()?;
    if let Some(path) = &cli.kubeconfig {
        config.kubeconfig = Some(path.clone());
    }
    if let Some(context) = &cli.context {
        config.context = Some(context.clone());
    }
    if let Some(manager) = &cli.field_manager {
        if manager.trim().is_empty() {
            bail!("--field-manager must not be empty");
        }
        config.field_manager = manager.clone();
    }
    Ok(config)
}

/// Read a YAML or JSON document from `path`, or stdin for `-`
fn read_document(path: &Path) -> Result<serde_json::Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_state(path: &Path) -> Result<ResourceState> {
    ResourceState::from_value(read_document(path)?)
        .with_context(|| format!("Invalid state in {}", path.display()))
}

fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_value(read_document(path)?)
        .with_context(|| format!("Invalid content in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn manifest_type(type_name: &str) -> String {
    if type_name.ends_with(MANIFEST_SUFFIX) {
        type_name.to_string()
    } else {
        format!("{type_name}{MANIFEST_SUFFIX}")
    }
}

async fn run_cluster(command: ClusterCommand, provider: &Provider) -> Result<()> {
    match command {
        ClusterCommand::Create { type_name, file } => {
            let plan = read_state(&file)?;
            print_json(&provider.create(&type_name, plan).await?)
        }
        ClusterCommand::Read { type_name, file } => {
            let state = read_state(&file)?;
            match provider.read(&type_name, &state).await? {
                Some(state) => print_json(&state),
                None => {
                    info!("Object is gone, state should be removed");
                    print_json(&serde_json::Value::Null)
                }
            }
        }
        ClusterCommand::Update {
            type_name,
            prior,
            file,
        } => {
            let prior = read_state(&prior)?;
            let plan = read_state(&file)?;
            print_json(&provider.update(&type_name, &prior, plan).await?)
        }
        ClusterCommand::Delete { type_name, file } => {
            let state = read_state(&file)?;
            provider.delete(&type_name, &state).await?;
            Ok(())
        }
        ClusterCommand::Import { type_name, id } => {
            print_json(&provider.import(&type_name, &id).await?)
        }
        ClusterCommand::Get {
            type_name,
            name,
            namespace,
        } => {
            let config = DataSourceConfig {
                metadata: StateMetadata {
                    name,
                    namespace,
                    ..Default::default()
                },
            };
            print_json(&provider.read_data_source(&type_name, &config).await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    debug!(
        "Configuration loaded: field_manager={}, wait_timeout={:?}, poll_interval={:?}",
        config.field_manager, config.wait_timeout, config.poll_interval
    );

    let registry = Registry::cert_manager();
    match cli.command {
        Commands::Resources => print_json(&TypeListing {
            resources: registry.type_names().map(str::to_string).collect(),
            data_sources: registry.data_source_type_names(),
        }),
        Commands::Schema {
            type_name,
            data_source,
        } => {
            let schema = if data_source {
                registry.data_source_schema(&type_name)?
            } else {
                registry.get(&type_name)?.resource_schema()
            };
            print_json(&schema)
        }
        Commands::Manifest { type_name, file } => {
            let config: ManifestState = read_input(&file)?;
            let desc = registry.manifest(&manifest_type(&type_name))?;
            print_json(&manifest::render(desc, &config)?)
        }
        Commands::Cluster(command) => {
            let client = create_client(&config).await?;
            info!("Connected to Kubernetes cluster");

            let provider = Provider::with_registry(client, config, registry);
            if let Some(timeout) = cli.wait_for_crd {
                provider
                    .ensure_served(command.type_name(), Some(timeout))
                    .await?;
            }
            run_cluster(command, &provider).await
        }
    }
}

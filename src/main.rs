// Copyright 2026, The Synka Authors
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KubeConfig};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use synka::cluster::ClusterRegistry;
use synka::config::Config;
use synka::constants::DEFAULT_WATCHED_RESOURCES;
use synka::controller::{Controller, ControllerSettings};
use synka::resource::ResourceKind;

/// Synka synchronizes Kubernetes state between clusters
#[derive(Parser)]
#[command(name = "synka", version, about)]
struct Args {
    /// Path to the synka configuration file
    #[arg(long, default_value = "/etc/synka/config.yaml")]
    config: PathBuf,

    /// Path to a kubeconfig for the source cluster. Only required if
    /// out-of-cluster.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Address of the Kubernetes API server. Overrides any value in the
    /// kubeconfig.
    #[arg(long)]
    master: Option<String>,

    /// Resource to watch, as resource.version.group. Can be used multiple
    /// times; overrides the `resources` list in the configuration file.
    #[arg(long = "informer")]
    informers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting synka");
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    info!("Configured {} target cluster(s)", config.clusters.len());

    let client = source_client(&args).await?;
    info!("Connected to source cluster");

    let resources = watched_resources(&args, &config);
    let registry = Arc::new(ClusterRegistry::new(config.clusters.clone()));
    let settings = ControllerSettings {
        workers: config.workers,
        retry_limit: config.retry_limit,
        cache_sync_timeout: Duration::from_secs(config.cache_sync_timeout_secs),
    };

    let shutdown = spawn_signal_handler();

    let mut controllers = JoinSet::new();
    for arg in resources {
        let kind = ResourceKind::parse(&arg)?;
        let controller = Controller::new(client.clone(), Arc::clone(&registry), kind, settings);
        let shutdown = shutdown.clone();
        controllers.spawn(async move {
            if let Err(e) = controller.run(shutdown).await {
                error!("Controller stopped: {}", e);
            }
        });
    }

    while controllers.join_next().await.is_some() {}
    info!("Server stopped");
    Ok(())
}

/// Resource kinds to watch: --informer flags win over the configuration
/// file, which wins over the built-in defaults
fn watched_resources(args: &Args, config: &Config) -> Vec<String> {
    if !args.informers.is_empty() {
        args.informers.clone()
    } else if !config.resources.is_empty() {
        config.resources.clone()
    } else {
        DEFAULT_WATCHED_RESOURCES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Build the client for the source cluster from an explicit kubeconfig or
/// the in-cluster/inferred environment
async fn source_client(args: &Args) -> Result<Client> {
    let mut config = match &args.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            KubeConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("failed to build config from kubeconfig")?
        }
        None => KubeConfig::infer()
            .await
            .context("failed to infer source cluster config")?,
    };

    if let Some(master) = &args.master {
        config.cluster_url = master
            .parse()
            .with_context(|| format!("invalid --master address '{}'", master))?;
    }

    Client::try_from(config).context("failed to create source cluster client")
}

/// First SIGINT/SIGTERM flips the shutdown signal so controllers drain; a
/// second one terminates the process immediately.
fn spawn_signal_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                // Park while holding the sender so controllers never see a
                // spurious shutdown
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
        info!("Shutdown signal received, draining controllers");
        let _ = tx.send(true);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
        warn!("Second shutdown signal received, exiting immediately");
        std::process::exit(1);
    });
    rx
}

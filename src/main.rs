// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use ingress_relocator::{
    constants::{
        DEFAULT_CYCLE_TIMEOUT_SECS, ERROR_REQUEUE_DURATION_SECS, KIND_CLUSTER_RELOCATION,
        METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT,
        SUCCESS_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS,
    },
    context::{Context, RelocationConfig},
    crd::ClusterRelocation,
    errors::RelocationError,
    metrics,
    reconcilers::{reconcile_relocation, record_cycle_timeout},
    status_reasons::REASON_CYCLE_TIMEOUT,
    store::KubeStore,
};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Relocates an OpenShift cluster's ingress to the domain requested by a `ClusterRelocation`
#[derive(Parser, Debug)]
#[command(name = "ingress-relocator", version, about, long_about = None)]
struct Args {
    /// YAML file overriding well-known namespaces, names and route exclusions
    #[arg(long, env = "INGRESS_RELOCATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format: "text" or "json"
    #[arg(long, env = "RUST_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Address of the Prometheus metrics endpoint
    #[arg(long, env = "METRICS_ADDR", default_value_t = default_metrics_addr())]
    metrics_addr: SocketAddr,

    /// Upper bound for one reconciliation cycle, including readiness waits
    #[arg(long, env = "CYCLE_TIMEOUT_SECS", default_value_t = DEFAULT_CYCLE_TIMEOUT_SECS)]
    cycle_timeout_secs: u64,

    /// Requeue interval after a successful reconciliation
    #[arg(long, env = "REQUEUE_SECS", default_value_t = SUCCESS_REQUEUE_DURATION_SECS)]
    requeue_secs: u64,
}

fn default_metrics_addr() -> SocketAddr {
    let ip = METRICS_SERVER_BIND_ADDRESS
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    SocketAddr::new(ip, METRICS_SERVER_PORT)
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// State shared by every reconciliation.
struct OperatorState {
    ctx: Context,
    cycle_timeout: Duration,
    requeue: Duration,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("ingress-relocator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

fn init_tracing(log_format: &str) {
    // Respects RUST_LOG if set, otherwise defaults to INFO level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_tracing(&args.log_format);

    info!("Starting Ingress Relocation Controller");

    let config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            RelocationConfig::from_yaml_file(path)?
        }
        None => RelocationConfig::default(),
    };
    debug!(?config, "Configuration loaded");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    debug!("Kubernetes client initialized successfully");

    let state = Arc::new(OperatorState {
        ctx: Context::new(Arc::new(KubeStore::new(client.clone())), config),
        cycle_timeout: Duration::from_secs(args.cycle_timeout_secs),
        requeue: Duration::from_secs(args.requeue_secs),
    });

    tokio::select! {
        result = run_relocation_controller(client, state) => {
            error!("CRITICAL: ClusterRelocation controller exited unexpectedly: {:?}", result);
            result
        }
        result = run_metrics_server(args.metrics_addr) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
    }
}

/// Run the `ClusterRelocation` controller
///
/// Secrets owned by a relocation are watched too, so a deleted or edited
/// certificate copy is repaired without waiting for the periodic requeue.
async fn run_relocation_controller(client: Client, state: Arc<OperatorState>) -> Result<()> {
    info!("Starting ClusterRelocation controller");

    let api = Api::<ClusterRelocation>::all(client.clone());
    let config = &state.ctx.config;
    let ingress_secrets = Api::<Secret>::namespaced(client.clone(), &config.ingress_namespace);
    let config_secrets = Api::<Secret>::namespaced(client.clone(), &config.config_namespace);

    Controller::new(api, Config::default())
        .owns(ingress_secrets, Config::default())
        .owns(config_secrets, Config::default())
        .shutdown_on_signal()
        .run(reconcile_relocation_wrapper, error_policy, Arc::clone(&state))
        .for_each(|_| futures::future::ready(()))
        .await;

    info!("ClusterRelocation controller stopped");
    Ok(())
}

/// Reconcile wrapper for `ClusterRelocation`
async fn reconcile_relocation_wrapper(
    relocation: Arc<ClusterRelocation>,
    state: Arc<OperatorState>,
) -> Result<Action, ReconcileError> {
    let name = relocation.name_any();
    debug!(relocation = %name, "Reconcile wrapper called for ClusterRelocation");

    match tokio::time::timeout(
        state.cycle_timeout,
        reconcile_relocation(&state.ctx, &relocation),
    )
    .await
    {
        Ok(Ok(())) => {
            debug!(
                "Successfully reconciled ClusterRelocation {}, requeueing in {:?}",
                name, state.requeue
            );
            Ok(Action::requeue(state.requeue))
        }
        Ok(Err(e)) => Err(anyhow::Error::new(e).into()),
        Err(_) => {
            metrics::record_error(KIND_CLUSTER_RELOCATION, REASON_CYCLE_TIMEOUT);
            error!(
                "Reconciliation of ClusterRelocation {} did not finish within {:?}",
                name, state.cycle_timeout
            );
            if let Err(e) = record_cycle_timeout(&state.ctx, &relocation, state.cycle_timeout).await
            {
                warn!(relocation = %name, "Failed to update ClusterRelocation status: {}", e);
            }
            Err(anyhow::anyhow!(
                "reconciliation did not finish within {:?}",
                state.cycle_timeout
            )
            .into())
        }
    }
}

/// Decide how a failed reconciliation is retried.
///
/// Validation errors wait for the user to change the relocation; everything
/// else is retried after a fixed delay.
fn requeue_action(err: &ReconcileError) -> Action {
    match err.0.downcast_ref::<RelocationError>() {
        Some(e) if e.is_validation() => Action::await_change(),
        Some(e) => {
            metrics::record_reconciliation_requeue(KIND_CLUSTER_RELOCATION, e.reason());
            Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
        }
        None => {
            metrics::record_reconciliation_requeue(KIND_CLUSTER_RELOCATION, REASON_CYCLE_TIMEOUT);
            Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
        }
    }
}

/// Error policy for the `ClusterRelocation` controller
fn error_policy(
    relocation: Arc<ClusterRelocation>,
    err: &ReconcileError,
    _state: Arc<OperatorState>,
) -> Action {
    warn!(
        relocation = %relocation.name_any(),
        "Reconciliation failed: {}", err
    );
    requeue_action(err)
}

/// Serve the Prometheus registry
async fn run_metrics_server(addr: SocketAddr) -> Result<()> {
    let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics server to {addr}"))?;
    info!("Serving metrics on http://{}{}", addr, METRICS_SERVER_PATH);

    axum::serve(listener, app)
        .await
        .context("metrics server failed")?;
    Ok(())
}

async fn metrics_handler() -> (StatusCode, String) {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;

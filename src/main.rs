// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use acorndns::{
    config::snapshot_from_config_map,
    constants::{
        CONFIG_MAP_NAME, CONTROLLER_NAME, DEFAULT_DNS_ENDPOINT, DEFAULT_RENEW_INTERVAL_SECS,
        DNS_SECRET_NAME, ERROR_REQUEUE_DURATION_SECS, METRICS_SERVER_BIND_ADDRESS,
        METRICS_SERVER_PATH, METRICS_SERVER_PORT, RESYNC_REQUEUE_DURATION_SECS, SYSTEM_NAMESPACE,
        TOKIO_WORKER_THREADS,
    },
    context::{Context, ControllerSettings},
    dns_errors::ReconcileError,
    metrics::{
        gather_metrics, record_error, record_reconciliation_error, record_reconciliation_success,
    },
    reconcilers::{reconcile_dns, renew_domain},
};
use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Controller keeping the installation's managed DNS domain in line with its configuration
#[derive(Parser, Debug)]
#[command(name = CONTROLLER_NAME, version, about, long_about = None)]
struct Args {
    /// Namespace of the configuration ConfigMap and the DNS Secret
    #[arg(long, env = "ACORN_NAMESPACE", default_value = SYSTEM_NAMESPACE)]
    namespace: String,

    /// Name of the configuration ConfigMap to watch
    #[arg(long, env = "ACORN_CONFIG_MAP", default_value = CONFIG_MAP_NAME)]
    config_map: String,

    /// Name of the Secret holding the DNS record
    #[arg(long, env = "ACORN_DNS_SECRET", default_value = DNS_SECRET_NAME)]
    secret_name: String,

    /// Seconds between two lease renewals of the managed domain
    #[arg(long, env = "ACORN_DNS_RENEW_INTERVAL", default_value_t = DEFAULT_RENEW_INTERVAL_SECS)]
    renew_interval_secs: u64,

    /// Port of the Prometheus metrics endpoint
    #[arg(long, env = "ACORN_METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    metrics_port: u16,
}

impl Args {
    fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            namespace: self.namespace.clone(),
            config_map_name: self.config_map.clone(),
            secret_name: self.secret_name.clone(),
            renew_interval: Duration::from_secs(self.renew_interval_secs.max(1)),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("acorn-dns-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

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

    info!(
        namespace = %args.namespace,
        config_map = %args.config_map,
        secret = %args.secret_name,
        "Starting Acorn DNS Controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Arc::new(Context::new(client.clone(), args.settings()));

    // These tasks should never exit - if one does, log it and exit the main process
    tokio::select! {
        result = run_dns_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: DNS controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DNS controller exited unexpectedly without error")
        }
        result = run_renewal_loop(client.clone(), ctx.clone()) => {
            error!("CRITICAL: Lease renewal loop exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Lease renewal loop exited unexpectedly without error")
        }
        result = run_metrics_server(args.metrics_port) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping");
            Ok(())
        }
    }
}

/// Run the controller watching the configuration `ConfigMap`
async fn run_dns_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting DNS controller");

    let api = Api::<ConfigMap>::namespaced(client, &ctx.settings.namespace);
    let watcher_config = Config::default().fields(&ctx.settings.config_map_selector());

    Controller::new(api, watcher_config)
        .run(reconcile_dns_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for the configuration `ConfigMap`
async fn reconcile_dns_wrapper(
    config_map: Arc<ConfigMap>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    let result = match snapshot_from_config_map(&config_map) {
        Ok(snapshot) => {
            let _pass = ctx.lock_record().await;
            reconcile_dns(ctx.registrar.as_ref(), ctx.store.as_ref(), &snapshot).await
        }
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(outcome) => {
            info!(
                config_map = %config_map.name_any(),
                outcome = outcome.as_str(),
                state = %outcome.record().state,
                "Successfully reconciled DNS configuration"
            );
            record_reconciliation_success(outcome.as_str(), start.elapsed());
            Ok(Action::requeue(Duration::from_secs(
                RESYNC_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            error!(
                config_map = %config_map.name_any(),
                error = %e,
                "Failed to reconcile DNS configuration"
            );
            record_reconciliation_error(e.kind(), start.elapsed());
            Err(e)
        }
    }
}

/// Error policy for the DNS controller
fn error_policy(_resource: Arc<ConfigMap>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Renew the managed domain lease on a fixed interval
async fn run_renewal_loop(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!(
        interval_secs = ctx.settings.renew_interval.as_secs(),
        "Starting lease renewal loop"
    );

    let config_maps = Api::<ConfigMap>::namespaced(client, &ctx.settings.namespace);
    let mut ticker = tokio::time::interval(ctx.settings.renew_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The first tick completes immediately; the controller handles startup
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let endpoint = match config_maps.get_opt(&ctx.settings.config_map_name).await {
            Ok(Some(config_map)) => match snapshot_from_config_map(&config_map) {
                Ok(snapshot) => snapshot.endpoint,
                Err(e) => {
                    warn!(error = %e, "Invalid configuration, renewing against default endpoint");
                    DEFAULT_DNS_ENDPOINT.to_string()
                }
            },
            Ok(None) => DEFAULT_DNS_ENDPOINT.to_string(),
            Err(e) => {
                warn!(error = %e, "Failed to read configuration, skipping lease renewal");
                continue;
            }
        };

        // No record set is managed here, so renewal only extends the lease
        let renewed = {
            let _pass = ctx.lock_record().await;
            renew_domain(ctx.registrar.as_ref(), ctx.store.as_ref(), &endpoint, &[]).await
        };

        match renewed {
            Ok(outcome) => debug!(outcome = outcome.as_str(), "Lease renewal finished"),
            Err(e) => {
                error!(error = %e, "Lease renewal failed");
                record_error(e.kind());
            }
        }
    }
}

/// Serve Prometheus metrics
async fn run_metrics_server(port: u16) -> Result<()> {
    let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

    let address = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, path = METRICS_SERVER_PATH, "Metrics server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

use anyhow::{Context, Result};
use common::config::{Config, DEFAULT_CONFIG_PATH};
use common::monitor_api::MonitorClient;
use dashboard::address::PageAddress;
use dashboard::cli::{self, Command};
use dashboard::filter_state::FilterState;
use dashboard::orchestrator::DataOrchestrator;
use dashboard::{api, metrics};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;
    let config_path = invocation
        .config_path
        .as_deref()
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path)?;

    common::observability::init(
        "dashboard",
        &config.general.log_level,
        config.general.log_format,
    )?;
    info!(path = %config_path, api = %config.api.base_url, "dashboard starting");

    match invocation.command {
        Command::Url { address } => {
            cli::print_url(&view(address.as_deref(), &config));
            Ok(())
        }
        Command::Once { address } => {
            let orchestrator = build_orchestrator(&config)?;
            cli::run_once(&orchestrator, &view(address.as_deref(), &config)).await
        }
        Command::Run { address } => run(&config, view(address.as_deref(), &config)).await,
    }
}

fn view(address: Option<&str>, config: &Config) -> FilterState {
    let raw = address.unwrap_or(&config.view.address);
    FilterState::from_address(PageAddress::parse(raw))
}

fn build_orchestrator(config: &Config) -> Result<DataOrchestrator<MonitorClient>> {
    let client = MonitorClient::new(&config.api.base_url, config.api.request_timeout())?;
    Ok(DataOrchestrator::new(
        Arc::new(client),
        config.refresh.interval(),
    ))
}

async fn run(config: &Config, filters: FilterState) -> Result<()> {
    if let Some(observability) = &config.observability {
        metrics::install_prometheus(observability.prometheus_port)?;
        info!(port = observability.prometheus_port, "prometheus exporter listening");
    }

    let orchestrator = build_orchestrator(config)?;
    info!(url = %filters.shareable_url(), "opening dashboard view");
    let session = orchestrator.start_session(filters);

    let shutdown = CancellationToken::new();
    let server = match &config.server {
        Some(server) => {
            let state = Arc::new(api::AppState {
                session: session.handle(),
                started_at: chrono::Utc::now(),
            });
            let bind_addr = format!("{}:{}", server.host, server.port);
            let listener = tokio::net::TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("failed to bind {bind_addr}"))?;
            info!(addr = %bind_addr, "starting dashboard HTTP server");

            let shutdown = shutdown.clone();
            Some(tokio::spawn(async move {
                axum::serve(listener, api::router(state))
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await
            }))
        }
        None => None,
    };

    let result = cli::run_interactive(session).await;

    shutdown.cancel();
    if let Some(server) = server {
        server
            .await
            .context("HTTP server task panicked")?
            .context("HTTP server failed")?;
    }
    info!("dashboard stopped");
    result
}

//! Market-maker RFQ gateway entrypoint
//!
//! Mirrors the solver's `main`: parse the CLI, configure telemetry, build the
//! supervised component graph, then serve `/health` and `/metrics` until a
//! shutdown signal arrives.

mod cli;
mod error;
mod health;
mod inventory;
mod market_state;
mod model;
mod quoter;
mod registry;
mod signer;
mod supervisor;
mod telemetry;
mod upstream;

use clap::Parser;
use tracing::info;
use warp::Filter;

use cli::Cli;
use error::handle_rejection;
use supervisor::Supervisor;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    telemetry::configure_logging(&cli.log_level);
    let metrics_handle = telemetry::install_metrics_recorder();

    info!("starting market-maker gateway");
    let supervisor = Supervisor::start(&cli).await?;

    let routes = health::health_route(supervisor.health_registry.clone())
        .or(telemetry::metrics_route(metrics_handle))
        .with(telemetry::with_tracing())
        .recover(handle_rejection);

    let port = cli.port;
    let server = tokio::spawn(warp::serve(routes).run(([0, 0, 0, 0], port)));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    server.abort();
    supervisor.shutdown().await;

    Ok(())
}

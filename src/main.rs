//! spaceship-ddns binary
//!
//! Resolves configuration, then runs one reconciliation pass or loops until
//! SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spaceship_ddns::cli::Args;
use spaceship_ddns::config::Config;
use spaceship_ddns::health::HealthServer;
use spaceship_ddns::ip_source::HttpIpSource;
use spaceship_ddns::reconciler::Reconciler;
use spaceship_ddns::scheduler::{run_once, FailurePolicy, Scheduler, StopHandle, TokioSleeper};
use spaceship_ddns::spaceship::SpaceshipClient;

//==============================================================================
// Main
//==============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args).context("Config load failed")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        domain = %config.domain,
        names = ?config.names,
        "Starting spaceship-ddns"
    );

    let client = SpaceshipClient::new(&config.api_key, &config.api_secret, config.timeout)
        .context("Spaceship client failed")?;
    let ip_source =
        HttpIpSource::new(&config.ip_service, config.timeout).context("IP source failed")?;
    let reconciler = Reconciler::new(
        config.domain.clone(),
        config.names.clone(),
        Arc::new(client),
        Arc::new(ip_source),
    );

    let Some(delay) = config.loop_delay else {
        run_once(&reconciler).await.context("Update failed")?;
        return Ok(());
    };

    let (stop, stop_rx) = StopHandle::new();
    tokio::spawn(wait_for_shutdown(stop.clone()));

    let policy = if config.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let mut scheduler = Scheduler::new(delay, policy, TokioSleeper, stop_rx);

    let mut health = None;
    if config.health_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.health_port));
        match HealthServer::start(addr, scheduler.state()).await {
            Ok(server) => health = Some(server),
            Err(e) => warn!("Health endpoint disabled: {}", e),
        }
    }

    let result = scheduler.run(&reconciler).await;
    if let Some(server) = health.as_mut() {
        server.stop();
    }
    let passes = result.context("Update loop failed")?;
    if stop.is_stopped() {
        info!(passes, "Shut down on signal");
    }
    Ok(())
}

/// Requests a stop on SIGINT or SIGTERM
async fn wait_for_shutdown(stop: StopHandle) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
                    _ = sigterm.recv() => info!("SIGTERM received"),
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("SIGINT received");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Interrupt received");
    }
    stop.stop();
}

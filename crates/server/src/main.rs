mod app;
mod bootstrap;
mod health;
mod relay;
#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use parley_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use parley_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let application = bootstrap::bootstrap_with_config(config).await?;
    let server_config = &application.config.server;
    let address = format!("{}:{}", server_config.bind_address, server_config.port);
    let grace = Duration::from_secs(server_config.graceful_shutdown_secs);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        mapped_users = application.state.mapping.len(),
        "parley-server listening"
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app::router(application.state))
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        signal = wait_for_shutdown() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = grace.as_secs(),
        "draining in-flight requests"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            "in-flight requests still running after grace period, exiting anyway"
        ),
    }

    info!(event_name = "system.server.stopped", correlation_id = "shutdown", "parley-server stopped");
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

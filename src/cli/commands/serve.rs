//! `dayloop serve`: HTTP API plus the optional daily reset scheduler.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::http::{ProgressHttpConfig, ProgressHttpServer};
use crate::cli::context::AppContext;
use crate::services::{DailyResetConfig, DailyResetDaemon, DailyResetEvent};

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not start the daily reset scheduler even if enabled in config
    #[arg(long)]
    pub no_scheduler: bool,
}

/// Serve until ctrl-c, then stop the scheduler and drain connections.
pub async fn execute(args: ServeArgs, ctx: &AppContext) -> Result<()> {
    let mut http_config = ProgressHttpConfig::from(&ctx.config.server);
    if let Some(host) = args.host {
        http_config.host = host;
    }
    if let Some(port) = args.port {
        http_config.port = port;
    }

    let scheduler = if ctx.config.scheduler.enabled && !args.no_scheduler {
        let daemon = DailyResetDaemon::new(
            Arc::clone(&ctx.service),
            DailyResetConfig::from(&ctx.config.scheduler),
        );
        let handle = daemon.handle();
        tokio::spawn(log_scheduler_events(daemon.run()));
        Some(handle)
    } else {
        None
    };

    let addr = format!("{}:{}", http_config.host, http_config.port);
    let server = ProgressHttpServer::new(Arc::clone(&ctx.service), http_config);
    let result = server
        .serve_with_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("HTTP server on {addr} failed"));

    if let Some(handle) = scheduler {
        handle.stop();
    }
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c, shutting down");
        return;
    }
    info!("shutdown requested");
}

async fn log_scheduler_events(mut events: mpsc::Receiver<DailyResetEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            DailyResetEvent::Started => info!("daily reset scheduler running"),
            DailyResetEvent::SweepStarted { run_number } => {
                info!(run_number, "daily reset sweep started");
            }
            DailyResetEvent::SweepCompleted {
                run_number,
                report,
                duration_ms,
            } => info!(
                run_number,
                duration_ms,
                users_reset = report.users_reset,
                failures = report.failures.len(),
                "daily reset sweep completed"
            ),
            DailyResetEvent::SweepFailed { run_number, error } => {
                warn!(run_number, %error, "daily reset sweep failed");
            }
            DailyResetEvent::Stopped { reason } => {
                info!(?reason, "daily reset scheduler stopped");
            }
        }
    }
}

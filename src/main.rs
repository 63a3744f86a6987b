use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use chat_gateway::{AppState, Args, build_metrics_router, build_router, logging, rate_limit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    logging::init_tracing(&args.log_level, args.log_json);

    // creating shared state
    let state = Arc::new(AppState::from_args(&args).context("invalid configuration")?);

    // spawn the background sweeper
    let limiter = Arc::clone(&state.rate_limiter);
    let sweep_every = limiter.window();
    tokio::spawn(async move {
        rate_limit::sweeper(limiter, sweep_every).await;
    });

    if let Some(port) = args.metrics_port {
        let addr = format!("{}:{}", args.host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
        tracing::info!(address = %addr, "metrics listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, build_metrics_router()).await {
                tracing::error!(error = %e, "metrics listener stopped");
            }
        });
    }

    let app = build_router(Arc::clone(&state));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let mode = if state.has_key() { "relay" } else { "echo" };
    tracing::info!(address = %addr, "gateway listening");
    tracing::info!(
        public_dir = %state.assets.root().display(),
        mode,
        model = %state.model,
        "serving"
    );
    tracing::info!(
        limit = args.rate_limit,
        window_s = args.rate_window,
        "chat rate limit"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

// Resolves on SIGINT or SIGTERM; axum then drains in-flight requests
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        },
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Calendar BFF Server
//!
//! Signs athletes in with Strava, proxies their profile and activities, and
//! stores their calendar events.

use activity_calendar_bff::{
    config::{CalendarBackend, Config},
    db::{CalendarStore, FirestoreDb, MemoryCalendarStore},
    session::MemorySessionStore,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    tracing::info!(
        port = config.port,
        environment = config.environment.as_str(),
        frontend = %config.frontend_url,
        "Starting Activity Calendar BFF"
    );

    let calendars: Arc<dyn CalendarStore> = match &config.calendar_backend {
        CalendarBackend::Firestore { project_id } => Arc::new(FirestoreDb::new(project_id).await?),
        CalendarBackend::Memory => {
            tracing::warn!("Using in-memory calendar store; records are lost on restart");
            Arc::new(MemoryCalendarStore::default())
        }
    };

    // Build shared state
    let port = config.port;
    let sessions = Arc::new(MemorySessionStore::default());
    let state = Arc::new(AppState::new(config, sessions, calendars)?);

    // Build router
    let app = activity_calendar_bff::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,activity_calendar_bff=debug"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

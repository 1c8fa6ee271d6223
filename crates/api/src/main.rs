use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projecthub_api::background::notification_retention;
use projecthub_api::config::ServerConfig;
use projecthub_api::notifications::LiveNotifier;
use projecthub_api::router::build_app_router;
use projecthub_api::{state, ws};
use projecthub_events::{EmailConfig, EmailDelivery, ReminderScheduler};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "projecthub_api=debug,projecthub_events=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = projecthub_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    projecthub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    projecthub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let mut job_handles = vec![ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone())];

    let mut reminders = ReminderScheduler::new(pool.clone())
        .with_interval(Duration::from_secs(config.reminder_interval_secs))
        .with_sink(Arc::new(LiveNotifier::new(Arc::clone(&ws_manager))));
    match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(smtp_host = %email_config.smtp_host, "Email reminders enabled");
            reminders = reminders.with_email(EmailDelivery::new(email_config));
        }
        None => tracing::info!("SMTP_HOST not set, email reminders disabled"),
    }
    let reminder_cancel = cancel.clone();
    job_handles.push(tokio::spawn(async move {
        reminders.run(reminder_cancel).await;
    }));

    if let Some(interval_hours) = config.notification_purge_interval_hours {
        job_handles.push(tokio::spawn(notification_retention::run(
            pool.clone(),
            interval_hours,
            config.notification_retention_days,
            cancel.clone(),
        )));
    }

    tracing::info!(jobs = job_handles.len(), "Background jobs started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    for handle in job_handles {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    tracing::info!("Background jobs stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

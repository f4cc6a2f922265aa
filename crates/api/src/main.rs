use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lostfound_events::{LogGateway, NotificationDispatcher, NotificationGateway, WebhookGateway};
use lostfound_similarity::HttpSimilarityClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lostfound_api::background;
use lostfound_api::config::ServerConfig;
use lostfound_api::router::build_app_router;
use lostfound_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lostfound_api=debug,lostfound_workflow=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = lostfound_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lostfound_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    lostfound_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Similarity service ---
    let similarity = Arc::new(
        HttpSimilarityClient::new(config.similarity.clone())
            .expect("Failed to build similarity service client"),
    );
    tracing::info!(url = %config.similarity.base_url, "Similarity service client ready");

    // --- Event bus + notification dispatcher ---
    let event_bus = Arc::new(lostfound_events::EventBus::default());

    let gateway: Arc<dyn NotificationGateway> = match &config.notification_webhook_url {
        Some(url) => {
            tracing::info!(%url, "Delivering notifications to webhook");
            Arc::new(WebhookGateway::new(url.clone()).expect("Failed to build webhook gateway"))
        }
        None => {
            tracing::info!("No notification webhook configured, logging notifications only");
            Arc::new(LogGateway)
        }
    };
    let dispatcher_handle =
        tokio::spawn(NotificationDispatcher::new(gateway).run(event_bus.subscribe()));

    // --- App state ---
    let state = AppState::new(pool, config.clone(), Arc::clone(&event_bus), similarity);

    // --- Reconciliation scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(background::reconciliation::run(
        state.reconciler.clone(),
        state.rate_limiter.clone(),
        config.scheduler.clone(),
        scheduler_cancel.clone(),
    ));

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
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    scheduler_cancel.cancel();
    let _ = tokio::time::timeout(grace, scheduler_handle).await;
    tracing::info!("Reconciliation scheduler stopped");

    // The dispatcher drains once every bus sender is gone.
    drop(event_bus);
    let _ = tokio::time::timeout(grace, dispatcher_handle).await;
    tracing::info!("Notification dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
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

//! Clipstream server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use clipstream_api::{
    ChannelRegistry, middleware::AppState, router as api_router, streaming_handler,
};
use clipstream_common::Config;
use clipstream_core::{
    CommentService, EventPublisherService, NotificationService, ReactionService,
    SubscriptionService, UserService, VideoService,
};
use clipstream_db::repositories::{
    CommentRepository, NotificationRepository, ReactionRepository, SubscriptionRepository,
    UserRepository, VideoRepository, ViewRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipstream=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting clipstream server...");

    // Load configuration (.env first, then files and environment)
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = clipstream_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    clipstream_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let view_repo = ViewRepository::new(Arc::clone(&db));

    // The channel registry is built before the listener starts and handed
    // to everything that publishes, by reference.
    let registry = Arc::new(ChannelRegistry::new(config.streaming.room_capacity));
    let event_publisher: EventPublisherService = registry.clone();

    // Initialize services
    let user_service = UserService::new(user_repo.clone());

    let video_service = VideoService::new(
        video_repo.clone(),
        user_repo.clone(),
        view_repo,
        notification_repo.clone(),
    );

    let mut comment_service = CommentService::new(
        Arc::clone(&db),
        comment_repo.clone(),
        video_repo.clone(),
        reaction_repo.clone(),
        user_repo.clone(),
    );
    comment_service.set_event_publisher(event_publisher.clone());

    let reaction_service = ReactionService::new(
        Arc::clone(&db),
        reaction_repo,
        video_repo,
        comment_repo,
    );

    let mut notification_service =
        NotificationService::new(notification_repo, subscription_repo.clone());
    notification_service.set_event_publisher(event_publisher.clone());

    let mut subscription_service = SubscriptionService::new(subscription_repo, user_repo);
    subscription_service.set_event_publisher(event_publisher);

    // Retention sweep: the Postgres stand-in for a store-level TTL.
    let sweeper = notification_service.clone();
    let retention =
        chrono::Duration::seconds(i64::try_from(config.notifications.retention_secs).unwrap_or(i64::MAX));
    let sweep_interval = Duration::from_secs(config.notifications.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.purge_expired(retention).await {
                tracing::warn!(error = %e, "Notification retention sweep failed");
            }
        }
    });
    info!("Notification retention sweeper started");

    // Create app state
    let state = AppState {
        user_service,
        video_service,
        comment_service,
        reaction_service,
        notification_service,
        subscription_service,
        registry,
    };

    // Build router
    let app = Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clipstream_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

//! Tidepool server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tidepool_common::Config;
use tidepool_core::PostService;
use tidepool_db::repositories::PostRepository;
use tidepool_scheduler::{PublicationExecutor, PublicationScheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Promotion-cycle executor backed by the post service.
struct PublishDuePosts {
    posts: PostService,
}

#[async_trait::async_trait]
impl PublicationExecutor for PublishDuePosts {
    async fn publish_due(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let promoted = self.posts.promote_due_posts().await?;

        for post in &promoted {
            tracing::debug!(post_id = %post.id, author_id = %post.user_id, "Published scheduled post");
        }

        Ok(promoted.len() as u64)
    }
}

async fn health() -> &'static str {
    "ok"
}

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
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidepool=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting tidepool server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = tidepool_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    tidepool_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize the publication scheduler
    let db = Arc::new(db);
    let post_repo = PostRepository::new(Arc::clone(&db));
    let post_service = PostService::new(post_repo);

    let scheduler = PublicationScheduler::new(Arc::new(PublishDuePosts {
        posts: post_service,
    }));
    scheduler.start(Duration::from_millis(config.scheduler.interval_ms));

    // Build router
    let app = Router::new()
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!("Server shutdown complete");
    Ok(())
}

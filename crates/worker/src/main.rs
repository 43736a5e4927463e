use std::sync::Arc;

use dispatchd_events::router::EventRouter;
use dispatchd_platform::transfer::{FileTransfer, HttpTransfer};
use dispatchd_platform::PlatformConfig;
use dispatchd_worker::runner::TaskRunner;
use dispatchd_worker::uppercase::{UppercaseHandler, UPPERCASE_PREDICATE};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatchd_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://./data/dispatchd.db".into());

    let pool = dispatchd_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    dispatchd_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    dispatchd_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Router ---
    let platform_config = PlatformConfig::from_env();
    tracing::info!(
        download_url = %platform_config.download_url,
        upload_url = %platform_config.upload_url,
        policy_url = %platform_config.policy_url,
        "Loaded platform configuration"
    );

    let transfer: Arc<dyn FileTransfer> = Arc::new(HttpTransfer::new(platform_config));

    let predicate =
        std::env::var("EVENT_MATCH").unwrap_or_else(|_| UPPERCASE_PREDICATE.to_string());

    let mut router = EventRouter::new();
    router
        .register(&predicate, Box::new(UppercaseHandler::new(transfer)))
        .expect("EVENT_MATCH must be a valid predicate expression");

    // --- Run until ctrl-c ---
    let cancel = CancellationToken::new();
    let runner = TaskRunner::new(pool, Arc::new(router));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
            shutdown.cancel();
        }
    });

    runner.run(cancel).await;
}

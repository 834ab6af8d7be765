use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bookbrain::{
    config::Config,
    db,
    routes::{create_router, AppState},
    services::{
        catalog::CatalogSearcher,
        providers::{
            google_books::GoogleBooksProvider, open_library::OpenLibraryProvider, BookProvider,
        },
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookbrain=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations applied");

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = db::Cache::new(redis_client).await;

    let providers: Vec<Arc<dyn BookProvider>> = vec![
        Arc::new(GoogleBooksProvider::new(
            cache.clone(),
            config.google_books_api_key.clone(),
            config.google_books_api_url.clone(),
        )),
        Arc::new(OpenLibraryProvider::new(
            cache.clone(),
            config.open_library_api_url.clone(),
            config.open_library_covers_url.clone(),
        )),
    ];

    let state = AppState {
        db_pool,
        cache,
        catalog: Arc::new(CatalogSearcher::new(providers)),
        config: Arc::new(config),
    };

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "BookBrain API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush any cache writes still queued in the background writer.
    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
    }
}

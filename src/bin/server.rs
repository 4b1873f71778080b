use docgenservice::{logging, router, AppState, Config};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    logging::init(&config.log_level)?;
    config.validate()?;
    config.ensure_directories_exist().await?;

    let bind_addr = config.server.bind_addr;

    info!("docgenservice web server starting...");
    info!("Uploads directory: {}", config.server.uploads_dir.display());
    info!("Model: {}", config.llm.model);
    info!("Health check: http://{}/health", bind_addr);

    let state = AppState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

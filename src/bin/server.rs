//! Master-data server: reads settings from env (and `.env`), loads the catalog, optionally
//! bootstraps the master tables, then serves common, config, and master routes.

use master_data::{apply_migrations, app, load_catalog, AppState, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("master_data=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let catalog = load_catalog(settings.catalog_path.as_deref()).await?;
    tracing::info!(masters = catalog.masters.len(), "catalog loaded");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(settings.database.connect_options()?)
        .await?;

    if settings.auto_migrate {
        apply_migrations(&pool, &catalog).await?;
    }

    let state = AppState::new(pool, catalog);
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

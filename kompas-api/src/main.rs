mod app_state;
mod config;
mod domain;
mod router;
mod routes;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::domain::search::run_index_worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config::read_config().expect("Failed to read configuration");

    let db_pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(settings.database.with_db());
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let app_state = AppState::new(db_pool, &settings.search);

    let worker_interval = settings.search.index_worker_interval_secs;
    if worker_interval > 0 {
        tokio::spawn(run_index_worker(
            app_state.indexer.clone(),
            Duration::from_secs(worker_interval),
        ));
    }

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {address}");
    axum::serve(listener, router::create(app_state)).await?;

    Ok(())
}

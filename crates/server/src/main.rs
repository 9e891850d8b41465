use std::sync::Arc;

use anyhow::Context;
use schema::SchemaRegistry;
use server::{AppState, app};
use services::services::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::log::init();

    let config = Config::from_env();

    let registry_json = std::fs::read_to_string(&config.registry_path)
        .with_context(|| format!("reading schema registry from {}", config.registry_path))?;
    let registry = Arc::new(SchemaRegistry::from_json(&registry_json)?);

    let db = db::DBService::new(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;
    db::ddl::ensure_tables(&db.pool, &registry).await?;

    info!(
        tables = registry.len(),
        addr = %config.bind_addr,
        "starting metadata-driven CRUD server"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, registry, config);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

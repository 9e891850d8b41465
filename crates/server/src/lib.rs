//! HTTP surface: a generic CRUD API over every table the registry knows.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use db::{DBService, records::RecordStore};
use schema::SchemaRegistry;
use services::services::{
    cache::EntityCache, config::Config, detail::DetailService, listing::ListService,
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub registry: Arc<SchemaRegistry>,
    pub cache: EntityCache,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DBService, registry: Arc<SchemaRegistry>, config: Config) -> Self {
        Self {
            db,
            registry,
            cache: EntityCache::new(),
            config,
        }
    }

    pub fn list_service(&self) -> ListService {
        ListService::new(
            RecordStore::new(self.db.pool.clone()),
            self.registry.clone(),
            self.cache.clone(),
        )
    }

    pub fn detail_service(&self) -> DetailService {
        DetailService::new(
            RecordStore::new(self.db.pool.clone()),
            self.registry.clone(),
            self.cache.clone(),
        )
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

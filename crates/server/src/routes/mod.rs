pub mod health;
pub mod records;
pub mod tables;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(tables::router())
        .merge(records::router())
}

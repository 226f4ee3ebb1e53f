pub mod aggregate;
pub(crate) mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::generated_routes())
        .merge(handlers::manual_routes())
}

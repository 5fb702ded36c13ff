//! Route modules.

use axum::Router;

use crate::observability;
use crate::state::AppState;

pub mod events;
pub mod health;

/// Builds the application router: event routes under `base_path` (at the
/// root when empty), the health check at `/health` and the Prometheus scrape
/// endpoint at `/metrics`.
pub fn app(state: AppState, base_path: &str) -> Router {
    let router = if base_path.is_empty() {
        Router::new().merge(events::router())
    } else {
        Router::new().nest(base_path, events::router())
    };

    router
        .merge(health::router())
        .merge(observability::router())
        .with_state(state)
}

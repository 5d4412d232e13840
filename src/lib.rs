use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

pub use clock::{Clock, ManualClock};
use config::Config;
use presence::PresenceStore;

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod monitor;
pub mod presence;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PresenceStore>,
    pub config: Config,
    pub clock: Clock,
}

/// 在线状态相关路由，挂载在 `api_base_uri` 下
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/presence", get(routes::presence::query_presence))
        .route("/presence/update", post(routes::presence::update_presence))
        .route("/presence/history", get(routes::presence::list_history))
        .route("/presence/status_list", get(routes::presence::status_list))
        .route("/health", get(routes::presence::health));

    let base = state.config.api_base_uri.trim_end_matches('/').to_string();
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&base, api)
    };

    router
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}

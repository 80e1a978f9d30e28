// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    create_cache_handler, delete_cache_handler, get_cache_handler, get_pricing_handler,
    health_handler, list_caches_handler, metrics_handler, record_hit_handler,
    refresh_cache_handler, stats_handler, update_pricing_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::cache::CacheLedger;
use crate::config::AppConfig;
use crate::error::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ledger: Arc<CacheLedger>,
}

pub fn create_router(config: AppConfig, ledger: Arc<CacheLedger>) -> Result<Router> {
    let state = AppState { config, ledger };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/caches", post(create_cache_handler).get(list_caches_handler))
        .route("/v1/caches/stats", get(stats_handler))
        .route("/v1/caches/hits", post(record_hit_handler))
        .route(
            "/v1/caches/:id",
            get(get_cache_handler).delete(delete_cache_handler),
        )
        .route("/v1/caches/:id/refresh", post(refresh_cache_handler))
        .route(
            "/v1/pricing",
            get(get_pricing_handler).put(update_pricing_handler),
        )
        .route_layer(middleware::from_fn(track_metrics))
        // Cacheable payloads are schemas and examples, not documents
        .layer(tower_http::limit::RequestBodyLimitLayer::new(8 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}

// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{ExtractError, Result};
use crate::pricing::{PricingTable, PricingUpdate};
use crate::utils::logging::sanitize_if;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCacheRequest {
    pub model: String,
    pub content: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub ttl_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub ttl_hours: f64,
}

#[derive(Debug, Deserialize)]
pub struct RecordHitRequest {
    pub input_tokens: u64,
    #[serde(default)]
    pub price_per_million: Option<f64>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheListResponse {
    pub caches: Vec<CacheEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

/// Deserialize a raw body, reporting failures in the API error envelope
fn parse_body<T: DeserializeOwned>(state: &AppState, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to deserialize request: {}", e);
        debug!(
            "Raw body (first 500 chars): {}",
            sanitize_if(&state.config.logging, &body.chars().take(500).collect::<String>())
        );
        ExtractError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    let stats = state.ledger.stats();
    let max_entries = state.ledger.config().max_entries;
    let ledger_check = if max_entries > 0 && stats.active_entries >= max_entries {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: format!("Ledger full ({} entries), evicting oldest", stats.active_entries),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} active entries", stats.active_entries),
        }
    };
    checks.insert("cache_ledger".to_string(), ledger_check);

    let caching_check = HealthCheck {
        status: "ok".to_string(),
        message: if state.ledger.config().enabled {
            format!("Enabled, default TTL {}h", state.ledger.config().default_ttl_hours)
        } else {
            "Disabled".to_string()
        },
    };
    checks.insert("caching".to_string(), caching_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}

/// POST /v1/caches
pub async fn create_cache_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<CacheEntry>)> {
    let req: CreateCacheRequest = parse_body(&state, &body)?;
    debug!(
        "Create cache request: model={}, content={} chars, ttl={:?}",
        req.model,
        req.content.len(),
        req.ttl_hours
    );

    let tokens = state.ledger.estimate_tokens(&[
        req.content.as_bytes(),
        req.system_prompt.as_deref().unwrap_or_default().as_bytes(),
    ]);
    state.ledger.advise(&req.model, tokens);

    let entry = state.ledger.create(
        &req.model,
        &req.content,
        req.system_prompt.as_deref(),
        req.ttl_hours,
    )?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/caches
pub async fn list_caches_handler(State(state): State<AppState>) -> Json<CacheListResponse> {
    let caches = state.ledger.list();
    Json(CacheListResponse {
        count: caches.len(),
        caches,
    })
}

/// GET /v1/caches/:id
pub async fn get_cache_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CacheEntry>> {
    state
        .ledger
        .get(&id)
        .map(Json)
        .ok_or_else(|| ExtractError::NotFound(format!("cache '{}' not found or expired", id)))
}

/// DELETE /v1/caches/:id
pub async fn delete_cache_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.ledger.delete(&id) {
        Ok(Json(DeleteResponse { id, deleted: true }))
    } else {
        Err(ExtractError::NotFound(format!("cache '{}' not found or expired", id)))
    }
}

/// POST /v1/caches/:id/refresh
pub async fn refresh_cache_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<CacheEntry>> {
    let req: RefreshRequest = parse_body(&state, &body)?;
    state
        .ledger
        .refresh_ttl(&id, req.ttl_hours)?
        .map(Json)
        .ok_or_else(|| ExtractError::NotFound(format!("cache '{}' not found or expired", id)))
}

/// POST /v1/caches/hits
pub async fn record_hit_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<CacheStats>> {
    let req: RecordHitRequest = parse_body(&state, &body)?;
    let stats = state
        .ledger
        .record_hit(req.input_tokens, req.price_per_million, &req.model)?;
    Ok(Json(stats))
}

/// GET /v1/caches/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.ledger.stats())
}

/// GET /v1/pricing
pub async fn get_pricing_handler(State(state): State<AppState>) -> Json<PricingTable> {
    Json(state.ledger.pricing())
}

/// PUT /v1/pricing
pub async fn update_pricing_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<PricingTable>> {
    let update: PricingUpdate = parse_body(&state, &body)?;
    if update.is_empty() {
        return Err(ExtractError::InvalidRequest(
            "pricing update must set at least one of storage_per_million_per_hour, creation_per_million, input_per_million".to_string(),
        ));
    }
    Ok(Json(state.ledger.update_pricing(&update)?))
}

//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. The engine is
//! internally synchronized, so handlers share a plain `Arc` without an
//! outer lock.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{EnhancedStats, HybridCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, InvalidatePatternRequest,
    InvalidatePatternResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache engine; thread-safe behind its own instance lock
    pub cache: Arc<HybridCache<Value>>,
}

impl AppState {
    /// Creates a new AppState around an existing cache instance.
    pub fn new(cache: HybridCache<Value>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = HybridCache::new(
            &config.cache_dir,
            Duration::from_secs(config.default_ttl),
            config.max_size,
            config.memory_max_size,
            config.eviction_strategy,
        )?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in both tiers with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    state.cache.set(&req.key, req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value by key, promoting disk hits into memory.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key in both tiers.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.invalidate(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /invalidate-pattern
///
/// Removes every memory-resident key matching the pattern from both tiers.
/// A malformed pattern is a 400, not a zero-match success.
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidatePatternResponse>> {
    let removed = state.cache.invalidate_pattern(&req.pattern)?;
    Ok(Json(InvalidatePatternResponse { removed }))
}

/// Handler for POST /clear
///
/// Empties both tiers. Metric counters are preserved.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear();
    Json(ClearResponse::new())
}

/// Handler for GET /stats
///
/// Returns the full per-instance report: entry count, counters, hit ratios
/// and the active eviction strategy.
pub async fn stats_handler(State(state): State<AppState>) -> Json<EnhancedStats> {
    Json(state.cache.enhanced_stats())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

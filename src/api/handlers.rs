//! API Handlers
//!
//! HTTP request handlers for each cache gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::backend::{KvStore, StoreHandle};
use crate::cache::{Cache, CacheStats, CacheValue};
use crate::config::Config;
use crate::error::{CacheError, Result, StoreError};
use crate::models::requests::{validate_key, validate_namespace};
use crate::models::{
    DeleteResponse, ExistsResponse, ExpireRequest, ExpireResponse, GetResponse, HealthResponse,
    KeyQuery, SetRequest, SetResponse, StatsResponse, TtlResponse,
};

/// Application state shared across all handlers.
///
/// Holds the one store connection; a `Cache` view is built per request for
/// the requested namespace. All views share one set of counters.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    /// Namespace used when the request does not name one
    pub namespace: String,
    /// TTL applied to `PUT /set` requests that carry none
    pub default_ttl: Option<u64>,
    pub stats: Arc<CacheStats>,
}

impl AppState {
    /// Creates a new AppState over the given store.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            default_ttl: None,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Applies `ttl` to writes that do not set their own.
    pub fn with_default_ttl(mut self, ttl: Option<u64>) -> Self {
        self.default_ttl = ttl.filter(|&seconds| seconds > 0);
        self
    }

    /// Creates a new AppState from a connected store and configuration.
    pub fn from_config(handle: &StoreHandle, config: &Config) -> Self {
        Self::new(handle.store.clone(), config.namespace.clone())
            .with_default_ttl(Some(config.default_ttl))
    }

    /// Cache view for `namespace`, or the default one.
    pub fn cache(&self, namespace: Option<&str>) -> Result<Cache> {
        let namespace = match namespace {
            Some(ns) => {
                if let Some(error) = validate_namespace(ns) {
                    return Err(CacheError::InvalidRequest(error));
                }
                ns
            }
            None => self.namespace.as_str(),
        };
        Ok(Cache::new(self.store.clone(), namespace).with_stats(self.stats.clone()))
    }
}

fn checked_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error) => Err(CacheError::InvalidRequest(error)),
        None => Ok(()),
    }
}

/// Handler for PUT /set
///
/// JSON strings are stored as text; every other JSON value as JSON.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = state.cache(req.namespace.as_deref())?;
    let value = match req.value {
        Value::String(text) => CacheValue::Text(text),
        other => CacheValue::Json(other),
    };

    let ttl = req.ttl.or(state.default_ttl);

    if !cache.set(&req.key, value, ttl).await {
        return Err(CacheError::Store(StoreError::Unavailable(format!(
            "could not store key '{}'",
            req.key
        ))));
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// `?raw=true` returns JSON entries as their stored text.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    checked_key(&key)?;
    let cache = state.cache(query.namespace.as_deref())?;

    match cache.get_with(&key, None, !query.raw).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<DeleteResponse>> {
    checked_key(&key)?;
    let cache = state.cache(query.namespace.as_deref())?;

    if cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<ExistsResponse>> {
    checked_key(&key)?;
    let cache = state.cache(query.namespace.as_deref())?;
    let exists = cache.exists(&key).await;

    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for POST /expire/:key
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<KeyQuery>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>> {
    checked_key(&key)?;
    if req.seconds == 0 {
        return Err(CacheError::InvalidRequest(
            "TTL must be at least 1 second".to_string(),
        ));
    }
    let cache = state.cache(query.namespace.as_deref())?;

    if cache.expire(&key, req.seconds).await {
        Ok(Json(ExpireResponse {
            key,
            ttl: req.seconds,
        }))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<TtlResponse>> {
    checked_key(&key)?;
    let cache = state.cache(query.namespace.as_deref())?;

    if !cache.exists(&key).await {
        return Err(CacheError::NotFound(key));
    }
    let ttl = cache.ttl(&key).await;

    Ok(Json(TtlResponse { key, ttl }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.stats.snapshot()))
}

/// Handler for GET /health
///
/// Pings the store; answers 503 with status `degraded` if it is unreachable.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy())),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::degraded(err.to_string())),
        ),
    }
}

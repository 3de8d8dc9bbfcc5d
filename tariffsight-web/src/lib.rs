//! tariffsight-web library interface
//!
//! Exposes the application state, router construction and all service
//! modules for integration testing.

pub mod api;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tariffsight_common::events::EventBus;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::classifier::ClassifierClient;
use crate::services::payment::{PaymentGateway, StubGateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// External classification API client
    pub classifier: Arc<ClassifierClient>,
    /// Payment capture seam (stub by default)
    pub payments: Arc<dyn PaymentGateway>,
    /// Sessions with an analysis currently in flight (single-flight guard)
    pub in_flight: Arc<Mutex<HashSet<String>>>,
    /// Read-through cache over the site content settings row
    pub content_cache: Arc<RwLock<Option<serde_json::Value>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        Self::with_gateway(db, event_bus, Arc::new(StubGateway))
    }

    /// Build state with a specific payment gateway (tests, real processor)
    pub fn with_gateway(
        db: SqlitePool,
        event_bus: EventBus,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            db,
            event_bus,
            classifier: Arc::new(ClassifierClient::default()),
            payments,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            content_cache: Arc::new(RwLock::new(None)),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::auth_routes())
        .merge(api::analysis_routes())
        .merge(api::history_routes())
        .merge(api::plan_routes())
        .merge(api::profile_routes())
        .merge(api::subscription_routes())
        .merge(api::admin_routes())
        .merge(api::content_routes())
        .merge(api::health_routes())
        .route("/api/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

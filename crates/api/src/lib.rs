//! HTTP API for the marketplace fulfillment engine.
//!
//! Cart, checkout, order queries, item status changes and a live update
//! stream per buyer, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use event_store::{EventStore, EventStoreError, InMemoryEventStore, PostgresEventStore};
use fulfillment::{
    InMemoryCartStore, InMemoryCatalog, InMemoryContactDirectory, LogMailer, PostgresCatalog,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::{AppState, Backends};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migrations failed: {0}")]
    Migrations(#[from] EventStoreError),
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route(
            "/buyers/{buyer_id}/cart",
            get(routes::cart::get::<S>)
                .post(routes::cart::add::<S>)
                .delete(routes::cart::clear::<S>),
        )
        .route(
            "/buyers/{buyer_id}/cart/{product_id}",
            put(routes::cart::set_quantity::<S>).delete(routes::cart::remove::<S>),
        )
        .route(
            "/buyers/{buyer_id}/orders",
            get(routes::orders::for_buyer::<S>).post(routes::orders::place::<S>),
        )
        .route("/buyers/{buyer_id}/events", get(routes::events::stream::<S>))
        .route("/farmers/{farmer_id}/orders", get(routes::orders::for_farmer::<S>))
        .route("/orders/{order_id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{order_id}/items/{item_id}/status",
            put(routes::orders::update_status::<S>),
        )
        .route(
            "/orders/{order_id}/items/{item_id}/cancel",
            post(routes::orders::cancel::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Everything in memory. The catalog and contact directory are returned so
/// callers can stock them.
pub fn memory_state(
    config: &Config,
) -> (
    Arc<AppState<InMemoryEventStore>>,
    InMemoryCatalog,
    InMemoryContactDirectory,
) {
    let catalog = InMemoryCatalog::new();
    let contacts = InMemoryContactDirectory::new();
    let backends = Backends {
        catalog: Arc::new(catalog.clone()),
        carts: Arc::new(InMemoryCartStore::new()),
        contacts: Arc::new(contacts.clone()),
        mailer: Arc::new(LogMailer::new(config.email_from.clone())),
    };

    let state = AppState::new(
        InMemoryEventStore::new(),
        "memory",
        backends,
        config.max_write_retries,
    );
    (Arc::new(state), catalog, contacts)
}

/// Orders and stock in PostgreSQL; carts and contacts stay in memory.
pub async fn postgres_state(
    config: &Config,
    database_url: &str,
) -> Result<Arc<AppState<PostgresEventStore>>, StartupError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    let store = PostgresEventStore::new(pool.clone());
    store.run_migrations().await?;

    let backends = Backends {
        catalog: Arc::new(PostgresCatalog::new(pool)),
        carts: Arc::new(InMemoryCartStore::new()),
        contacts: Arc::new(InMemoryContactDirectory::new()),
        mailer: Arc::new(LogMailer::new(config.email_from.clone())),
    };

    Ok(Arc::new(AppState::new(
        store,
        "postgres",
        backends,
        config.max_write_retries,
    )))
}

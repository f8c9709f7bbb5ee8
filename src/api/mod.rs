//! HTTP surface of the simulator.
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | GET | `/health` | no |
//! | GET | `/api/v1/validate` | `DD-API-KEY` + `DD-APPLICATION-KEY` |
//! | GET | `/api/v1/query` | `DD-API-KEY` + `DD-APPLICATION-KEY` |
//! | GET | `/metrics` | no |

pub mod auth;
pub mod handlers;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::any::Any;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::{Config, Credentials},
    models::ErrorBody,
    Result, SimulatorError,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub credentials: Credentials,
    /// Seeds every request's generator when set.
    pub seed: Option<u64>,
}

impl From<&Config> for AppState {
    fn from(config: &Config) -> Self {
        Self {
            credentials: config.credentials.clone(),
            seed: config.seed,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route(
            "/validate",
            get(handlers::validate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/query",
            get(handlers::query_metrics).fallback(handlers::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_keys,
        ));

    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/metrics",
            get(handlers::prometheus_metrics).fallback(handlers::method_not_allowed),
        )
        .nest("/api/v1", authenticated)
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error")),
    )
        .into_response()
}

pub async fn start_server(config: Config) -> Result<()> {
    let addr = config.bind_addr();
    let app = build_router(AppState::from(&config));

    info!("Metrics query simulator");
    info!("API Key: {}", config.credentials.api_key);
    info!("Application Key: {}", config.credentials.application_key);
    if let Some(seed) = config.seed {
        info!("Synthetic data seeded with {}", seed);
    }
    info!("Endpoints: GET /health, GET /api/v1/validate, GET /api/v1/query, GET /metrics");
    info!("Starting simulator on {}", addr);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        SimulatorError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SimulatorError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

//! HTTP front end
//!
//! ## Endpoints
//!
//! - `GET /api/cars/{serial}` - look a car up, possibly from a secondary
//! - `POST /api/cars` - validate and durably insert a car
//! - `GET /api/hostname` - name of the host serving the request
//!
//! Failures are reported as `{"reason": ..., "error": ...}`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use soldcars_core::store::{CarStore, ConnectionRegistry, Lookup, StoreError};
use soldcars_core::{Car, Config, ValidationError};

/// Shared handler state
pub struct AppState {
    pub store: CarStore,
    pub hostname: String,
}

/// Build the router over `state`
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cars", post(add_car))
        .route("/api/cars/:serial", get(get_car))
        .route("/api/hostname", get(hostname))
        .with_state(state)
}

/// Run the service until Ctrl-C
///
/// The serial number index is created before the listener opens, and every
/// store connection is closed once the server has drained.
pub async fn serve(config: &Config, listen: Option<String>) -> Result<()> {
    let registry = Arc::new(ConnectionRegistry::new(config.store_settings()));
    let result = run(config, listen, Arc::clone(&registry)).await;
    registry.close_all().await;
    result
}

async fn run(
    config: &Config,
    listen: Option<String>,
    registry: Arc<ConnectionRegistry>,
) -> Result<()> {
    let store = CarStore::new(registry);
    store
        .ensure_index()
        .await
        .context("Failed to create the serial number index")?;

    let state = Arc::new(AppState {
        store,
        hostname: local_hostname(),
    });

    let address = listen.unwrap_or_else(|| config.listen.clone());
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// `GET /api/cars/{serial}`
///
/// Served with stale-tolerant reads to spread load over the secondaries.
async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let serial: u32 = serial
        .parse()
        .map_err(|_| ApiError::bad_request("Parameter 'serial' has invalid type."))?;

    let lookup = Lookup::new().stale_ok().optional();
    match state.store.one(serial, &lookup).await? {
        Some(record) => Ok(Json(Value::Object(record.into_map()))),
        None => Err(StoreError::NotFound { serial }.into()),
    }
}

/// `POST /api/cars`
async fn add_car(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let input: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Could not decode JSON object."))?;

    let mut car = Car::validate(&input)?;
    state.store.insert(&mut car).await?;

    Ok(Json(json!({"serial": car.serial_number()})))
}

/// `GET /api/hostname`
async fn hostname(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({"host": state.hostname}))
}

/// Error response carrying an HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            StoreError::DurabilityTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => {
                error!("Internal server error: {}", e);
                return ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500: Internal Server Error",
                );
            }
        };
        ApiError::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "reason": self.status.canonical_reason().unwrap_or("Error"),
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

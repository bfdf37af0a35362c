//! biff-api — HTTP surface for the enrollment protocol.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/enroll` | Exchange the enroll secret for a node key |
//! | POST | `/configuration` | Fetch the schedule for a node key |
//! | GET | `/healthz` | Liveness check |
//!
//! Protocol rejections are always `200` JSON bodies with
//! `node_invalid: true`; only store failures return `500`.

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use biff_core::ServerConfig;
use biff_protocol::{ConfigurationDistributor, EnrollSecret, EnrollmentService};
use biff_state::EnrollmentStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub enrollment: EnrollmentService,
    pub configuration: ConfigurationDistributor,
}

impl ApiState {
    pub fn new(store: EnrollmentStore, config: &ServerConfig) -> Self {
        Self {
            enrollment: EnrollmentService::new(
                store.clone(),
                EnrollSecret::new(config.enroll_secret.clone()),
            ),
            configuration: ConfigurationDistributor::new(store, config.node_config()),
        }
    }
}

/// Build the API router over the given store and server config.
pub fn build_router(store: EnrollmentStore, config: &ServerConfig) -> Router {
    router(ApiState::new(store, config))
}

/// Build the API router from pre-assembled services.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/enroll", post(handlers::enroll))
        .route("/configuration", post(handlers::configuration))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

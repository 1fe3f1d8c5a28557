//! FrontRow: shared photo albums for live events, ranked by attendee votes.
//!
//! The library holds the vote store ([`store::Store`] with a Postgres and an
//! in-memory backend), the pure ranking functions in [`ranking`], and the
//! axum router served by the `server` binary.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod ranking;
pub mod store;
pub mod votes;

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use store::{Store, StoreError};

// ===== App State =====

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Runs a store call under the configured timeout.
    pub async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        store::bounded(self.store_timeout, call).await
    }
}

// ===== Router =====

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/concerts",
            get(handlers::list_concerts).post(handlers::create_concert),
        )
        .route("/concerts/:band_name", get(handlers::get_concert))
        .route(
            "/concerts/:band_name/photos",
            get(handlers::list_photos).post(handlers::add_photo),
        )
        .route("/concerts/:band_name/votes", get(handlers::list_votes))
        .route("/concerts/:band_name/gallery", get(handlers::gallery))
        .route("/photos/:photo_id/vote", post(handlers::cast_vote))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

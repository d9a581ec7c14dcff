// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface over the supervisor

mod error;
mod handlers;

pub use error::ApiError;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vam_adapters::ProcessAdapter;
use vam_core::{Clock, IdGen};

use crate::protocol::{AGENTS_PATH, START_PATH, STATUS_PATH};
use crate::supervisor::Supervisor;

/// Build the router serving `supervisor`.
pub fn router<P, C, G>(supervisor: Supervisor<P, C, G>) -> Router
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    Router::new()
        .route(START_PATH, post(handlers::start::<P, C, G>))
        .route("/stop-agent/:user_id", post(handlers::stop::<P, C, G>))
        .route(AGENTS_PATH, get(handlers::agents::<P, C, G>))
        .route(STATUS_PATH, get(handlers::status::<P, C, G>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(supervisor)
}

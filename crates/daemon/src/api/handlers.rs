// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use vam_adapters::ProcessAdapter;
use vam_core::{Clock, IdGen};

use super::ApiError;
use crate::protocol::{
    AgentsResponse, StartAgentRequest, StartAgentResponse, StatusResponse, StopAgentResponse,
};
use crate::supervisor::Supervisor;

pub(super) async fn start<P, C, G>(
    State(supervisor): State<Supervisor<P, C, G>>,
    body: Result<Json<StartAgentRequest>, JsonRejection>,
) -> Result<Json<StartAgentResponse>, ApiError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = body
        .into_launch()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let started = supervisor.start(request).await?;
    Ok(Json(started.into()))
}

pub(super) async fn stop<P, C, G>(
    State(supervisor): State<Supervisor<P, C, G>>,
    Path(user_id): Path<String>,
) -> Result<Json<StopAgentResponse>, ApiError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    let stopped = supervisor.stop(&user_id).await?;
    Ok(Json(stopped.into()))
}

pub(super) async fn agents<P, C, G>(
    State(supervisor): State<Supervisor<P, C, G>>,
) -> Json<AgentsResponse>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    Json(AgentsResponse {
        agents: supervisor.list().await,
    })
}

pub(super) async fn status<P, C, G>(
    State(supervisor): State<Supervisor<P, C, G>>,
) -> Json<StatusResponse>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    Json(supervisor.status().await.into())
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

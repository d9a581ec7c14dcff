// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the vamd API

use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use vam_daemon::protocol::{
    AgentsResponse, ErrorBody, StartAgentRequest, StartAgentResponse, StatusResponse,
    StopAgentResponse, AGENTS_PATH, START_PATH, STATUS_PATH, STOP_PATH,
};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid daemon URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("cannot reach vamd at {url} (is it running?)")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The daemon answered with a non-2xx status
    #[error("{detail}")]
    Api { status: StatusCode, detail: String },

    #[error("unexpected response from vamd: {0}")]
    Decode(String),
}

impl ClientError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Api { status, .. } if *status == StatusCode::CONFLICT => 3,
            ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND => 4,
            _ => 1,
        }
    }
}

pub struct AgentClient {
    http: reqwest::Client,
    base: Url,
}

impl AgentClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ClientError> {
        let invalid = |message: String| ClientError::InvalidUrl {
            url: base.to_string(),
            message,
        };
        let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&crate::env::url(), crate::env::timeout())
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub async fn start(&self, req: &StartAgentRequest) -> Result<StartAgentResponse, ClientError> {
        let url = self.url(&[route(START_PATH)])?;
        self.send(self.http.request(Method::POST, url.clone()).json(req), &url)
            .await
    }

    pub async fn stop(&self, user_id: &str) -> Result<StopAgentResponse, ClientError> {
        let url = self.url(&[route(STOP_PATH), user_id])?;
        self.send(self.http.request(Method::POST, url.clone()), &url)
            .await
    }

    pub async fn agents(&self) -> Result<AgentsResponse, ClientError> {
        let url = self.url(&[route(AGENTS_PATH)])?;
        self.send(self.http.get(url.clone()), &url).await
    }

    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let url = self.url(&[route(STATUS_PATH)])?;
        self.send(self.http.get(url.clone()), &url).await
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base.to_string(),
                message: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ClientError::Unreachable {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(ClientError::Api { status, detail });
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Route constant as a single path segment
fn route(path: &'static str) -> &'static str {
    path.trim_start_matches('/')
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

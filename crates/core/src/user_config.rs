// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user agent configuration persisted under the storage root
//!
//! Layout: `<storage>/<user_id>/config/agent_config.json`. Only the keys the
//! manager forwards to workers are modelled; everything else in the file is
//! owned by the worker and ignored here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub collection_name_preference: Option<String>,
    pub default_phone_number_to_dial: Option<String>,
    pub openai_api_key: Option<String>,
    pub livekit_url: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub cartesia_api_key: Option<String>,
    pub sip_trunk_id: Option<String>,
}

impl UserAgentConfig {
    pub fn path(storage_root: &Path, user_id: &str) -> PathBuf {
        storage_root
            .join(user_id)
            .join("config")
            .join("agent_config.json")
    }

    /// Load a user's config. A missing file yields the empty config.
    pub fn load(storage_root: &Path, user_id: &str) -> Result<Self, ConfigError> {
        let path = Self::path(storage_root, user_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed { path, source })
    }

    /// Provider credentials as worker environment variables, skipping unset
    /// and blank values.
    pub fn credential_env(&self) -> Vec<(&'static str, String)> {
        [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("LIVEKIT_URL", &self.livekit_url),
            ("LIVEKIT_API_KEY", &self.livekit_api_key),
            ("LIVEKIT_API_SECRET", &self.livekit_api_secret),
            ("DEEPGRAM_API_KEY", &self.deepgram_api_key),
            ("CARTESIA_API_KEY", &self.cartesia_api_key),
            ("SIP_TRUNK_ID", &self.sip_trunk_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }
}

#[cfg(test)]
#[path = "user_config_tests.rs"]
mod tests;

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Connection settings.
//!
//! Settings can be built in code, loaded from TOML and overlaid from the
//! environment:
//!
//! ```toml
//! endpoint = "wss://db.cluster-abc.us-east-1.neptune.amazonaws.com:8182/gremlin"
//! enable_ssl = true
//! max_content_length = 65536
//! handshake_timeout_ms = 15000
//! enable_compression = false
//! service = "neptune-db"
//! ```

use http::Uri;
use serde::Deserialize;
use std::time::Duration;
use wssign_aws_v4::NEPTUNE_SERVICE;
use wssign_core::{Context, Error, Result};

/// Env key overriding [`ConnectionSettings::endpoint`].
pub const WSSIGN_ENDPOINT: &str = "WSSIGN_ENDPOINT";
/// Env key overriding [`ConnectionSettings::enable_ssl`].
pub const WSSIGN_ENABLE_SSL: &str = "WSSIGN_ENABLE_SSL";
/// Env key overriding [`ConnectionSettings::handshake_timeout_ms`].
pub const WSSIGN_HANDSHAKE_TIMEOUT_MS: &str = "WSSIGN_HANDSHAKE_TIMEOUT_MS";
/// Env key overriding [`ConnectionSettings::max_content_length`].
pub const WSSIGN_MAX_CONTENT_LENGTH: &str = "WSSIGN_MAX_CONTENT_LENGTH";

/// Settings of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Target of the upgrade request, `ws://` or `wss://`.
    pub endpoint: String,
    /// Must be true to use the `wss` scheme.
    pub enable_ssl: bool,
    /// Upper bound of an aggregated message, also the frame payload bound.
    pub max_content_length: usize,
    /// How long `connected` waits for the handshake.
    pub handshake_timeout_ms: u64,
    /// Install the permessage-deflate stage.
    ///
    /// [`TungsteniteTransport`](crate::TungsteniteTransport) cannot run this
    /// stage, [`Connection::open`](crate::Connection::open) rejects it with
    /// `ConfigInvalid` before anything is resolved or dialed.
    pub enable_compression: bool,
    /// SigV4 service name.
    pub service: String,
    /// Requested `Sec-WebSocket-Protocol`.
    pub subprotocol: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8182/gremlin".to_string(),
            enable_ssl: false,
            max_content_length: 65536,
            handshake_timeout_ms: 15_000,
            enable_compression: false,
            service: NEPTUNE_SERVICE.to_string(),
            subprotocol: None,
        }
    }
}

impl ConnectionSettings {
    /// Create settings for the given endpoint with defaults for the rest.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Parse settings from TOML, missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            Error::config_invalid("failed to parse connection settings").with_source(e)
        })
    }

    /// Load defaults overlaid with values found in the environment.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        Self::default().overlay_env(ctx)
    }

    /// Overlay values found in the environment on top of `self`.
    pub fn overlay_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_var(WSSIGN_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = ctx.env_var(WSSIGN_ENABLE_SSL) {
            self.enable_ssl = parse_env(WSSIGN_ENABLE_SSL, &v.to_lowercase())?;
        }
        if let Some(v) = ctx.env_var(WSSIGN_HANDSHAKE_TIMEOUT_MS) {
            self.handshake_timeout_ms = parse_env(WSSIGN_HANDSHAKE_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = ctx.env_var(WSSIGN_MAX_CONTENT_LENGTH) {
            self.max_content_length = parse_env(WSSIGN_MAX_CONTENT_LENGTH, &v)?;
        }
        Ok(self)
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Allow the `wss` scheme.
    pub fn with_enable_ssl(mut self, enable: bool) -> Self {
        self.enable_ssl = enable;
        self
    }

    /// Set the aggregator bound.
    pub fn with_max_content_length(mut self, len: usize) -> Self {
        self.max_content_length = len;
        self
    }

    /// Set the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Install the compression stage.
    ///
    /// Needs a transport that supports permessage-deflate.
    pub fn with_enable_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    /// Set the SigV4 service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Request a subprotocol.
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    /// The handshake timeout as a duration.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Parse the endpoint.
    pub fn uri(&self) -> Result<Uri> {
        self.endpoint.parse::<Uri>().map_err(|e| {
            Error::config_invalid("endpoint is not a valid uri")
                .with_context(format!("endpoint: {}", self.endpoint))
                .with_source(e)
        })
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse::<T>().map_err(|e| {
        Error::config_invalid("invalid value in environment")
            .with_context(format!("{key}: {value}"))
            .with_source(e)
    })
}

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

//! Construction of the WebSocket upgrade request.

use async_trait::async_trait;
use http::header::{CONNECTION, HOST, SEC_WEBSOCKET_EXTENSIONS, UPGRADE};
use http::header::{SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_PROTOCOL, SEC_WEBSOCKET_VERSION};
use http::{HeaderMap, HeaderValue, Method, Request, Uri};
use log::debug;
use std::fmt::Debug;
use std::sync::Arc;
use wssign_aws_v4::{Credential, ProvideProperties, RequestSigner, SigV4Properties};
use wssign_core::hash::base64_encode;
use wssign_core::{Context, Error, ProvideCredential, Result, Signer};

/// Extension offered when compression is allowed.
const PERMESSAGE_DEFLATE: &str = "permessage-deflate; client_max_window_bits";

/// Default bound for a single frame payload.
pub const DEFAULT_MAX_FRAME_PAYLOAD_LENGTH: usize = 65536;

/// WebSocket protocol version sent in `Sec-WebSocket-Version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebSocketVersion {
    /// RFC 6455.
    #[default]
    V13,
}

impl WebSocketVersion {
    /// Header value of this version.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebSocketVersion::V13 => "13",
        }
    }
}

/// Handshake produces the upgrade request the transport writes to the wire.
///
/// The returned request must be sent unmodified.
#[async_trait]
pub trait Handshake: Debug + Send + Sync + 'static {
    /// Build the upgrade request for a new connection attempt.
    async fn handshake_request(&self) -> Result<Request<()>>;

    /// Largest frame payload the client accepts.
    fn max_frame_payload_length(&self) -> usize;
}

/// ClientHandshaker builds standard, unsigned upgrade requests.
#[derive(Debug, Clone)]
pub struct ClientHandshaker {
    uri: Uri,
    version: WebSocketVersion,
    subprotocol: Option<String>,
    allow_extensions: bool,
    custom_headers: HeaderMap,
    max_frame_payload_length: usize,
}

impl ClientHandshaker {
    /// Create a handshaker for the given target.
    pub fn new(uri: Uri, version: WebSocketVersion) -> Self {
        Self {
            uri,
            version,
            subprotocol: None,
            allow_extensions: false,
            custom_headers: HeaderMap::new(),
            max_frame_payload_length: DEFAULT_MAX_FRAME_PAYLOAD_LENGTH,
        }
    }

    /// Request a subprotocol via `Sec-WebSocket-Protocol`.
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    /// Offer the permessage-deflate extension.
    pub fn with_allow_extensions(mut self, allow: bool) -> Self {
        self.allow_extensions = allow;
        self
    }

    /// Headers appended after the standard upgrade headers.
    pub fn with_custom_headers(mut self, headers: HeaderMap) -> Self {
        self.custom_headers = headers;
        self
    }

    /// Set the maximum frame payload length.
    pub fn with_max_frame_payload_length(mut self, len: usize) -> Self {
        self.max_frame_payload_length = len;
        self
    }

    /// Target of the upgrade request.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Build a new upgrade request with a fresh `Sec-WebSocket-Key`.
    pub fn new_handshake_request(&self) -> Result<Request<()>> {
        let host = self.uri.authority().ok_or_else(|| {
            Error::request_invalid("websocket uri must contain a host")
                .with_context(format!("uri: {}", self.uri))
        })?;

        let mut req = Request::new(());
        *req.method_mut() = Method::GET;
        *req.uri_mut() = self.uri.clone();

        let headers = req.headers_mut();
        headers.insert(HOST, HeaderValue::from_str(host.as_str())?);
        headers.insert(UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(CONNECTION, HeaderValue::from_static("Upgrade"));
        headers.insert(SEC_WEBSOCKET_KEY, HeaderValue::from_str(&new_key())?);
        headers.insert(
            SEC_WEBSOCKET_VERSION,
            HeaderValue::from_static(self.version.as_str()),
        );
        if let Some(protocol) = &self.subprotocol {
            headers.insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_str(protocol)?);
        }
        if self.allow_extensions {
            headers.insert(
                SEC_WEBSOCKET_EXTENSIONS,
                HeaderValue::from_static(PERMESSAGE_DEFLATE),
            );
        }
        for (name, value) in self.custom_headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        Ok(req)
    }
}

#[async_trait]
impl Handshake for ClientHandshaker {
    async fn handshake_request(&self) -> Result<Request<()>> {
        self.new_handshake_request()
    }

    fn max_frame_payload_length(&self) -> usize {
        self.max_frame_payload_length
    }
}

/// 16 random bytes, base64 encoded.
fn new_key() -> String {
    base64_encode(&rand::random::<[u8; 16]>())
}

/// SigningHandshaker decorates a [`ClientHandshaker`] with a SigV4 signature.
///
/// The region is resolved once at construction. Credentials are resolved
/// again for every request.
#[derive(Debug, Clone)]
pub struct SigningHandshaker {
    base: ClientHandshaker,
    properties: SigV4Properties,
    signer: Signer<Credential>,
}

impl SigningHandshaker {
    /// Create a signing handshaker, resolving the region right away.
    pub fn new(
        base: ClientHandshaker,
        ctx: Context,
        properties: &dyn ProvideProperties,
        credential: Arc<dyn ProvideCredential<Credential = Credential>>,
        service: &str,
    ) -> Result<Self> {
        let properties = properties.provide_properties(&ctx)?;
        let signer = Signer::from_arc(
            ctx,
            credential,
            RequestSigner::new(service, properties.service_region()),
        );

        Ok(Self {
            base,
            properties,
            signer,
        })
    }

    /// Properties resolved at construction.
    pub fn properties(&self) -> &SigV4Properties {
        &self.properties
    }

    /// Build the upgrade request and sign it.
    ///
    /// The request is never returned unsigned, any failure is a
    /// `SigningFailed` error.
    pub async fn build_signed_request(&self) -> Result<Request<()>> {
        let (mut parts, body) = self.base.new_handshake_request()?.into_parts();

        self.signer.sign(&mut parts).await.map_err(|err| {
            Error::signing_failed("failed to sign the websocket handshake request")
                .with_context(format!("uri: {}", self.base.uri()))
                .with_context(format!("region: {}", self.properties.service_region()))
                .with_source(err)
        })?;
        debug!("signed websocket handshake request for {}", self.base.uri());

        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Handshake for SigningHandshaker {
    async fn handshake_request(&self) -> Result<Request<()>> {
        self.build_signed_request().await
    }

    fn max_frame_payload_length(&self) -> usize {
        self.base.max_frame_payload_length
    }
}

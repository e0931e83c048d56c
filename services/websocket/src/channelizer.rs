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

use crate::pipeline::{
    AGGREGATOR, GREMLIN_DECODER, GREMLIN_ENCODER, HTTP_CODEC, WEB_SOCKET_COMPRESSION_HANDLER,
    WS_HANDLER,
};
use crate::{
    BinaryCodec, Channel, ClientHandshaker, ConnectionSettings, HandshakeCompletion,
    MessageCodec, Pipeline, PipelineStage, SigningHandshaker, WebSocketHandler, WebSocketVersion,
};
use http::HeaderMap;
use log::{debug, warn};
use std::fmt::{Debug, Formatter};
use std::mem;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;
use wssign_aws_v4::{
    ChainedPropertiesProvider, Credential, DefaultCredentialProvider, ProvideProperties,
};
use wssign_core::{Context, Error, ErrorKind, ProvideCredential, Result};

const HANDSHAKE_TIMEOUT_MESSAGE: &str = "Timed out while waiting to complete the connection setup. \
     Consider increasing the WebSocket handshake timeout duration.";

const HANDSHAKE_FAILED_MESSAGE: &str = "Could not complete connection setup to the server. \
     Ensure that SSL is correctly configured at both the client and the server. \
     Ensure that client WebSocket handshake protocol matches the server. \
     Ensure that the server is still reachable.";

enum State {
    Unconfigured,
    Configured(HandshakeCompletion),
    Ready,
    Closed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Unconfigured => "unconfigured",
            State::Configured(_) => "configured",
            State::Ready => "ready",
            State::Closed => "closed",
        }
    }
}

/// SigV4Channelizer configures the pipeline of one connection to send a
/// SigV4 signed upgrade request, and gates the connection on the handshake.
///
/// ```text
/// Unconfigured --configure--> Configured --connected--> Ready --close--> Closed
/// ```
pub struct SigV4Channelizer {
    settings: ConnectionSettings,
    ctx: Context,
    properties: Box<dyn ProvideProperties>,
    credential: Arc<dyn ProvideCredential<Credential = Credential>>,
    codec: Arc<dyn MessageCodec>,
    custom_headers: HeaderMap,
    state: State,
}

impl Debug for SigV4Channelizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Channelizer")
            .field("settings", &self.settings)
            .field("properties", &self.properties.name())
            .field("credential", &self.credential)
            .field("codec", &self.codec)
            .field("state", &self.state.name())
            .finish()
    }
}

impl SigV4Channelizer {
    /// Create a channelizer using the default properties and credential chains.
    pub fn new(settings: ConnectionSettings, ctx: Context) -> Self {
        Self {
            settings,
            ctx,
            properties: Box::new(ChainedPropertiesProvider::new()),
            credential: Arc::new(DefaultCredentialProvider::new()),
            codec: Arc::new(BinaryCodec),
            custom_headers: HeaderMap::new(),
            state: State::Unconfigured,
        }
    }

    /// Replace the region resolver.
    pub fn with_properties_provider(mut self, provider: impl ProvideProperties) -> Self {
        self.properties = Box::new(provider);
        self
    }

    /// Replace the credential provider.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.credential = Arc::new(provider);
        self
    }

    /// Replace the message codec.
    pub fn with_codec(mut self, codec: impl MessageCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Headers added to the upgrade request before it is signed.
    pub fn with_custom_headers(mut self, headers: HeaderMap) -> Self {
        self.custom_headers = headers;
        self
    }

    /// Settings of this connection.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Validate the settings and install the stages into `pipeline`.
    ///
    /// Nothing is installed if this fails.
    pub fn configure(&mut self, pipeline: &mut Pipeline) -> Result<()> {
        if !matches!(self.state, State::Unconfigured) {
            return Err(Error::unexpected("channelizer is already configured")
                .with_context(format!("state: {}", self.state.name())));
        }

        let uri = self.settings.uri()?;
        let scheme = uri.scheme_str().unwrap_or_default().to_ascii_lowercase();
        if scheme != "ws" && scheme != "wss" {
            return Err(
                Error::unsupported_scheme("Unsupported scheme (only ws: or wss: supported)")
                    .with_context(format!("uri: {uri}")),
            );
        }
        if scheme == "wss" && !self.settings.enable_ssl {
            return Err(Error::ssl_config_invalid(
                "To use wss scheme ensure that enable_ssl is set to true in configuration",
            )
            .with_context(format!("uri: {uri}")));
        }

        let mut base = ClientHandshaker::new(uri, WebSocketVersion::V13)
            .with_allow_extensions(self.settings.enable_compression)
            .with_custom_headers(self.custom_headers.clone())
            .with_max_frame_payload_length(self.settings.max_content_length);
        if let Some(subprotocol) = &self.settings.subprotocol {
            base = base.with_subprotocol(subprotocol);
        }
        let handshaker = SigningHandshaker::new(
            base,
            self.ctx.clone(),
            self.properties.as_ref(),
            self.credential.clone(),
            &self.settings.service,
        )?;
        let (handler, completion) = WebSocketHandler::new(Arc::new(handshaker));

        let mut stages = vec![
            (HTTP_CODEC, PipelineStage::HttpCodec),
            (
                AGGREGATOR,
                PipelineStage::Aggregator {
                    max_content_length: self.settings.max_content_length,
                },
            ),
        ];
        if self.settings.enable_compression {
            stages.push((WEB_SOCKET_COMPRESSION_HANDLER, PipelineStage::Compression));
        }
        stages.push((WS_HANDLER, PipelineStage::WebSocket(handler)));
        stages.push((GREMLIN_ENCODER, PipelineStage::Encoder(self.codec.clone())));
        stages.push((GREMLIN_DECODER, PipelineStage::Decoder(self.codec.clone())));

        if let Some((name, _)) = stages.iter().find(|(name, _)| pipeline.contains(name)) {
            return Err(Error::unexpected("pipeline already has a stage installed")
                .with_context(format!("name: {name}")));
        }
        for (name, stage) in stages {
            pipeline.add_last(name, stage)?;
        }

        debug!("configured pipeline: {:?}", pipeline.names());
        self.state = State::Configured(completion);
        Ok(())
    }

    /// Wait until the handshake completes, fails or times out.
    ///
    /// Signing failures are returned as is, every other failure becomes a
    /// `HandshakeFailed` error with the cause kept as source.
    pub async fn connected(&mut self) -> Result<()> {
        let completion = match mem::replace(&mut self.state, State::Closed) {
            State::Configured(completion) => completion,
            other => {
                let err = Error::unexpected("connected must be called once after configure")
                    .with_context(format!("state: {}", other.name()));
                self.state = other;
                return Err(err);
            }
        };

        let timeout = self.settings.handshake_timeout();
        let result = match tokio::time::timeout(timeout, completion).await {
            Err(_) => Err(Error::handshake_timeout(HANDSHAKE_TIMEOUT_MESSAGE)
                .with_context(format!("timeout: {timeout:?}"))),
            Ok(Err(err)) => {
                Err(Error::handshake_failed(HANDSHAKE_FAILED_MESSAGE).with_source(err))
            }
            Ok(Ok(Err(err))) if err.kind() == ErrorKind::SigningFailed => Err(err),
            Ok(Ok(Err(err))) => {
                Err(Error::handshake_failed(HANDSHAKE_FAILED_MESSAGE).with_source(err))
            }
            Ok(Ok(Ok(()))) => Ok(()),
        };

        match &result {
            Ok(()) => self.state = State::Ready,
            Err(err) => warn!("websocket handshake to {} failed: {err}", self.settings.endpoint),
        }
        result
    }

    /// Send a close frame if the channel is still open.
    pub async fn close(&mut self, channel: &dyn Channel) -> Result<()> {
        self.state = State::Closed;

        if channel.is_open() {
            channel.write_and_flush(Message::Close(None)).await?;
        }
        Ok(())
    }

    /// Whether the connection sends keep-alive frames.
    pub fn supports_keep_alive(&self) -> bool {
        true
    }

    /// Frame used to check the liveness of the connection.
    pub fn create_keep_alive_message(&self) -> Message {
        Message::Ping(vec![])
    }

    /// Whether the connection runs over TLS.
    pub fn supports_ssl(&self) -> bool {
        self.settings
            .uri()
            .map(|uri| uri.scheme_str().unwrap_or_default().eq_ignore_ascii_case("wss"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use test_case::test_case;
    use wssign_aws_v4::{SigV4Properties, StaticCredentialProvider};

    #[derive(Debug, Default)]
    struct MockChannel {
        open: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }

        async fn write_and_flush(&self, message: Message) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if matches!(message, Message::Close(_)) {
                self.open.store(false, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn channelizer(settings: ConnectionSettings) -> SigV4Channelizer {
        SigV4Channelizer::new(settings, Context::new())
            .with_properties_provider(|_: &Context| SigV4Properties::new("us-east-1"))
            .with_credential_provider(StaticCredentialProvider::new(
                "access_key_id",
                "secret_access_key",
            ))
    }

    #[test_case(false, vec![HTTP_CODEC, AGGREGATOR, WS_HANDLER, GREMLIN_ENCODER, GREMLIN_DECODER]; "plain")]
    #[test_case(true, vec![HTTP_CODEC, AGGREGATOR, WEB_SOCKET_COMPRESSION_HANDLER, WS_HANDLER, GREMLIN_ENCODER, GREMLIN_DECODER]; "compression")]
    fn test_configure_stage_order(compression: bool, expected: Vec<&str>) {
        let mut c = channelizer(
            ConnectionSettings::new("ws://localhost:8182/gremlin")
                .with_enable_compression(compression)
                .with_max_content_length(1024),
        );
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();

        assert_eq!(pipeline.names(), expected);
        assert_eq!(pipeline.max_content_length(), Some(1024));
        let handler = pipeline.websocket_handler().expect("ws-handler must exist");
        assert_eq!(handler.handshaker().max_frame_payload_length(), 1024);
    }

    #[test]
    fn test_wss_requires_ssl() {
        let mut c = channelizer(ConnectionSettings::new("wss://localhost:8182/gremlin"));
        let mut pipeline = Pipeline::new();

        let err = c.configure(&mut pipeline).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SslConfigInvalid);
        assert!(err.message().contains("enable_ssl"));
        assert!(pipeline.is_empty());
    }

    #[test_case("ftp://localhost:8182/gremlin"; "ftp")]
    #[test_case("http://localhost:8182/gremlin"; "http")]
    fn test_unsupported_scheme(endpoint: &str) {
        let mut c = channelizer(ConnectionSettings::new(endpoint).with_enable_ssl(true));
        let mut pipeline = Pipeline::new();

        let err = c.configure(&mut pipeline).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedScheme);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let mut c = channelizer(
            ConnectionSettings::new("WSS://localhost:8182/gremlin").with_enable_ssl(true),
        );
        let mut pipeline = Pipeline::new();

        c.configure(&mut pipeline).unwrap();
        assert!(c.supports_ssl());
        assert_eq!(pipeline.len(), 5);
    }

    #[test]
    fn test_missing_region_installs_nothing() {
        let mut c = SigV4Channelizer::new(
            ConnectionSettings::new("ws://localhost:8182/gremlin"),
            Context::new(),
        );
        let mut pipeline = Pipeline::new();

        let err = c.configure(&mut pipeline).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropertiesNotFound);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_configure_twice() {
        let mut c = channelizer(ConnectionSettings::default());
        c.configure(&mut Pipeline::new()).unwrap();

        let err = c.configure(&mut Pipeline::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[tokio::test]
    async fn test_connected_times_out() {
        let mut c = channelizer(
            ConnectionSettings::default().with_handshake_timeout(Duration::from_millis(1)),
        );
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();

        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandshakeTimeout);
        assert!(err.message().contains("increasing the WebSocket handshake timeout"));
    }

    #[tokio::test]
    async fn test_connected_success() {
        let mut c = channelizer(ConnectionSettings::default());
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();

        assert!(pipeline.websocket_handler().unwrap().complete(Ok(())));
        c.connected().await.unwrap();

        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[tokio::test]
    async fn test_connected_wraps_failures() {
        let mut c = channelizer(ConnectionSettings::default());
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();

        pipeline
            .websocket_handler()
            .unwrap()
            .complete(Err(Error::unexpected("connection refused")));
        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
        assert!(err.message().contains("Ensure that SSL is correctly configured"));

        let cause = std::error::Error::source(&err)
            .and_then(|e| e.downcast_ref::<Error>())
            .expect("cause must be kept");
        assert_eq!(cause.message(), "connection refused");
    }

    #[tokio::test]
    async fn test_connected_passes_signing_failures() {
        let mut c = channelizer(ConnectionSettings::default());
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();

        pipeline
            .websocket_handler()
            .unwrap()
            .complete(Err(Error::signing_failed("no credential")));
        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailed);
    }

    #[tokio::test]
    async fn test_dropped_handler_is_failure() {
        let mut c = channelizer(ConnectionSettings::default());
        let mut pipeline = Pipeline::new();
        c.configure(&mut pipeline).unwrap();
        drop(pipeline);

        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
    }

    #[tokio::test]
    async fn test_connected_before_configure() {
        let mut c = channelizer(ConnectionSettings::default());

        let err = c.connected().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[tokio::test]
    async fn test_close_twice_writes_once() {
        let mut c = channelizer(ConnectionSettings::default());
        let channel = MockChannel::default();
        channel.open.store(true, Ordering::SeqCst);

        c.close(&channel).await.unwrap();
        c.close(&channel).await.unwrap();

        assert_eq!(channel.writes.load(Ordering::SeqCst), 1);
        assert!(!channel.is_open());
    }

    #[test]
    fn test_keep_alive() {
        let c = channelizer(ConnectionSettings::default());

        assert!(c.supports_keep_alive());
        assert_eq!(c.create_keep_alive_message(), Message::Ping(vec![]));
        assert!(!c.supports_ssl());
    }
}

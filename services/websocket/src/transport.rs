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

use crate::pipeline::WEB_SOCKET_COMPRESSION_HANDLER;
use crate::{Channel, MessageCodec, Pipeline};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use wssign_core::{Error, Result};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Halves of an upgraded connection, reads and writes lock separately.
struct Halves {
    sink: Mutex<SplitSink<Stream, Message>>,
    source: Mutex<SplitStream<Stream>>,
}

/// TungsteniteTransport runs a configured [`Pipeline`] over tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteTransport {
    disable_nagle: bool,
}

impl TungsteniteTransport {
    /// Create a new transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `TCP_NODELAY` on the connection.
    pub fn with_disable_nagle(mut self, disable: bool) -> Self {
        self.disable_nagle = disable;
        self
    }

    /// Whether this transport can run the permessage-deflate stage.
    ///
    /// tungstenite has no permessage-deflate, so this is always `false`.
    pub fn supports_compression(&self) -> bool {
        false
    }

    /// Start the handshake of a configured pipeline in the background.
    ///
    /// The outcome is reported through the pipeline's `ws-handler`, the
    /// returned channel becomes usable once it completed successfully.
    pub fn connect(&self, pipeline: &Pipeline) -> Result<TungsteniteChannel> {
        let handler = pipeline
            .websocket_handler()
            .cloned()
            .ok_or_else(|| Error::unexpected("pipeline has no ws-handler stage installed"))?;
        if pipeline.contains(WEB_SOCKET_COMPRESSION_HANDLER) && !self.supports_compression() {
            return Err(Error::config_invalid(
                "permessage-deflate is not supported by the tungstenite transport",
            ));
        }
        let encoder = pipeline
            .encoder()
            .ok_or_else(|| Error::unexpected("pipeline has no gremlin-encoder stage installed"))?;
        let decoder = pipeline
            .decoder()
            .ok_or_else(|| Error::unexpected("pipeline has no gremlin-decoder stage installed"))?;

        let handshaker = handler.handshaker();
        let mut config = WebSocketConfig::default();
        config.max_message_size = pipeline.max_content_length();
        config.max_frame_size = Some(handshaker.max_frame_payload_length());

        let halves: Arc<OnceCell<Halves>> = Arc::new(OnceCell::new());
        let open = Arc::new(AtomicBool::new(false));
        let disable_nagle = self.disable_nagle;

        let task = {
            let halves = halves.clone();
            let open = open.clone();
            tokio::spawn(async move {
                let result: Result<()> = async {
                    let request = handshaker.handshake_request().await?;
                    let uri = request.uri().clone();
                    let (ws, resp) = connect_async_with_config(request, Some(config), disable_nagle)
                        .await
                        .map_err(|err| {
                            Error::unexpected("websocket connection failed")
                                .with_context(format!("uri: {uri}"))
                                .with_source(err)
                        })?;
                    debug!("websocket upgrade to {uri} answered with {}", resp.status());

                    let (sink, source) = ws.split();
                    let _ = halves.set(Halves {
                        sink: Mutex::new(sink),
                        source: Mutex::new(source),
                    });
                    open.store(true, Ordering::SeqCst);
                    Ok(())
                }
                .await;

                if !handler.complete(result) {
                    debug!("handshake completed but nobody is waiting for it");
                }
            })
        };

        Ok(TungsteniteChannel {
            halves,
            open,
            encoder,
            decoder,
            task,
        })
    }
}

/// TungsteniteChannel is an established connection.
///
/// Dropping the channel aborts the background handshake if it is still
/// running.
pub struct TungsteniteChannel {
    halves: Arc<OnceCell<Halves>>,
    open: Arc<AtomicBool>,
    encoder: Arc<dyn MessageCodec>,
    decoder: Arc<dyn MessageCodec>,
    task: JoinHandle<()>,
}

impl Debug for TungsteniteChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TungsteniteChannel")
            .field("connected", &self.halves.initialized())
            .field("open", &self.is_open())
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl TungsteniteChannel {
    fn halves(&self) -> Result<&Halves> {
        self.halves
            .get()
            .ok_or_else(|| Error::unexpected("websocket channel is not connected"))
    }

    /// Encode and send a payload.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        let message = self.encoder.encode(payload)?;
        self.write_and_flush(message).await
    }

    /// Receive the next payload.
    ///
    /// Returns `Ok(None)` once the peer closed the connection.
    pub async fn recv(&self) -> Result<Option<Bytes>> {
        let mut source = self.halves()?.source.lock().await;

        while let Some(message) = source.next().await {
            let message = message.map_err(|err| {
                Error::unexpected("failed to read websocket frame").with_source(err)
            })?;
            if let Message::Close(frame) = &message {
                debug!("websocket closed by peer: {frame:?}");
                self.open.store(false, Ordering::SeqCst);
                return Ok(None);
            }
            if let Some(payload) = self.decoder.decode(message)? {
                return Ok(Some(payload));
            }
        }

        self.open.store(false, Ordering::SeqCst);
        Ok(None)
    }
}

#[async_trait]
impl Channel for TungsteniteChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn write_and_flush(&self, message: Message) -> Result<()> {
        let mut sink = self.halves()?.sink.lock().await;

        let is_close = matches!(message, Message::Close(_));
        if let Err(err) = sink.send(message).await {
            warn!("failed to write websocket frame: {err}");
            self.open.store(false, Ordering::SeqCst);
            return Err(Error::unexpected("failed to write websocket frame").with_source(err));
        }
        if is_close {
            self.open.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for TungsteniteChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

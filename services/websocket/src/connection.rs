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

use crate::{
    Channel, ConnectionSettings, Pipeline, SigV4Channelizer, TungsteniteChannel,
    TungsteniteTransport,
};
use bytes::Bytes;
use log::info;
use wssign_core::{Error, Result};

/// Connection is a ready, signed WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    channelizer: SigV4Channelizer,
    pipeline: Pipeline,
    channel: TungsteniteChannel,
}

impl Connection {
    /// Configure the pipeline, connect and wait for the handshake.
    ///
    /// Compression is rejected upfront when the transport cannot run it.
    pub async fn open(
        mut channelizer: SigV4Channelizer,
        transport: &TungsteniteTransport,
    ) -> Result<Self> {
        if channelizer.settings().enable_compression && !transport.supports_compression() {
            return Err(Error::config_invalid(
                "compression is enabled but the transport has no permessage-deflate support",
            )
            .with_context(format!("endpoint: {}", channelizer.settings().endpoint)));
        }

        let mut pipeline = Pipeline::new();
        channelizer.configure(&mut pipeline)?;
        let channel = transport.connect(&pipeline)?;
        channelizer.connected().await?;

        info!("websocket connection to {} is ready", channelizer.settings().endpoint);
        Ok(Self {
            channelizer,
            pipeline,
            channel,
        })
    }

    /// Settings this connection was opened with.
    pub fn settings(&self) -> &ConnectionSettings {
        self.channelizer.settings()
    }

    /// Stages installed on this connection.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Whether the connection can still be written to.
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Send a payload through the message codec.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        self.channel.send(payload).await
    }

    /// Receive the next payload, `None` once the peer closed.
    pub async fn recv(&self) -> Result<Option<Bytes>> {
        self.channel.recv().await
    }

    /// Send a keep-alive frame.
    pub async fn keep_alive(&self) -> Result<()> {
        self.channel
            .write_and_flush(self.channelizer.create_keep_alive_message())
            .await
    }

    /// Close the connection, closing twice is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        self.channelizer.close(&self.channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wssign_aws_v4::{SigV4Properties, StaticCredentialProvider};
    use wssign_core::{Context, ErrorKind};

    #[tokio::test]
    async fn test_open_rejects_compression_before_resolving() {
        let _ = env_logger::builder().is_test(true).try_init();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let settings = ConnectionSettings::default()
            .with_endpoint("ws://127.0.0.1:1/gremlin")
            .with_enable_compression(true);
        let channelizer = SigV4Channelizer::new(settings, Context::new())
            .with_properties_provider(move |_: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                SigV4Properties::new("us-east-1")
            })
            .with_credential_provider(StaticCredentialProvider::new("ak", "sk"));

        let err = Connection::open(channelizer, &TungsteniteTransport::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

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

//! Ordered protocol stages of a connection.

use crate::{MessageCodec, WebSocketHandler};
use std::sync::Arc;
use wssign_core::{Error, Result};

/// Name of the HTTP codec stage.
pub const HTTP_CODEC: &str = "http-codec";
/// Name of the payload aggregator stage.
pub const AGGREGATOR: &str = "aggregator";
/// Name of the optional compression stage.
pub const WEB_SOCKET_COMPRESSION_HANDLER: &str = "web-socket-compression-handler";
/// Name of the stage carrying the handshake.
pub const WS_HANDLER: &str = "ws-handler";
/// Name of the outbound message encoder stage.
pub const GREMLIN_ENCODER: &str = "gremlin-encoder";
/// Name of the inbound message decoder stage.
pub const GREMLIN_DECODER: &str = "gremlin-decoder";

/// One stage of a [`Pipeline`].
#[derive(Debug, Clone)]
pub enum PipelineStage {
    /// HTTP/1.1 request and response framing.
    HttpCodec,
    /// Aggregates a message up to `max_content_length` bytes.
    Aggregator {
        /// Upper bound of an aggregated message.
        max_content_length: usize,
    },
    /// permessage-deflate negotiation.
    Compression,
    /// Runs the upgrade handshake.
    WebSocket(WebSocketHandler),
    /// Encodes outbound payloads.
    Encoder(Arc<dyn MessageCodec>),
    /// Decodes inbound frames.
    Decoder(Arc<dyn MessageCodec>),
}

/// Pipeline is the ordered list of named stages installed on a connection.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<(String, PipelineStage)>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage at the end.
    ///
    /// Stage names are unique within a pipeline.
    pub fn add_last(&mut self, name: &str, stage: PipelineStage) -> Result<()> {
        if self.contains(name) {
            return Err(Error::unexpected("duplicate pipeline stage")
                .with_context(format!("name: {name}")));
        }

        self.stages.push((name.to_string(), stage));
        Ok(())
    }

    /// Whether a stage with this name is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|(n, _)| n == name)
    }

    /// Get a stage by name.
    pub fn get(&self, name: &str) -> Option<&PipelineStage> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stage)| stage)
    }

    /// Names of all stages, in order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stage is installed.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The handshake stage, if installed.
    pub fn websocket_handler(&self) -> Option<&WebSocketHandler> {
        self.stages.iter().find_map(|(_, stage)| match stage {
            PipelineStage::WebSocket(handler) => Some(handler),
            _ => None,
        })
    }

    /// The aggregator bound, if an aggregator is installed.
    pub fn max_content_length(&self) -> Option<usize> {
        self.stages.iter().find_map(|(_, stage)| match stage {
            PipelineStage::Aggregator { max_content_length } => Some(*max_content_length),
            _ => None,
        })
    }

    /// The codec of the encoder stage, if installed.
    pub fn encoder(&self) -> Option<Arc<dyn MessageCodec>> {
        self.stages.iter().find_map(|(_, stage)| match stage {
            PipelineStage::Encoder(codec) => Some(codec.clone()),
            _ => None,
        })
    }

    /// The codec of the decoder stage, if installed.
    pub fn decoder(&self) -> Option<Arc<dyn MessageCodec>> {
        self.stages.iter().find_map(|(_, stage)| match stage {
            PipelineStage::Decoder(codec) => Some(codec.clone()),
            _ => None,
        })
    }
}

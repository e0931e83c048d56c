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

use bytes::Bytes;
use std::fmt::Debug;
use tokio_tungstenite::tungstenite::Message;
use wssign_core::Result;

/// MessageCodec turns graph-query payloads into frames and back.
///
/// The channelizer installs one codec as both encoder and decoder stage.
pub trait MessageCodec: Debug + Send + Sync + 'static {
    /// Encode an outbound payload into a frame.
    fn encode(&self, payload: Bytes) -> Result<Message>;

    /// Decode an inbound frame.
    ///
    /// Returns `Ok(None)` for frames that carry no payload, like pings.
    fn decode(&self, message: Message) -> Result<Option<Bytes>>;
}

/// BinaryCodec sends payloads as binary frames unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl MessageCodec for BinaryCodec {
    fn encode(&self, payload: Bytes) -> Result<Message> {
        Ok(Message::Binary(payload.to_vec()))
    }

    fn decode(&self, message: Message) -> Result<Option<Bytes>> {
        match message {
            Message::Binary(v) => Ok(Some(Bytes::from(v))),
            Message::Text(v) => Ok(Some(Bytes::from(v))),
            _ => Ok(None),
        }
    }
}

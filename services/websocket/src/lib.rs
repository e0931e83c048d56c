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

//! SigV4 signed WebSocket connections.
//!
//! [`SigV4Channelizer`] validates the [`ConnectionSettings`], installs the
//! protocol stages into a [`Pipeline`] and waits for the handshake. The
//! upgrade request is built by [`ClientHandshaker`] and signed by
//! [`SigningHandshaker`], then written by [`TungsteniteTransport`].
//!
//! ## Example
//!
//! ```no_run
//! use wssign_aws_v4::StaticCredentialProvider;
//! use wssign_core::{Context, OsEnv, ProcessProperties};
//! use wssign_websocket::{Connection, ConnectionSettings, SigV4Channelizer, TungsteniteTransport};
//!
//! # async fn example() -> wssign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv).with_properties(ProcessProperties);
//! let settings = ConnectionSettings::from_env(&ctx)?;
//!
//! let channelizer = SigV4Channelizer::new(settings, ctx).with_credential_provider(
//!     StaticCredentialProvider::new("access_key_id", "secret_access_key"),
//! );
//! let mut conn = Connection::open(channelizer, &TungsteniteTransport::new()).await?;
//! conn.send("g.V().count()".into()).await?;
//! let _reply = conn.recv().await?;
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod channel;
pub use channel::Channel;

mod channelizer;
pub use channelizer::SigV4Channelizer;

mod codec;
pub use codec::{BinaryCodec, MessageCodec};

mod config;
pub use config::*;

mod connection;
pub use connection::Connection;

mod handler;
pub use handler::{HandshakeCompletion, WebSocketHandler};

mod handshake;
pub use handshake::{
    ClientHandshaker, Handshake, SigningHandshaker, WebSocketVersion,
    DEFAULT_MAX_FRAME_PAYLOAD_LENGTH,
};

pub mod pipeline;
pub use pipeline::{Pipeline, PipelineStage};

mod transport;
pub use transport::{TungsteniteChannel, TungsteniteTransport};

pub use tokio_tungstenite::tungstenite::Message;

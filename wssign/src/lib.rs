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

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use wssign_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

/// AWS credentials, region resolution and SigV4 signing.
#[cfg(feature = "aws")]
pub mod aws {
    pub use wssign_aws_v4::*;

    /// Signer type used by [`default_signer`].
    pub type DefaultSigner = crate::Signer<Credential>;

    /// Create a signer with the default context and credential chain.
    ///
    /// ```no_run
    /// # async fn example() -> wssign::Result<()> {
    /// let signer = wssign::aws::default_signer("neptune-db", "us-east-1");
    ///
    /// let (mut parts, _) = http::Request::get("wss://localhost:8182/gremlin")
    ///     .header("host", "localhost:8182")
    ///     .body(())
    ///     .unwrap()
    ///     .into_parts();
    /// signer.sign(&mut parts).await?;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "default-context")]
    pub fn default_signer(service: &str, region: &str) -> DefaultSigner {
        crate::Signer::new(
            crate::default_context(),
            DefaultCredentialProvider::new(),
            RequestSigner::new(service, region),
        )
    }
}

/// SigV4 signed WebSocket connections.
#[cfg(feature = "websocket")]
pub mod websocket {
    pub use wssign_websocket::*;

    /// Create a channelizer with the default context, region resolver and
    /// credential chain.
    #[cfg(feature = "default-context")]
    pub fn default_channelizer(settings: ConnectionSettings) -> SigV4Channelizer {
        SigV4Channelizer::new(settings, crate::default_context())
    }
}

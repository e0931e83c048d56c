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

//! AWS SigV4 signing for WebSocket upgrade requests.
//!
//! This crate provides the AWS pieces of wssign:
//!
//! - [`Credential`] and the credential providers, combined in [`DefaultCredentialProvider`]
//! - [`SigV4Properties`] and the region resolvers, combined in [`ChainedPropertiesProvider`]
//! - [`RequestSigner`], the SigV4 implementation of [`wssign_core::SignRequest`]
//!
//! ## Example
//!
//! ```no_run
//! use wssign_aws_v4::{
//!     ChainedPropertiesProvider, DefaultCredentialProvider, ProvideProperties, RequestSigner,
//!     NEPTUNE_SERVICE,
//! };
//! use wssign_core::{Context, OsEnv, ProcessProperties, Signer};
//!
//! # async fn example() -> wssign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv).with_properties(ProcessProperties);
//!
//! let props = ChainedPropertiesProvider::new().provide_properties(&ctx)?;
//! let signer = Signer::new(
//!     ctx,
//!     DefaultCredentialProvider::new(),
//!     RequestSigner::new(NEPTUNE_SERVICE, props.service_region()),
//! );
//!
//! let (mut parts, _) = http::Request::get("wss://localhost:8182/gremlin")
//!     .header("host", "localhost:8182")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;
pub use constants::NEPTUNE_SERVICE;
pub use constants::SERVICE_REGION;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod provide_properties;
pub use provide_properties::*;

mod sign_request;
pub use sign_request::RequestSigner;

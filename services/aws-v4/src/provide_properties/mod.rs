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

//! Resolution of the SigV4 signing properties.
//!
//! The signing region is resolved separately from credentials: an ordered
//! list of strategies is tried, and the first one that yields a non-blank
//! region wins.

use wssign_core::{Context, Error, Result};

mod chain;
pub use chain::ChainedPropertiesProvider;

mod env;
pub use env::EnvPropertiesProvider;

mod process;
pub use process::ProcessPropertiesProvider;

/// Properties needed to sign a request besides the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigV4Properties {
    service_region: String,
}

impl SigV4Properties {
    /// Create properties with the given region.
    ///
    /// The region is trimmed, a blank region is a `PropertiesNotFound` error.
    pub fn new(service_region: impl AsRef<str>) -> Result<Self> {
        let service_region = service_region.as_ref().trim();
        if service_region.is_empty() {
            return Err(Error::properties_not_found("service region is blank"));
        }

        Ok(Self {
            service_region: service_region.to_string(),
        })
    }

    /// The region used in the credential scope.
    pub fn service_region(&self) -> &str {
        &self.service_region
    }
}

/// ProvideProperties is one strategy to resolve [`SigV4Properties`].
///
/// Resolution is a pure read of configuration and must not block on I/O.
/// Closures taking a `&Context` implement this trait as well:
///
/// ```
/// use wssign_aws_v4::{ProvideProperties, SigV4Properties};
/// use wssign_core::Context;
///
/// let fixed = |_: &Context| SigV4Properties::new("us-west-2");
/// let props = fixed.provide_properties(&Context::new()).unwrap();
/// assert_eq!(props.service_region(), "us-west-2");
/// ```
pub trait ProvideProperties: Send + Sync + 'static {
    /// Resolve the properties, failing with `PropertiesNotFound` if this
    /// strategy has no value.
    fn provide_properties(&self, ctx: &Context) -> Result<SigV4Properties>;

    /// Name used when logging the outcome of this strategy.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> ProvideProperties for F
where
    F: Fn(&Context) -> Result<SigV4Properties> + Send + Sync + 'static,
{
    fn provide_properties(&self, ctx: &Context) -> Result<SigV4Properties> {
        self(ctx)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

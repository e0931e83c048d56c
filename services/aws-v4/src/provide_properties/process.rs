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

use super::{ProvideProperties, SigV4Properties};
use crate::constants::SERVICE_REGION;
use wssign_core::{Context, Error, Result};

/// ProcessPropertiesProvider reads the region from the `SERVICE_REGION` process property.
///
/// Properties are read through [`Context::property`], usually backed by
/// [`wssign_core::ProcessProperties`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessPropertiesProvider;

impl ProcessPropertiesProvider {
    /// Create a new ProcessPropertiesProvider.
    pub fn new() -> Self {
        Self
    }
}

impl ProvideProperties for ProcessPropertiesProvider {
    fn provide_properties(&self, ctx: &Context) -> Result<SigV4Properties> {
        let value = ctx.property(SERVICE_REGION).ok_or_else(|| {
            Error::properties_not_found(format!("process property {SERVICE_REGION} is not set"))
        })?;

        SigV4Properties::new(value)
            .map_err(|err| err.with_context(format!("process property: {SERVICE_REGION}")))
    }

    fn name(&self) -> &str {
        "ProcessPropertiesProvider"
    }
}

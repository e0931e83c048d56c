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

use crate::{constants::*, Credential};
use async_trait::async_trait;
use wssign_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads AWS credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `AWS_ACCESS_KEY_ID` (or the legacy `AWS_ACCESS_KEY`): The AWS access key ID
/// - `AWS_SECRET_ACCESS_KEY` (or the legacy `AWS_SECRET_KEY`): The AWS secret access key
/// - `AWS_SESSION_TOKEN`: The AWS session token (optional)
///
/// Blank values are treated as absent.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

fn first_non_blank(ctx: &Context, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| ctx.env_var(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let access_key_id = first_non_blank(ctx, &[AWS_ACCESS_KEY_ID, AWS_ACCESS_KEY]);
        let secret_access_key = first_non_blank(ctx, &[AWS_SECRET_ACCESS_KEY, AWS_SECRET_KEY]);

        match (access_key_id, secret_access_key) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak,
                secret_access_key: sk,
                session_token: first_non_blank(ctx, &[AWS_SESSION_TOKEN]),
                expires_in: None,
            })),
            _ => Ok(None),
        }
    }
}

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

use crate::constants::{
    AWS_CONTAINER_AUTHORIZATION_TOKEN, AWS_CONTAINER_CREDENTIALS_FULL_URI,
    AWS_CONTAINER_CREDENTIALS_RELATIVE_URI,
};
use crate::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::Method;
use serde::Deserialize;
use wssign_core::time::parse_rfc3339;
use wssign_core::{Context, Error, ProvideCredential, Result};

const ECS_CREDENTIALS_ENDPOINT: &str = "http://169.254.170.2";

/// EcsCredentialProvider will load credential from ECS task metadata endpoint.
///
/// ECS credential provider provides credentials for ECS tasks using
/// the AWS_CONTAINER_CREDENTIALS_RELATIVE_URI or AWS_CONTAINER_CREDENTIALS_FULL_URI
/// environment variables. `AWS_CONTAINER_AUTHORIZATION_TOKEN` is sent as the
/// `Authorization` header when present.
///
/// References:
/// - [IAM roles for tasks](https://docs.aws.amazon.com/AmazonECS/latest/developerguide/task-iam-roles.html)
#[derive(Debug, Default, Clone)]
pub struct EcsCredentialProvider {
    endpoint: Option<String>,
}

impl EcsCredentialProvider {
    /// Create a new `EcsCredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the endpoint the relative uri is resolved against.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for EcsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let relative_uri = ctx.env_var(AWS_CONTAINER_CREDENTIALS_RELATIVE_URI);
        let full_uri = ctx.env_var(AWS_CONTAINER_CREDENTIALS_FULL_URI);

        let url = match (relative_uri, full_uri) {
            (Some(relative), _) => format!(
                "{}{}",
                self.endpoint.as_deref().unwrap_or(ECS_CREDENTIALS_ENDPOINT),
                relative
            ),
            (None, Some(full)) => full,
            // Not in an ECS environment
            (None, None) => return Ok(None),
        };

        let mut req = http::Request::builder().uri(&url).method(Method::GET);
        if let Some(token) = ctx.env_var(AWS_CONTAINER_AUTHORIZATION_TOKEN) {
            req = req.header(AUTHORIZATION, token);
        }
        let req = req.body(Bytes::new()).map_err(|e| {
            Error::request_invalid("failed to build ECS metadata request")
                .with_context(format!("url: {url}"))
                .with_source(e)
        })?;

        let resp = ctx.http_send_as_string(req).await?;

        if resp.status() != http::StatusCode::OK {
            return Err(Error::unexpected(format!(
                "request to ECS task metadata endpoint failed: status={}, body={}",
                resp.status(),
                resp.body()
            )));
        }

        let content = resp.into_body();
        let cred: EcsTaskCredentials = serde_json::from_str(&content).map_err(|e| {
            Error::unexpected("failed to parse ECS task credentials").with_source(e)
        })?;

        let expires_in = parse_rfc3339(&cred.expiration)?;

        Ok(Some(Credential {
            access_key_id: cred.access_key_id,
            secret_access_key: cred.secret_access_key,
            session_token: Some(cred.token),
            expires_in: Some(expires_in),
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EcsTaskCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: String,
}

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

use crate::constants::{AWS_EC2_METADATA_DISABLED, AWS_EC2_METADATA_SERVICE_ENDPOINT};
use crate::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::TimeDelta;
use http::header::CONTENT_LENGTH;
use http::Method;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use wssign_core::time::{now, parse_rfc3339, DateTime};
use wssign_core::{Context, Error, ProvideCredential, Result};

const IMDS_ENDPOINT: &str = "http://169.254.169.254";

/// IMDSv2CredentialProvider loads credentials of the IAM role attached to an EC2 instance.
///
/// The session token for the metadata service is reused until ten minutes
/// before it expires. Set `AWS_EC2_METADATA_DISABLED=true` to skip this provider.
#[derive(Debug, Clone)]
pub struct IMDSv2CredentialProvider {
    endpoint: Option<String>,
    token: Arc<Mutex<(String, DateTime)>>,
}

impl Default for IMDSv2CredentialProvider {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: Arc::new(Mutex::new((String::new(), DateTime::default()))),
        }
    }
}

impl IMDSv2CredentialProvider {
    /// Create a new `IMDSv2CredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint for the metadata service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn get_endpoint(&self, ctx: &Context) -> String {
        // First check configured endpoint, then environment, then default
        self.endpoint.clone().unwrap_or_else(|| {
            ctx.env_var(AWS_EC2_METADATA_SERVICE_ENDPOINT)
                .unwrap_or_else(|| IMDS_ENDPOINT.into())
        })
    }

    async fn load_ec2_metadata_token(&self, ctx: &Context) -> Result<String> {
        {
            let (token, expires_in) = self
                .token
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone();
            if expires_in > now() {
                return Ok(token);
            }
        }

        let endpoint = self.get_endpoint(ctx);
        let url = format!("{endpoint}/latest/api/token");
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::PUT)
            .header(CONTENT_LENGTH, "0")
            // 21600s (6h) is recommended by AWS.
            .header("x-aws-ec2-metadata-token-ttl-seconds", "21600")
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build IMDS token request")
                    .with_context(format!("url: {url}"))
                    .with_source(e)
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to connect to IMDS")
                .with_context(format!("endpoint: {endpoint}"))
                .with_context("hint: check if running on EC2 instance")
                .with_source(e)
        })?;

        if resp.status() != http::StatusCode::OK {
            return Err(imds_error("fetch_imds_token", resp.status(), resp.body()));
        }
        let ec2_token = resp.into_body();
        // Expire the cached token 10 minutes early to enforce re-read.
        let expires_in = now() + TimeDelta::seconds(21600) - TimeDelta::seconds(600);

        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = (ec2_token.clone(), expires_in);

        Ok(ec2_token)
    }

    async fn get_with_token(
        &self,
        ctx: &Context,
        operation: &str,
        url: &str,
        token: &str,
    ) -> Result<String> {
        let req = http::Request::builder()
            .uri(url)
            .method(Method::GET)
            .header("x-aws-ec2-metadata-token", token)
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build IMDS request")
                    .with_context(format!("operation: {operation}"))
                    .with_source(e)
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to send IMDS request")
                .with_context(format!("operation: {operation}"))
                .with_source(e)
        })?;

        if resp.status() != http::StatusCode::OK {
            return Err(imds_error(operation, resp.status(), resp.body()));
        }

        Ok(resp.into_body())
    }
}

#[async_trait]
impl ProvideCredential for IMDSv2CredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let disabled = ctx
            .env_var(AWS_EC2_METADATA_DISABLED)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if disabled {
            return Ok(None);
        }

        let token = self.load_ec2_metadata_token(ctx).await?;
        let endpoint = self.get_endpoint(ctx);

        // List all credentials that node has.
        let url = format!("{endpoint}/latest/meta-data/iam/security-credentials/");
        let profile_name = self
            .get_with_token(ctx, "list_instance_profiles", &url, &token)
            .await?;
        let profile_name = profile_name.lines().next().unwrap_or_default().trim();
        if profile_name.is_empty() {
            return Err(
                Error::config_invalid("no IAM role attached to EC2 instance")
                    .with_context("hint: attach an IAM role to your EC2 instance"),
            );
        }

        // Get the credentials via role_name.
        let url = format!("{endpoint}/latest/meta-data/iam/security-credentials/{profile_name}");
        let content = self
            .get_with_token(ctx, "fetch_credentials", &url, &token)
            .await
            .map_err(|e| e.with_context(format!("profile: {profile_name}")))?;

        let resp: Ec2MetadataIamSecurityCredentials =
            serde_json::from_str(&content).map_err(|e| {
                Error::unexpected("failed to parse IMDS credentials response")
                    .with_context(format!("profile: {profile_name}"))
                    .with_source(e)
            })?;

        match resp.code.as_str() {
            "Success" => {}
            "AssumeRoleUnauthorizedAccess" => {
                return Err(Error::credential_denied(format!(
                    "EC2 instance not authorized to assume role: {}",
                    resp.message
                ))
                .with_context(format!("profile: {profile_name}")));
            }
            code if code.contains("Expired") => {
                return Err(Error::credential_expired(format!(
                    "IMDS credentials expired: {}",
                    resp.message
                ))
                .with_context(format!("profile: {profile_name}")));
            }
            code => {
                return Err(Error::unexpected(format!(
                    "IMDS returned error: [{code}] {}",
                    resp.message
                ))
                .with_context(format!("profile: {profile_name}")));
            }
        }

        Ok(Some(Credential {
            access_key_id: resp.access_key_id,
            secret_access_key: resp.secret_access_key,
            session_token: Some(resp.token),
            expires_in: Some(parse_rfc3339(&resp.expiration)?),
        }))
    }
}

fn imds_error(operation: &str, status: http::StatusCode, body: &str) -> Error {
    let err = match status.as_u16() {
        401 | 403 => Error::credential_denied(format!("IMDS denied {operation}")),
        404 => Error::config_invalid(format!("IMDS endpoint not found for {operation}")),
        _ => Error::unexpected(format!("IMDS {operation} failed")),
    };
    err.with_context(format!("status: {status}"))
        .with_context(format!("body: {body}"))
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Ec2MetadataIamSecurityCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: String,

    code: String,
    message: String,
}

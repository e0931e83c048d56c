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

/// PropertiesCredentialProvider loads AWS credentials from process properties.
///
/// This provider looks for the following properties:
/// - `aws.accessKeyId`: The AWS access key ID
/// - `aws.secretKey`: The AWS secret access key
/// - `aws.sessionToken`: The AWS session token (optional)
///
/// Properties are read through [`Context::property`], usually backed by
/// [`wssign_core::ProcessProperties`].
#[derive(Debug, Default, Clone)]
pub struct PropertiesCredentialProvider;

impl PropertiesCredentialProvider {
    /// Create a new PropertiesCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for PropertiesCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let get = |key: &str| {
            ctx.property(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (
            get(AWS_ACCESS_KEY_ID_PROPERTY),
            get(AWS_SECRET_KEY_PROPERTY),
        ) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak,
                secret_access_key: sk,
                session_token: get(AWS_SESSION_TOKEN_PROPERTY),
                expires_in: None,
            })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssign_core::StaticProperties;

    #[tokio::test]
    async fn test_properties_credential_provider() -> anyhow::Result<()> {
        let ctx = Context::new().with_properties(StaticProperties::from([
            (AWS_ACCESS_KEY_ID_PROPERTY, "property_access_key"),
            (AWS_SECRET_KEY_PROPERTY, "property_secret_key"),
            (AWS_SESSION_TOKEN_PROPERTY, "property_session_token"),
        ]));

        let cred = PropertiesCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "property_access_key");
        assert_eq!(cred.secret_access_key, "property_secret_key");
        assert_eq!(
            cred.session_token.as_deref(),
            Some("property_session_token")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_properties_credential_provider_partial() -> anyhow::Result<()> {
        let ctx = Context::new().with_properties(StaticProperties::from([(
            AWS_ACCESS_KEY_ID_PROPERTY,
            "property_access_key",
        )]));

        let cred = PropertiesCredentialProvider::new()
            .provide_credential(&ctx)
            .await?;
        assert!(cred.is_none());

        Ok(())
    }
}

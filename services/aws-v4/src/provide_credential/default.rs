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

use crate::provide_credential::{
    EcsCredentialProvider, EnvCredentialProvider, IMDSv2CredentialProvider,
    ProfileCredentialProvider, PropertiesCredentialProvider,
};
use crate::Credential;
use async_trait::async_trait;
use wssign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider is a loader that will try to load credential via default chains.
///
/// Resolution order:
///
/// 1. Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`)
/// 2. Process properties (`aws.accessKeyId`, `aws.secretKey`, `aws.sessionToken`)
/// 3. Shared config (`~/.aws/credentials`, `~/.aws/config`)
/// 4. ECS (IAM Roles for Tasks) & Container credentials
/// 5. EC2 IMDSv2
///
/// Every call walks the chain again, credentials are never cached.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` instance.
    pub fn new() -> Self {
        let chain = ProvideCredentialChain::new()
            .push(EnvCredentialProvider::new())
            .push(PropertiesCredentialProvider::new())
            .push(ProfileCredentialProvider::new())
            .push(EcsCredentialProvider::new())
            .push(IMDSv2CredentialProvider::new());

        Self { chain }
    }

    /// Create with a custom credential chain.
    pub fn with_chain(chain: ProvideCredentialChain<Credential>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use std::collections::HashMap;
    use wssign_core::{StaticEnv, StaticProperties};
    use wssign_file_read_tokio::TokioFileRead;

    fn envs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut envs: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // Keep the chain away from the machine this test runs on.
        envs.insert(AWS_EC2_METADATA_DISABLED.to_string(), "true".to_string());
        envs.insert(
            AWS_SHARED_CREDENTIALS_FILE.to_string(),
            "/non/existent/credentials".to_string(),
        );
        envs.insert(AWS_CONFIG_FILE.to_string(), "/non/existent/config".to_string());
        envs
    }

    #[tokio::test]
    async fn test_default_chain_without_sources() {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs: envs(&[]),
            });

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect("load must succeed");
        assert!(cred.is_none());
    }

    #[tokio::test]
    async fn test_env_wins_over_properties() {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs: envs(&[
                    (AWS_ACCESS_KEY_ID, "env_access_key_id"),
                    (AWS_SECRET_ACCESS_KEY, "env_secret_access_key"),
                ]),
            })
            .with_properties(StaticProperties::from([
                (AWS_ACCESS_KEY_ID_PROPERTY, "property_access_key_id"),
                (AWS_SECRET_KEY_PROPERTY, "property_secret_access_key"),
            ]));

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect("load must succeed")
            .expect("credential must exist");
        assert_eq!("env_access_key_id", cred.access_key_id);
        assert_eq!("env_secret_access_key", cred.secret_access_key);
    }

    #[tokio::test]
    async fn test_properties_used_when_env_is_empty() {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: None,
                envs: envs(&[]),
            })
            .with_properties(StaticProperties::from([
                (AWS_ACCESS_KEY_ID_PROPERTY, "property_access_key_id"),
                (AWS_SECRET_KEY_PROPERTY, "property_secret_access_key"),
            ]));

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect("load must succeed")
            .expect("credential must exist");
        assert_eq!("property_access_key_id", cred.access_key_id);
    }
}

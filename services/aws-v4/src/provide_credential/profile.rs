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

use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use ini::Ini;
use log::debug;
use wssign_core::{Context, Error, ProvideCredential, Result};

/// ProfileCredentialProvider loads AWS credentials from configuration files.
///
/// This provider loads credentials from:
/// - `~/.aws/credentials` (or the path specified by `AWS_SHARED_CREDENTIALS_FILE`)
/// - `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`)
///
/// The profile to use is determined by:
/// 1. The `AWS_PROFILE` environment variable
/// 2. The profile specified via `with_profile()`
/// 3. Default to "default"
///
/// Missing files or profiles yield `Ok(None)`, a file that can't be parsed is an error.
#[derive(Debug)]
pub struct ProfileCredentialProvider {
    profile: String,
    config_file: Option<String>,
    credentials_file: Option<String>,
}

impl Default for ProfileCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Which kind of shared file is being read, they name sections differently.
#[derive(Debug, Clone, Copy)]
enum ProfileFile {
    Credentials,
    Config,
}

impl ProfileFile {
    fn env_key(self) -> &'static str {
        match self {
            ProfileFile::Credentials => AWS_SHARED_CREDENTIALS_FILE,
            ProfileFile::Config => AWS_CONFIG_FILE,
        }
    }

    fn default_path(self) -> &'static str {
        match self {
            ProfileFile::Credentials => "~/.aws/credentials",
            ProfileFile::Config => "~/.aws/config",
        }
    }

    fn section(self, profile: &str) -> String {
        match (self, profile) {
            (ProfileFile::Credentials, _) | (ProfileFile::Config, "default") => {
                profile.to_string()
            }
            (ProfileFile::Config, x) => format!("profile {x}"),
        }
    }
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self {
            profile: "default".to_string(),
            config_file: None,
            credentials_file: None,
        }
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    async fn load_from_file(
        &self,
        ctx: &Context,
        file: ProfileFile,
        profile: &str,
    ) -> Result<Option<Credential>> {
        let configured = match file {
            ProfileFile::Credentials => self.credentials_file.clone(),
            ProfileFile::Config => self.config_file.clone(),
        };
        let path = configured
            .or_else(|| ctx.env_var(file.env_key()))
            .unwrap_or_else(|| file.default_path().to_string());

        let Some(expanded_path) = ctx.expand_home_dir(&path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read_as_string(&expanded_path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read {file:?} file {expanded_path}: {err}");
                return Ok(None);
            }
        };

        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse {file:?} file"))
                .with_context(format!("path: {expanded_path}"))
                .with_source(e)
        })?;

        let section = file.section(profile);
        let Some(props) = conf.section(Some(section.as_str())) else {
            debug!("section {section} not found in {file:?} file {expanded_path}");
            return Ok(None);
        };

        match (
            props.get("aws_access_key_id"),
            props.get("aws_secret_access_key"),
        ) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak.to_string(),
                secret_access_key: sk.to_string(),
                session_token: props.get("aws_session_token").map(|s| s.to_string()),
                expires_in: None,
            })),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let profile = ctx
            .env_var(AWS_PROFILE)
            .unwrap_or_else(|| self.profile.clone());

        if let Some(cred) = self
            .load_from_file(ctx, ProfileFile::Credentials, &profile)
            .await?
        {
            return Ok(Some(cred));
        }

        self.load_from_file(ctx, ProfileFile::Config, &profile)
            .await
    }
}

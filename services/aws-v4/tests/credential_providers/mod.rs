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

use std::path::PathBuf;

use wssign_aws_v4::{
    DefaultCredentialProvider, EnvCredentialProvider, ProfileCredentialProvider,
};
use wssign_core::{Context, OsEnv, ProcessProperties, ProvideCredential};
use wssign_file_read_tokio::TokioFileRead;

fn testdata(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn os_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_env(OsEnv)
        .with_properties(ProcessProperties)
}

#[tokio::test]
async fn test_env_provider_reads_process_env() {
    let cred = temp_env::async_with_vars(
        [
            ("AWS_ACCESS_KEY_ID", Some("os_access_key_id")),
            ("AWS_SECRET_ACCESS_KEY", Some("os_secret_access_key")),
            ("AWS_SESSION_TOKEN", None),
        ],
        async {
            EnvCredentialProvider::new()
                .provide_credential(&os_context())
                .await
        },
    )
    .await
    .expect("load must succeed")
    .expect("credential must exist");

    assert_eq!(cred.access_key_id, "os_access_key_id");
    assert_eq!(cred.secret_access_key, "os_secret_access_key");
    assert!(cred.session_token.is_none());
}

#[tokio::test]
async fn test_profile_provider_with_testdata() {
    let provider = ProfileCredentialProvider::new()
        .with_credentials_file(testdata("default_credential"))
        .with_config_file(testdata("default_config"));

    let cred = temp_env::async_with_vars([("AWS_PROFILE", None::<&str>)], async {
        provider.provide_credential(&os_context()).await
    })
    .await
    .expect("load must succeed")
    .expect("credential must exist");
    assert_eq!(cred.access_key_id, "shared_access_key_id");
    assert_eq!(cred.secret_access_key, "shared_secret_access_key");

    let cred = temp_env::async_with_vars([("AWS_PROFILE", Some("neptune"))], async {
        provider.provide_credential(&os_context()).await
    })
    .await
    .expect("load must succeed")
    .expect("credential must exist");
    assert_eq!(cred.access_key_id, "config_access_key_id");
    assert_eq!(cred.session_token.as_deref(), Some("config_session_token"));
}

#[tokio::test]
async fn test_default_provider_falls_through_to_shared_files() {
    let credentials_file = testdata("default_credential");
    let config_file = testdata("default_config");

    let cred = temp_env::async_with_vars(
        [
            ("AWS_ACCESS_KEY_ID", None),
            ("AWS_ACCESS_KEY", None),
            ("AWS_SECRET_ACCESS_KEY", None),
            ("AWS_SECRET_KEY", None),
            ("AWS_PROFILE", None),
            ("AWS_EC2_METADATA_DISABLED", Some("true")),
            ("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI", None),
            ("AWS_CONTAINER_CREDENTIALS_FULL_URI", None),
            ("AWS_SHARED_CREDENTIALS_FILE", Some(credentials_file.as_str())),
            ("AWS_CONFIG_FILE", Some(config_file.as_str())),
        ],
        async {
            DefaultCredentialProvider::new()
                .provide_credential(&os_context())
                .await
        },
    )
    .await
    .expect("load must succeed")
    .expect("credential must exist");

    assert_eq!(cred.access_key_id, "shared_access_key_id");
}

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

use chrono::TimeZone;
use http::header::AUTHORIZATION;
use http::Request;
use pretty_assertions::assert_eq;
use wssign_aws_v4::{Credential, RequestSigner, StaticCredentialProvider, NEPTUNE_SERVICE};
use wssign_core::time::DateTime;
use wssign_core::{Context, SignRequest, Signer};

fn time(iso: &str) -> DateTime {
    chrono::NaiveDateTime::parse_from_str(iso, "%Y%m%dT%H%M%SZ")
        .map(|t| chrono::Utc.from_utc_datetime(&t))
        .expect("time must be valid")
}

/// `get-vanilla` from the AWS SigV4 test suite.
#[tokio::test]
async fn test_aws_sigv4_suite_get_vanilla() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (mut parts, _) = Request::get("http://example.amazonaws.com/")
        .header("host", "example.amazonaws.com")
        .body(())
        .unwrap()
        .into_parts();

    let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
    RequestSigner::new("service", "us-east-1")
        .with_time(time("20150830T123600Z"))
        .sign_request(&Context::new(), &mut parts, Some(&cred))
        .await
        .expect("sign must succeed");

    assert_eq!(parts.headers["x-amz-date"], "20150830T123600Z");
    assert_eq!(
        parts.headers[AUTHORIZATION],
        "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, SignedHeaders=host;x-amz-date, Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
    );
}

#[tokio::test]
async fn test_signer_signs_upgrade_request_with_session_token() {
    let _ = env_logger::builder().is_test(true).try_init();

    let signer = Signer::new(
        Context::new(),
        StaticCredentialProvider::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
            .with_session_token("session-token"),
        RequestSigner::new(NEPTUNE_SERVICE, "us-east-1").with_time(time("20240512T083015Z")),
    );

    let uri = "wss://db.cluster-abc.us-east-1.neptune.amazonaws.com:8182/gremlin";
    let (mut parts, _) = Request::get(uri)
        .header("host", "db.cluster-abc.us-east-1.neptune.amazonaws.com:8182")
        .header("upgrade", "websocket")
        .header("connection", "Upgrade")
        .body(())
        .unwrap()
        .into_parts();

    signer.sign(&mut parts).await.expect("sign must succeed");

    assert_eq!(parts.uri.to_string(), uri);
    assert_eq!(parts.headers["x-amz-security-token"], "session-token");

    let authorization = parts.headers[AUTHORIZATION].to_str().unwrap();
    assert!(authorization.starts_with(
        "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240512/us-east-1/neptune-db/aws4_request, SignedHeaders=host;upgrade;x-amz-date;x-amz-security-token, Signature="
    ));
}

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

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http::HeaderMap;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wssign_aws_v4::{Credential, SigV4Properties, StaticCredentialProvider};
use wssign_core::{Context, ErrorKind, ProvideCredential};
use wssign_websocket::{
    Connection, ConnectionSettings, Message, SigV4Channelizer, TungsteniteTransport,
};

/// Accept one connection, report the upgrade headers and echo binary frames.
async fn echo_server(reject: bool) -> (String, oneshot::Receiver<HeaderMap>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = tx.send(req.headers().clone());
            if reject {
                let mut err = ErrorResponse::new(Some("forbidden".to_string()));
                *err.status_mut() = http::StatusCode::FORBIDDEN;
                return Err(err);
            }
            Ok(resp)
        };
        let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
            return;
        };

        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Binary(v) => ws.send(Message::Binary(v)).await.unwrap(),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    (format!("ws://{addr}/gremlin"), rx)
}

fn channelizer(endpoint: &str) -> SigV4Channelizer {
    SigV4Channelizer::new(ConnectionSettings::new(endpoint), Context::new())
        .with_properties_provider(|_: &Context| SigV4Properties::new("us-east-1"))
        .with_credential_provider(
            StaticCredentialProvider::new("access_key_id", "secret_access_key")
                .with_session_token("session_token"),
        )
}

#[tokio::test]
async fn test_signed_upgrade_and_echo() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (endpoint, headers) = echo_server(false).await;
    let mut conn = Connection::open(channelizer(&endpoint), &TungsteniteTransport::new())
        .await
        .expect("connection must be ready");

    let headers = headers.await.unwrap();
    let authorization = headers["authorization"].to_str().unwrap();
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=access_key_id/"));
    assert!(authorization.contains("/us-east-1/neptune-db/aws4_request"));
    assert!(headers.contains_key("x-amz-date"));
    assert_eq!(headers["x-amz-security-token"], "session_token");

    conn.send(Bytes::from_static(b"g.V().count()")).await.unwrap();
    assert_eq!(
        conn.recv().await.unwrap(),
        Some(Bytes::from_static(b"g.V().count()"))
    );
    conn.keep_alive().await.unwrap();

    conn.close().await.unwrap();
    assert!(!conn.is_open());
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_rejected_upgrade_is_handshake_failure() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (endpoint, _headers) = echo_server(true).await;
    let err = Connection::open(channelizer(&endpoint), &TungsteniteTransport::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
}

#[tokio::test]
async fn test_silent_peer_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept the TCP connection but never answer the upgrade.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let settings = ConnectionSettings::new(format!("ws://{addr}/gremlin"))
        .with_handshake_timeout(Duration::from_millis(100));
    let channelizer = SigV4Channelizer::new(settings, Context::new())
        .with_properties_provider(|_: &Context| SigV4Properties::new("us-east-1"))
        .with_credential_provider(StaticCredentialProvider::new("ak", "sk"));

    let err = Connection::open(channelizer, &TungsteniteTransport::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HandshakeTimeout);

    server.abort();
}

#[derive(Debug)]
struct NoCredential;

#[async_trait::async_trait]
impl ProvideCredential for NoCredential {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> wssign_core::Result<Option<Credential>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_missing_credential_is_signing_failure() {
    let (endpoint, _headers) = echo_server(false).await;
    let channelizer = SigV4Channelizer::new(ConnectionSettings::new(endpoint), Context::new())
        .with_properties_provider(|_: &Context| SigV4Properties::new("us-east-1"))
        .with_credential_provider(NoCredential);

    let err = Connection::open(channelizer, &TungsteniteTransport::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SigningFailed);
}

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
    AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, X_AMZN_TRACE_ID, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE,
    X_AMZ_SECURITY_TOKEN,
};
use crate::Credential;
use async_trait::async_trait;
use http::request::Parts;
use http::{header, HeaderValue};
use log::debug;
use percent_encoding::utf8_percent_encode;
use std::fmt::Write;
use wssign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use wssign_core::time::{format_date, format_iso8601, now, DateTime};
use wssign_core::utils::redact_authorization;
use wssign_core::{Context, Error, Result, SignRequest, SigningRequest};

/// Headers that never take part in the signature.
///
/// Hop-by-hop headers like `connection` may be rewritten by proxies on the
/// way to the server, and `authorization` is the signature itself.
const UNSIGNED_HEADERS: [&str; 3] = ["authorization", "connection", X_AMZN_TRACE_ID];

/// RequestSigner that implement AWS SigV4 with header based signing.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// Signing only adds headers to the request, in this order:
///
/// 1. `host` if the request doesn't carry it yet
/// 2. `x-amz-date`
/// 3. `x-amz-security-token` if the credential has a session token
/// 4. `authorization`
///
/// The method and the uri are never touched.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for reproducible signatures in tests.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Get the service name used in the credential scope.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Get the region used in the credential scope.
    pub fn region(&self) -> &str {
        &self.region
    }

    fn sign_headers(&self, req: &mut SigningRequest, cred: &Credential) -> Result<()> {
        let now = self.time.unwrap_or_else(now);

        canonicalize_header(req, cred, now)?;
        canonicalize_query(req);

        let signed_headers = signed_header_names(req);
        let creq = canonical_request_string(req, &signed_headers)?;
        debug!("calculated canonical request: {creq}");
        let encoded_req = hex_sha256(creq.as_bytes());

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/aws4_request",
            format_date(now),
            self.region,
            self.service
        );
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "AWS4-HMAC-SHA256")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", &encoded_req)?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let value = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id,
            scope,
            signed_headers.join(";"),
            signature
        );
        debug!("calculated authorization: {}", redact_authorization(&value));

        let mut authorization = HeaderValue::from_str(&value).map_err(|e| {
            Error::signing_failed("failed to create authorization header").with_source(e)
        })?;
        authorization.set_sensitive(true);
        req.headers.insert(header::AUTHORIZATION, authorization);

        Ok(())
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_unavailable(
                "aws sigv4 signing requires a credential",
            ));
        };

        let mut signed_req = SigningRequest::build(req)?;
        let result = self.sign_headers(&mut signed_req, cred);

        // Headers always go back to the request, even when signing failed.
        signed_req.apply(req)?;
        result
    }
}

fn canonical_request_string(ctx: &SigningRequest, signed_headers: &[String]) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", ctx.method)?;
    // Insert encoded path, the raw path is encoded once more for non-S3 services.
    writeln!(f, "{}", utf8_percent_encode(&ctx.path, &AWS_URI_ENCODE_SET))?;
    // Insert query
    writeln!(
        f,
        "{}",
        ctx.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;
    // Insert signed headers
    for name in signed_headers {
        let values = ctx
            .headers
            .get_all(name.as_str())
            .iter()
            .map(|v| v.to_str().map(canonical_header_value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        writeln!(f, "{}:{}", name, values.join(","))?;
    }
    writeln!(f)?;
    writeln!(f, "{}", signed_headers.join(";"))?;

    match ctx.headers.get(X_AMZ_CONTENT_SHA_256) {
        Some(v) => write!(f, "{}", v.to_str()?)?,
        // Upgrade requests carry no body.
        None => write!(f, "{}", hex_sha256(b""))?,
    }

    Ok(f)
}

/// Trim the value and collapse every inner run of spaces into one space.
///
/// Only the canonical request sees this form, the header is sent as is.
fn canonical_header_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for word in v.split(' ').filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn signed_header_names(ctx: &SigningRequest) -> Vec<String> {
    let mut names: Vec<String> = ctx
        .header_name_to_vec_sorted()
        .into_iter()
        .filter(|name| !UNSIGNED_HEADERS.contains(name))
        .map(|name| name.to_string())
        .collect();
    names.dedup();
    names
}

fn canonicalize_header(ctx: &mut SigningRequest, cred: &Credential, now: DateTime) -> Result<()> {
    // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (_, value) in ctx.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    // Insert HOST header if not present.
    if ctx.headers.get(header::HOST).is_none() {
        let host = HeaderValue::from_str(ctx.authority.as_str())?;
        ctx.headers.insert(header::HOST, host);
    }

    ctx.headers
        .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);

    // Insert X_AMZ_SECURITY_TOKEN header if security token exists.
    if let Some(token) = &cred.session_token {
        let mut value = HeaderValue::from_str(token)?;
        // Set token value sensitive to avoid leaking.
        value.set_sensitive(true);

        ctx.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    Ok(())
}

fn canonicalize_query(ctx: &mut SigningRequest) {
    if ctx.query.is_empty() {
        return;
    }

    ctx.query = ctx
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    // Sort by encoded param name, then value.
    ctx.query.sort();
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

// Copyright 2024 Handoff Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP transport to the Authenticator (alternate/legacy).

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::HandoffConfig;
use crate::error::{HandoffError, Result, S3ErrorCode};
use crate::verdict::{ErrorCategory, Verdict};
use crate::verifier::{Verifier, VerifyRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPayload<'a> {
    string_to_sign: String,
    access_key_id: &'a str,
    authorization: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    eak_parameters: Option<EakParameters<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EakParameters<'a> {
    method: &'a str,
    bucket_name: &'a str,
    object_key_name: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    message: String,
    uid: String,
}

/// Verifier speaking the legacy `POST <base>/verify` JSON protocol.
///
/// The protocol has no signing-key endpoint, so chunked uploads deny closed
/// on this transport.
pub struct HttpVerifier {
    client: reqwest::Client,
    uri: String,
}

impl HttpVerifier {
    pub fn new(conf: &HandoffConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!conf.verify_ssl)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HandoffError::Config(e.to_string()))?;
        Ok(Self {
            client,
            uri: conf.uri.clone(),
        })
    }

    fn verify_url(&self) -> String {
        if self.uri.ends_with('/') {
            format!("{}verify", self.uri)
        } else {
            format!("{}/verify", self.uri)
        }
    }

    fn payload<'a>(req: &'a VerifyRequest<'a>) -> VerifyPayload<'a> {
        VerifyPayload {
            string_to_sign: BASE64.encode(req.string_to_sign),
            access_key_id: req.access_key_id,
            authorization: req.authorization,
            eak_parameters: req.params.map(|p| EakParameters {
                method: p.method(),
                bucket_name: p.bucket_name(),
                object_key_name: p.object_key_name(),
            }),
        }
    }
}

/// Map the Authenticator's HTTP response onto a verdict.
///
/// 401 is a signature mismatch, 404 an unknown access key, anything else a
/// plain denial. The body's `message` field is read even for failed verdicts.
fn verdict_for(status: u16, body: &str) -> Verdict {
    let parsed: Option<VerifyResponse> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().map(|p| p.message.clone()).unwrap_or_default();

    match status {
        200 => match parsed {
            Some(p) => Verdict::granted(p.uid, p.message),
            None => Verdict::denied(
                ErrorCategory::Internal,
                S3ErrorCode::InternalError,
                "failed to parse Authenticator verify response",
            ),
        },
        401 => Verdict::denied(ErrorCategory::Auth, S3ErrorCode::SignatureDoesNotMatch, message),
        404 => Verdict::denied(ErrorCategory::Auth, S3ErrorCode::InvalidAccessKeyId, message),
        other => Verdict::denied(
            ErrorCategory::Auth,
            S3ErrorCode::AccessDenied,
            format!("Authenticator returned status {other}: {message}"),
        ),
    }
}

#[async_trait::async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, req: &VerifyRequest<'_>, cancel: &CancellationToken) -> Verdict {
        let url = self.verify_url();
        debug!(trans_id = req.transaction_id, url = %url, "sending HTTP auth request");

        let send = self.client.post(&url).json(&Self::payload(req)).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(trans_id = req.transaction_id, "authentication cancelled");
                return Verdict::denied(
                    ErrorCategory::Transport,
                    S3ErrorCode::AccessDenied,
                    "authentication cancelled",
                );
            }
            response = send => response,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(trans_id = req.transaction_id, error = %e, "HTTP auth request failed");
                return Verdict::denied(ErrorCategory::Transport, S3ErrorCode::AccessDenied, e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        verdict_for(status, &body)
    }

    async fn fetch_signing_key(
        &self,
        transaction_id: &str,
        _authorization: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        warn!(trans_id = transaction_id, "signing key fetch unsupported over HTTP transport");
        Err(HandoffError::SigningKey(
            "the HTTP verify protocol has no signing key endpoint".to_owned(),
        ))
    }
}

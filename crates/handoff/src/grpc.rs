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

//! gRPC transport to the Authenticator (primary).

use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, error, info, warn};

use handoff_protos::authenticator::v1::authenticate_rest_request::HttpMethod;
use handoff_protos::authenticator::v1::authenticator_service_client::AuthenticatorServiceClient;
use handoff_protos::authenticator::v1::{AuthenticateRestRequest, GetSigningKeyRequest};

use crate::config::HandoffConfig;
use crate::error::{HandoffError, Result, S3ErrorCode};
use crate::translate::translate_authenticator_error;
use crate::verdict::{ErrorCategory, Verdict};
use crate::verifier::{Verifier, VerifyRequest};

/// TCP keepalive interval for the channel.
const TCP_KEEPALIVE: Duration = Duration::from_secs(10);

/// HTTP/2 PING interval, application-layer heartbeat.
const HTTP2_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// How long to wait for a PING ACK before the connection is considered dead.
const HTTP2_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reconnect backoff tuning for the Authenticator channel.
///
/// Derived from configuration; runtime-alterable through the config observer.
/// New values take effect at the next channel rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTuning {
    pub initial_reconnect_backoff: Duration,
    pub min_reconnect_backoff: Duration,
    pub max_reconnect_backoff: Duration,
}

impl ChannelTuning {
    pub fn from_config(conf: &HandoffConfig) -> Self {
        Self {
            initial_reconnect_backoff: Duration::from_millis(conf.grpc_arg_initial_reconnect_backoff_ms),
            min_reconnect_backoff: Duration::from_millis(conf.grpc_arg_min_reconnect_backoff_ms),
            max_reconnect_backoff: Duration::from_millis(conf.grpc_arg_max_reconnect_backoff_ms),
        }
    }
}

struct ChannelState {
    channel: Channel,
    uri: String,
    tuning: ChannelTuning,
}

/// Verifier speaking `authenticator.v1.AuthenticatorService`.
///
/// Holds the one long-lived channel. Callers clone the channel handle under a
/// read lock and release it before dispatching, so a concurrent channel swap
/// never blocks behind an in-flight RPC. The channel connects lazily; a swap
/// only constructs the endpoint.
pub struct GrpcVerifier {
    state: RwLock<ChannelState>,
}

impl GrpcVerifier {
    pub fn new(conf: &HandoffConfig) -> Result<Self> {
        let tuning = ChannelTuning::from_config(conf);
        let channel = build_channel(&conf.grpc_uri, &tuning)?;
        info!(uri = %conf.grpc_uri, "Authenticator gRPC channel created");
        Ok(Self {
            state: RwLock::new(ChannelState {
                channel,
                uri: conf.grpc_uri.clone(),
                tuning,
            }),
        })
    }

    /// Store new channel tuning. Takes effect at the next channel rebuild.
    pub async fn set_channel_tuning(&self, tuning: ChannelTuning) {
        let mut state = self.state.write().await;
        debug!(
            initial_ms = tuning.initial_reconnect_backoff.as_millis(),
            min_ms = tuning.min_reconnect_backoff.as_millis(),
            max_ms = tuning.max_reconnect_backoff.as_millis(),
            "channel tuning updated"
        );
        state.tuning = tuning;
    }

    /// Swap the channel for a new URI, keeping the current tuning.
    ///
    /// On failure the previous channel stays in place.
    pub async fn set_channel_uri(&self, uri: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let channel = build_channel(uri, &state.tuning)?;
        state.channel = channel;
        state.uri = uri.to_owned();
        info!(uri, "Authenticator gRPC channel swapped");
        Ok(())
    }

    pub async fn channel_uri(&self) -> String {
        self.state.read().await.uri.clone()
    }

    async fn channel(&self) -> Channel {
        self.state.read().await.channel.clone()
    }

    fn verdict_from_status(status: &tonic::Status) -> Verdict {
        match handoff_protos::s3_error_details_from_status(status) {
            Ok(Some(details)) => {
                Verdict::Denied(translate_authenticator_error(details.r#type(), details.http_status_code, status.message()))
            }
            // No details at all: the RPC itself failed, not the authentication.
            Ok(None) if status.details().is_empty() => {
                Verdict::denied(ErrorCategory::Transport, S3ErrorCode::AccessDenied, status.message())
            }
            Ok(None) => Verdict::denied(
                ErrorCategory::Transport,
                S3ErrorCode::AccessDenied,
                format!("S3ErrorDetails not found, error message follows: {}", status.message()),
            ),
            Err(err) => Verdict::denied(
                ErrorCategory::Internal,
                S3ErrorCode::AccessDenied,
                format!(
                    "failed to deserialize gRPC error details ({err}), error message follows: {}",
                    status.message()
                ),
            ),
        }
    }
}

fn build_channel(uri: &str, tuning: &ChannelTuning) -> Result<Channel> {
    let endpoint = Endpoint::from_shared(uri.to_owned())
        .map_err(|e| HandoffError::Config(format!("invalid Authenticator gRPC URI '{uri}': {e}")))?
        // tonic has no gRPC-core reconnect-backoff channel args; the max
        // backoff bounds the dialer instead.
        .connect_timeout(tuning.max_reconnect_backoff)
        .tcp_keepalive(Some(TCP_KEEPALIVE))
        .http2_keep_alive_interval(HTTP2_KEEPALIVE_INTERVAL)
        .keep_alive_timeout(HTTP2_KEEPALIVE_TIMEOUT)
        .keep_alive_while_idle(true);
    Ok(endpoint.connect_lazy())
}

fn method_for(method: &str) -> HttpMethod {
    match method {
        "GET" => HttpMethod::Get,
        "PUT" => HttpMethod::Put,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        "HEAD" => HttpMethod::Head,
        _ => HttpMethod::Unspecified,
    }
}

fn request_for(req: &VerifyRequest<'_>) -> AuthenticateRestRequest {
    let mut message = AuthenticateRestRequest {
        transaction_id: req.transaction_id.to_owned(),
        string_to_sign: req.string_to_sign.to_vec(),
        authorization_header: req.authorization.to_owned(),
        ..Default::default()
    };
    if let Some(params) = req.params {
        message.set_http_method(method_for(params.method()));
        if !params.bucket_name().is_empty() {
            message.bucket_name = params.bucket_name().to_owned();
        }
        if !params.object_key_name().is_empty() {
            message.object_key = params.object_key_name().to_owned();
        }
        message.x_amz_headers = params.http_headers().clone();
        message.query_parameters = params.http_query_params().clone();
    }
    message
}

#[async_trait::async_trait]
impl Verifier for GrpcVerifier {
    async fn verify(&self, req: &VerifyRequest<'_>, cancel: &CancellationToken) -> Verdict {
        let mut client = AuthenticatorServiceClient::new(self.channel().await);
        let message = request_for(req);

        debug!(trans_id = req.transaction_id, "sending gRPC auth request");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(trans_id = req.transaction_id, "authentication cancelled");
                return Verdict::denied(
                    ErrorCategory::Transport,
                    S3ErrorCode::AccessDenied,
                    "authentication cancelled",
                );
            }
            outcome = client.authenticate_rest(message) => outcome,
        };

        match outcome {
            Ok(response) => {
                let response = response.into_inner();
                Verdict::granted(response.user_id, String::new())
            }
            Err(status) => Self::verdict_from_status(&status),
        }
    }

    async fn fetch_signing_key(
        &self,
        transaction_id: &str,
        authorization: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut client = AuthenticatorServiceClient::new(self.channel().await);
        let message = GetSigningKeyRequest {
            transaction_id: transaction_id.to_owned(),
            authorization_header: authorization.to_owned(),
        };

        debug!(trans_id = transaction_id, "sending gRPC signing key request");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(trans_id = transaction_id, "signing key fetch cancelled");
                return Err(HandoffError::Transport("signing key fetch cancelled".to_owned()));
            }
            outcome = client.get_signing_key(message) => outcome,
        };

        match outcome {
            Ok(response) => Ok(response.into_inner().signing_key),
            Err(status) => {
                error!(trans_id = transaction_id, message = status.message(), "failed to fetch signing key");
                Err(HandoffError::SigningKey(status.message().to_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authparams::AuthorizationParameters;
    use crate::request::RequestSnapshot;
    use handoff_protos::authenticator::v1::s3_error_details;
    use handoff_protos::authenticator::v1::S3ErrorDetails;
    use prost::Message;

    fn verifier() -> GrpcVerifier {
        // Nothing listens here; the channel is lazy so construction succeeds.
        let conf = HandoffConfig {
            grpc_uri: "http://127.0.0.1:1".to_owned(),
            ..Default::default()
        };
        GrpcVerifier::new(&conf).unwrap()
    }

    fn richer_status(details: &S3ErrorDetails) -> tonic::Status {
        let rpc_status = handoff_protos::google::rpc::Status {
            code: tonic::Code::Unauthenticated as i32,
            message: "denied".to_owned(),
            details: vec![prost_types::Any {
                type_url: format!("type.googleapis.com/{}", handoff_protos::S3_ERROR_DETAILS_TYPE),
                value: details.encode_to_vec(),
            }],
        };
        tonic::Status::with_details(
            tonic::Code::Unauthenticated,
            "signature mismatch",
            rpc_status.encode_to_vec().into(),
        )
    }

    #[test]
    fn invalid_uri_is_a_config_error() {
        let conf = HandoffConfig {
            grpc_uri: "not a uri".to_owned(),
            ..Default::default()
        };
        assert!(GrpcVerifier::new(&conf).is_err());
    }

    #[tokio::test]
    async fn bad_uri_swap_keeps_previous_channel() {
        let v = verifier();
        assert!(v.set_channel_uri("☃").await.is_err());
        assert_eq!(v.channel_uri().await, "http://127.0.0.1:1");

        v.set_channel_uri("http://127.0.0.1:2").await.unwrap();
        assert_eq!(v.channel_uri().await, "http://127.0.0.1:2");
    }

    #[test]
    fn status_without_details_is_a_transport_error() {
        let status = tonic::Status::unavailable("connection refused");
        let verdict = GrpcVerifier::verdict_from_status(&status);
        match verdict {
            Verdict::Denied(d) => {
                assert_eq!(d.category, ErrorCategory::Transport);
                assert_eq!(d.code, S3ErrorCode::AccessDenied);
                assert_eq!(d.message, "connection refused");
            }
            Verdict::Granted(_) => panic!("expected denial"),
        }
    }

    #[test]
    fn richer_error_model_is_translated() {
        let status = richer_status(&S3ErrorDetails {
            r#type: s3_error_details::Type::SignatureDoesNotMatch as i32,
            http_status_code: 401,
            message: "mismatch".to_owned(),
        });
        let verdict = GrpcVerifier::verdict_from_status(&status);
        match verdict {
            Verdict::Denied(d) => {
                assert_eq!(d.category, ErrorCategory::Auth);
                assert_eq!(d.code, S3ErrorCode::SignatureDoesNotMatch);
                assert_eq!(d.message, "signature mismatch");
            }
            Verdict::Granted(_) => panic!("expected denial"),
        }
    }

    #[test]
    fn undecodable_details_are_internal() {
        let status = tonic::Status::with_details(
            tonic::Code::Unauthenticated,
            "denied",
            bytes::Bytes::from_static(b"\xff\xff\xff"),
        );
        let verdict = GrpcVerifier::verdict_from_status(&status);
        match verdict {
            Verdict::Denied(d) => assert_eq!(d.category, ErrorCategory::Internal),
            Verdict::Granted(_) => panic!("expected denial"),
        }
    }

    #[test]
    fn request_carries_authorization_parameters() {
        let mut snapshot = RequestSnapshot {
            method: "PUT".to_owned(),
            relative_uri: "/testnv/rand".to_owned(),
            ..Default::default()
        };
        snapshot.env.set("HTTP_X_AMZ_DATE", "20231012T083736Z");
        let params = AuthorizationParameters::capture(&snapshot).unwrap();

        let req = VerifyRequest {
            transaction_id: "tx-1",
            access_key_id: "0555b35654ad1656d804",
            string_to_sign: b"GET\n...",
            authorization: "AWS 0555b35654ad1656d804:sig",
            session_token: None,
            params: Some(&params),
        };
        let message = request_for(&req);
        assert_eq!(message.http_method(), HttpMethod::Put);
        assert_eq!(message.bucket_name, "testnv");
        assert_eq!(message.object_key, "rand");
        assert_eq!(message.x_amz_headers.get("x-amz-date").map(String::as_str), Some("20231012T083736Z"));

        let bare = VerifyRequest { params: None, ..req };
        let message = request_for(&bare);
        assert_eq!(message.http_method(), HttpMethod::Unspecified);
        assert!(message.bucket_name.is_empty());
    }

    #[tokio::test]
    async fn cancelled_verify_denies_with_transport_category() {
        let v = verifier();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let req = VerifyRequest {
            transaction_id: "tx-cancel",
            access_key_id: "0555b35654ad1656d804",
            string_to_sign: b"",
            authorization: "AWS x:y",
            session_token: None,
            params: None,
        };
        let verdict = v.verify(&req, &cancel).await;
        match verdict {
            Verdict::Denied(d) => assert_eq!(d.category, ErrorCategory::Transport),
            Verdict::Granted(_) => panic!("expected denial"),
        }
    }
}

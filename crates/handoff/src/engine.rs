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

//! The delegated-authentication engine.
//!
//! Orchestrates one request through header normalization, context capture,
//! the Authenticator verdict and, for chunked uploads, the signing-key fetch.
//! The engine holds no secrets at any point; it forwards signing inputs and
//! interprets the verdict.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{AuthParamMode, HandoffConfig, RuntimeFlags};
use crate::error::{Result, S3ErrorCode};
use crate::grpc::{ChannelTuning, GrpcVerifier};
use crate::http::HttpVerifier;
use crate::normalize;
use crate::authparams::AuthorizationParameters;
use crate::request::RequestSnapshot;
use crate::verdict::{ErrorCategory, Verdict};
use crate::verifier::{Verifier, VerifyRequest};

/// `x-amz-content-sha256` value declaring a chunked (streaming) upload.
///
/// AWS also documents `content-encoding: aws-chunked` for these uploads, but
/// not every client sets it, so detection keys off this header alone.
pub const STREAMING_PAYLOAD_SHA256: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

const ENV_CONTENT_SHA256: &str = "HTTP_X_AMZ_CONTENT_SHA256";

/// Delegated-authentication engine.
///
/// One engine serves the whole gateway. Requests read a single immutable
/// [`RuntimeFlags`] snapshot for their lifetime; the config observer swaps
/// snapshots and retunes the transport without touching in-flight requests.
pub struct HandoffEngine {
    // Boot-only settings.
    grpc_mode: bool,
    presigned_expiry_check: bool,
    // Runtime-alterable toggles, swapped whole.
    flags: ArcSwap<RuntimeFlags>,
    verifier: Arc<dyn Verifier>,
    // Retained alongside the trait object for channel management.
    grpc: Option<Arc<GrpcVerifier>>,
}

impl HandoffEngine {
    /// Construct the engine, creating the transport selected by
    /// `conf.grpc_mode`.
    ///
    /// Failure to construct the gRPC channel (a malformed URI) is fatal here;
    /// the channel itself connects lazily on first use.
    pub fn new(conf: &HandoffConfig) -> Result<Self> {
        conf.validate()?;

        let (verifier, grpc): (Arc<dyn Verifier>, Option<Arc<GrpcVerifier>>) = if conf.grpc_mode {
            let grpc = Arc::new(GrpcVerifier::new(conf)?);
            (grpc.clone() as Arc<dyn Verifier>, Some(grpc))
        } else {
            (Arc::new(HttpVerifier::new(conf)?) as Arc<dyn Verifier>, None)
        };

        info!(
            grpc_mode = conf.grpc_mode,
            presigned_expiry_check = conf.enable_presigned_expiry_check,
            signature_v2 = conf.enable_signature_v2,
            chunked_upload = conf.enable_chunked_upload,
            authparam_mode = %conf.authparam_mode(),
            "Handoff engine initialized"
        );

        Ok(Self {
            grpc_mode: conf.grpc_mode,
            presigned_expiry_check: conf.enable_presigned_expiry_check,
            flags: ArcSwap::from_pointee(RuntimeFlags::from_config(conf)),
            verifier,
            grpc,
        })
    }

    /// Construct an engine around a caller-supplied verifier. Used by test
    /// harnesses to substitute the Authenticator.
    pub fn with_verifier(conf: &HandoffConfig, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            grpc_mode: conf.grpc_mode,
            presigned_expiry_check: conf.enable_presigned_expiry_check,
            flags: ArcSwap::from_pointee(RuntimeFlags::from_config(conf)),
            verifier,
            grpc: None,
        }
    }

    /// Allow or disallow AWS Signature Version 2.
    pub fn set_signature_v2(&self, enabled: bool) {
        info!(enabled, "set_signature_v2");
        let mut flags = **self.flags.load();
        flags.signature_v2_enabled = enabled;
        self.flags.store(Arc::new(flags));
    }

    /// Allow or disallow chunked uploads.
    pub fn set_chunked_upload(&self, enabled: bool) {
        info!(enabled, "set_chunked_upload");
        let mut flags = **self.flags.load();
        flags.chunked_upload_enabled = enabled;
        self.flags.store(Arc::new(flags));
    }

    /// Set the authorization-parameter capture mode for subsequent requests.
    pub fn set_authparam_mode(&self, mode: AuthParamMode) {
        info!(mode = %mode, "set_authparam_mode");
        let mut flags = **self.flags.load();
        flags.authparam_mode = mode;
        self.flags.store(Arc::new(flags));
    }

    /// Store fresh channel tuning. No-op on the HTTP transport.
    pub async fn set_channel_tuning(&self, tuning: ChannelTuning) {
        match &self.grpc {
            Some(grpc) => grpc.set_channel_tuning(tuning).await,
            None => warn!("channel tuning ignored: engine is not in gRPC mode"),
        }
    }

    /// Rebuild the channel for a new URI. No-op on the HTTP transport.
    pub async fn set_channel_uri(&self, uri: &str) -> Result<()> {
        match &self.grpc {
            Some(grpc) => grpc.set_channel_uri(uri).await,
            None => {
                warn!("channel URI ignored: engine is not in gRPC mode");
                Ok(())
            }
        }
    }

    /// React to a batch of changed configuration keys.
    ///
    /// Channel tuning is applied before a URI-driven rebuild so a batch that
    /// changes both ends up with a channel built from the fresh tuning.
    /// A failed runtime rebuild keeps the previous channel.
    pub async fn handle_config_change(&self, conf: &HandoffConfig, changed: &HashSet<String>) {
        let tuning_changed = [
            "handoff_grpc_arg_initial_reconnect_backoff_ms",
            "handoff_grpc_arg_max_reconnect_backoff_ms",
            "handoff_grpc_arg_min_reconnect_backoff_ms",
        ]
        .iter()
        .any(|k| changed.contains(*k));
        if tuning_changed {
            self.set_channel_tuning(ChannelTuning::from_config(conf)).await;
        }
        if changed.contains("handoff_grpc_uri") {
            if let Err(err) = self.set_channel_uri(&conf.grpc_uri).await {
                error!(uri = %conf.grpc_uri, %err, "channel rebuild failed, keeping previous channel");
            }
        }
        if changed.contains("handoff_enable_chunked_upload") {
            self.set_chunked_upload(conf.enable_chunked_upload);
        }
        if changed.contains("handoff_enable_signature_v2") {
            self.set_signature_v2(conf.enable_signature_v2);
        }
        if changed.contains("handoff_authparam_always") || changed.contains("handoff_authparam_withtoken") {
            self.set_authparam_mode(conf.authparam_mode());
        }
    }

    /// Authenticate one request via the external Authenticator.
    ///
    /// `signature` is accepted for interface parity with the REST host's
    /// authentication hook; the Authenticator reads the signature out of the
    /// normalized `Authorization` header instead.
    pub async fn authenticate(
        &self,
        session_token: Option<&str>,
        access_key_id: &str,
        string_to_sign: &[u8],
        _signature: &str,
        req: &RequestSnapshot,
        cancel: &CancellationToken,
    ) -> Verdict {
        // Runtime configuration stays fixed for the whole request.
        let flags = self.flags.load_full();

        debug!(
            trans_id = %req.transaction_id,
            access_key_id,
            session_token_present = session_token.is_some_and(|t| !t.is_empty()),
            relative_uri = %req.relative_uri,
            bucket = req.bucket_name.as_deref().unwrap_or(""),
            key_present = req.object_key.as_deref().is_some_and(|k| !k.is_empty()),
            "starting delegated authentication"
        );

        // Retrieve the Authorization header, or synthesize one from
        // presigned-URL query parameters.
        let auth = match normalize::auth_header_for_request(req) {
            Some(header) => header,
            None => {
                warn!(trans_id = %req.transaction_id, "missing Authorization header and insufficient query parameters");
                return Verdict::denied(
                    ErrorCategory::Auth,
                    S3ErrorCode::AccessDenied,
                    "Missing Authorization header and insufficient query parameters",
                );
            }
        };

        // The REST layer checks presigned expiry before ever calling us, but
        // that is its behavior to keep, not ours to assume.
        if self.presigned_expiry_check && normalize::is_presigned(req) {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            if !normalize::valid_presigned_time(req, now) {
                warn!(trans_id = %req.transaction_id, "presigned URL expiry check failed");
                return Verdict::denied(
                    ErrorCategory::Auth,
                    S3ErrorCode::AccessDenied,
                    "Presigned URL expiry check failed",
                );
            }
        }

        if !flags.signature_v2_enabled && auth.starts_with(normalize::V2_HEADER_PREFIX) {
            warn!(trans_id = %req.transaction_id, "V2 signatures are disabled, returning failure");
            return Verdict::denied(
                ErrorCategory::Auth,
                S3ErrorCode::AccessDenied,
                "Access denied (V2 signatures disabled)",
            );
        }

        // Capture authorization parameters when configuration asks for them.
        // An uncapturable request is logged and proceeds without enrichment.
        let want_params = match flags.authparam_mode {
            AuthParamMode::Always => true,
            AuthParamMode::WithToken => session_token.is_some_and(|t| !t.is_empty()),
            AuthParamMode::Never => false,
        };
        let params = if want_params {
            match AuthorizationParameters::capture(req) {
                Some(p) => {
                    debug!(trans_id = %req.transaction_id, "{p}");
                    Some(p)
                }
                None => {
                    warn!(trans_id = %req.transaction_id, "authorization parameters not available");
                    None
                }
            }
        } else {
            None
        };

        let is_chunked = req
            .env
            .get(ENV_CONTENT_SHA256)
            .is_some_and(|v| v == STREAMING_PAYLOAD_SHA256);
        if is_chunked {
            debug!(trans_id = %req.transaction_id, "chunked upload in progress");
            if !flags.chunked_upload_enabled {
                warn!(trans_id = %req.transaction_id, "chunked upload disabled - rejecting request");
                return Verdict::denied(ErrorCategory::Auth, S3ErrorCode::AccessDenied, "chunked upload is disabled");
            }
        }

        let verify_req = VerifyRequest {
            transaction_id: &req.transaction_id,
            access_key_id,
            string_to_sign,
            authorization: &auth,
            session_token,
            params: params.as_ref(),
        };
        let mut verdict = self.verifier.verify(&verify_req, cancel).await;

        match &verdict {
            Verdict::Granted(grant) => {
                info!(trans_id = %req.transaction_id, access_key_id, user_id = %grant.user_id, "authentication granted");
            }
            Verdict::Denied(denial) if denial.category == ErrorCategory::Transport => {
                error!(trans_id = %req.transaction_id, message = %denial.message, "authentication attempt failed");
            }
            Verdict::Denied(denial) => {
                info!(
                    trans_id = %req.transaction_id,
                    access_key_id,
                    code = %denial.code,
                    message = %denial.message,
                    "Authenticator returned failure"
                );
            }
        }

        if verdict.is_denied() || !is_chunked {
            return verdict;
        }

        // Chunked uploads additionally need the per-day signing key so chunk
        // signatures can be checked locally.
        match self.verifier.fetch_signing_key(&req.transaction_id, &auth, cancel).await {
            Ok(key) => {
                verdict.attach_signing_key(key);
                debug!(trans_id = %req.transaction_id, "chunked upload signing key saved");
                verdict
            }
            Err(err) => {
                error!(trans_id = %req.transaction_id, %err, "failed to fetch signing key for chunked upload");
                Verdict::denied(
                    ErrorCategory::Transport,
                    S3ErrorCode::AccessDenied,
                    "failed to fetch signing key for chunked upload",
                )
            }
        }
    }

    /// Whether the engine was constructed on the gRPC transport.
    pub fn grpc_mode(&self) -> bool {
        self.grpc_mode
    }

    #[cfg(test)]
    pub(crate) fn flags_snapshot(&self) -> RuntimeFlags {
        **self.flags.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_fails_on_bad_grpc_uri() {
        let conf = HandoffConfig {
            grpc_uri: "not a uri".to_owned(),
            ..Default::default()
        };
        assert!(HandoffEngine::new(&conf).is_err());
    }

    #[tokio::test]
    async fn construction_succeeds_with_lazy_channel() {
        let conf = HandoffConfig {
            grpc_uri: "http://127.0.0.1:1".to_owned(),
            ..Default::default()
        };
        let engine = HandoffEngine::new(&conf).unwrap();
        assert!(engine.grpc_mode());
    }

    #[tokio::test]
    async fn config_change_updates_flag_snapshot() {
        let conf = HandoffConfig {
            grpc_uri: "http://127.0.0.1:1".to_owned(),
            ..Default::default()
        };
        let engine = HandoffEngine::new(&conf).unwrap();
        assert!(engine.flags_snapshot().signature_v2_enabled);
        assert_eq!(engine.flags_snapshot().authparam_mode, AuthParamMode::Always);

        let updated = HandoffConfig {
            grpc_uri: "http://127.0.0.1:1".to_owned(),
            enable_signature_v2: false,
            authparam_always: false,
            authparam_withtoken: true,
            ..Default::default()
        };
        let changed: HashSet<String> = [
            "handoff_enable_signature_v2".to_owned(),
            "handoff_authparam_always".to_owned(),
        ]
        .into();
        engine.handle_config_change(&updated, &changed).await;

        let flags = engine.flags_snapshot();
        assert!(!flags.signature_v2_enabled);
        assert_eq!(flags.authparam_mode, AuthParamMode::WithToken);
        // Untouched keys keep their values.
        assert!(flags.chunked_upload_enabled);
    }

    #[tokio::test]
    async fn runtime_channel_rebuild_failure_is_not_fatal() {
        let conf = HandoffConfig {
            grpc_uri: "http://127.0.0.1:1".to_owned(),
            ..Default::default()
        };
        let engine = HandoffEngine::new(&conf).unwrap();

        let updated = HandoffConfig {
            grpc_uri: "☃".to_owned(),
            ..Default::default()
        };
        let changed: HashSet<String> = ["handoff_grpc_uri".to_owned()].into();
        // Must not panic; the previous channel stays in use.
        engine.handle_config_change(&updated, &changed).await;
    }
}

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

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HandoffError, Result};

/// Configuration keys whose changes the engine reacts to at runtime.
///
/// The process-wide configuration registry notifies
/// [`HandoffEngine::handle_config_change`](crate::engine::HandoffEngine::handle_config_change)
/// with the set of changed keys; anything else is boot-only.
pub const TRACKED_CONFIG_KEYS: &[&str] = &[
    "handoff_authparam_always",
    "handoff_authparam_withtoken",
    "handoff_enable_chunked_upload",
    "handoff_enable_signature_v2",
    "handoff_grpc_arg_initial_reconnect_backoff_ms",
    "handoff_grpc_arg_max_reconnect_backoff_ms",
    "handoff_grpc_arg_min_reconnect_backoff_ms",
    "handoff_grpc_uri",
];

/// When to capture authorization parameters for the Authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthParamMode {
    Never,
    WithToken,
    Always,
}

impl fmt::Display for AuthParamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthParamMode::Never => f.write_str("NEVER"),
            AuthParamMode::WithToken => f.write_str("WITHTOKEN"),
            AuthParamMode::Always => f.write_str("ALWAYS"),
        }
    }
}

/// Handoff subsystem configuration.
///
/// `grpc_mode` and `enable_presigned_expiry_check` take effect only at engine
/// construction; the rest may change at runtime through the config observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Use the gRPC transport (primary). When false, the legacy HTTP
    /// transport is used. Boot-only.
    pub grpc_mode: bool,

    /// Authenticator gRPC endpoint (e.g. http://authenticator:8002).
    pub grpc_uri: String,

    /// Reconnect backoff tuning for the gRPC channel, milliseconds.
    pub grpc_arg_initial_reconnect_backoff_ms: u64,
    pub grpc_arg_min_reconnect_backoff_ms: u64,
    pub grpc_arg_max_reconnect_backoff_ms: u64,

    /// Allow STREAMING-AWS4-HMAC-SHA256-PAYLOAD uploads. The toggle exists in
    /// case the extra signing-key RPC per upload becomes a performance
    /// problem.
    pub enable_chunked_upload: bool,

    /// Allow AWS Signature Version 2. Strongly recommended to stay enabled
    /// for broad client support.
    pub enable_signature_v2: bool,

    /// Capture authorization parameters for every request.
    pub authparam_always: bool,

    /// Capture authorization parameters when a session token is present.
    pub authparam_withtoken: bool,

    /// Check presigned-URL expiry locally before calling out. The REST layer
    /// normally rejects expired presigned requests before authentication;
    /// this is the belt-and-braces check. Boot-only.
    pub enable_presigned_expiry_check: bool,

    /// Authenticator base URI for the HTTP transport
    /// (e.g. https://authenticator:8001/).
    pub uri: String,

    /// Verify TLS certificates on the HTTP transport.
    pub verify_ssl: bool,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            grpc_mode: true,
            grpc_uri: "http://127.0.0.1:8002".to_owned(),
            grpc_arg_initial_reconnect_backoff_ms: 100,
            grpc_arg_min_reconnect_backoff_ms: 100,
            grpc_arg_max_reconnect_backoff_ms: 5000,
            enable_chunked_upload: true,
            enable_signature_v2: true,
            authparam_always: true,
            authparam_withtoken: false,
            enable_presigned_expiry_check: false,
            uri: String::new(),
            verify_ssl: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(name, raw = %raw, "unparsable configuration value, using default");
            default
        }),
        Err(_) => default,
    }
}

impl HandoffConfig {
    /// Load configuration from `HANDOFF_*` environment variables, falling
    /// back to defaults per key.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let conf = Self {
            grpc_mode: env_parse("HANDOFF_GRPC_MODE", defaults.grpc_mode),
            grpc_uri: std::env::var("HANDOFF_GRPC_URI").unwrap_or(defaults.grpc_uri),
            grpc_arg_initial_reconnect_backoff_ms: env_parse(
                "HANDOFF_GRPC_ARG_INITIAL_RECONNECT_BACKOFF_MS",
                defaults.grpc_arg_initial_reconnect_backoff_ms,
            ),
            grpc_arg_min_reconnect_backoff_ms: env_parse(
                "HANDOFF_GRPC_ARG_MIN_RECONNECT_BACKOFF_MS",
                defaults.grpc_arg_min_reconnect_backoff_ms,
            ),
            grpc_arg_max_reconnect_backoff_ms: env_parse(
                "HANDOFF_GRPC_ARG_MAX_RECONNECT_BACKOFF_MS",
                defaults.grpc_arg_max_reconnect_backoff_ms,
            ),
            enable_chunked_upload: env_parse("HANDOFF_ENABLE_CHUNKED_UPLOAD", defaults.enable_chunked_upload),
            enable_signature_v2: env_parse("HANDOFF_ENABLE_SIGNATURE_V2", defaults.enable_signature_v2),
            authparam_always: env_parse("HANDOFF_AUTHPARAM_ALWAYS", defaults.authparam_always),
            authparam_withtoken: env_parse("HANDOFF_AUTHPARAM_WITHTOKEN", defaults.authparam_withtoken),
            enable_presigned_expiry_check: env_parse(
                "HANDOFF_ENABLE_PRESIGNED_EXPIRY_CHECK",
                defaults.enable_presigned_expiry_check,
            ),
            uri: std::env::var("HANDOFF_URI").unwrap_or(defaults.uri),
            verify_ssl: env_parse("HANDOFF_VERIFY_SSL", defaults.verify_ssl),
        };
        conf.validate()?;
        Ok(conf)
    }

    /// Validate the transport selection has an endpoint to talk to.
    pub fn validate(&self) -> Result<()> {
        if self.grpc_mode && self.grpc_uri.is_empty() {
            return Err(HandoffError::Config("grpc_uri is required in gRPC mode".to_owned()));
        }
        if !self.grpc_mode && self.uri.is_empty() {
            return Err(HandoffError::Config("uri is required in HTTP mode".to_owned()));
        }
        Ok(())
    }

    /// Reduce the authparam toggle pair to a mode. `Always` dominates, then
    /// `WithToken`, else `Never`.
    pub fn authparam_mode(&self) -> AuthParamMode {
        if self.authparam_always {
            AuthParamMode::Always
        } else if self.authparam_withtoken {
            AuthParamMode::WithToken
        } else {
            AuthParamMode::Never
        }
    }
}

/// The runtime-alterable toggles, frozen into an immutable snapshot.
///
/// The engine publishes a snapshot through an `ArcSwap`; each request loads
/// it once and sees a consistent view for its whole lifetime, however many
/// observer updates land meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFlags {
    pub signature_v2_enabled: bool,
    pub chunked_upload_enabled: bool,
    pub authparam_mode: AuthParamMode,
}

impl RuntimeFlags {
    pub fn from_config(conf: &HandoffConfig) -> Self {
        Self {
            signature_v2_enabled: conf.enable_signature_v2,
            chunked_upload_enabled: conf.enable_chunked_upload,
            authparam_mode: conf.authparam_mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let conf = HandoffConfig::default();
        assert!(conf.grpc_mode);
        assert!(conf.enable_signature_v2);
        assert!(conf.enable_chunked_upload);
        assert!(!conf.enable_presigned_expiry_check);
        assert!(conf.verify_ssl);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn authparam_mode_precedence() {
        let mut conf = HandoffConfig {
            authparam_always: true,
            authparam_withtoken: true,
            ..Default::default()
        };
        assert_eq!(conf.authparam_mode(), AuthParamMode::Always);

        conf.authparam_always = false;
        assert_eq!(conf.authparam_mode(), AuthParamMode::WithToken);

        conf.authparam_withtoken = false;
        assert_eq!(conf.authparam_mode(), AuthParamMode::Never);
    }

    #[test]
    fn validate_requires_an_endpoint() {
        let conf = HandoffConfig {
            grpc_uri: String::new(),
            ..Default::default()
        };
        assert!(conf.validate().is_err());

        let conf = HandoffConfig {
            grpc_mode: false,
            uri: String::new(),
            ..Default::default()
        };
        assert!(conf.validate().is_err());

        let conf = HandoffConfig {
            grpc_mode: false,
            uri: "http://127.0.0.1:8001".to_owned(),
            ..Default::default()
        };
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn flags_snapshot_from_config() {
        let conf = HandoffConfig {
            enable_signature_v2: false,
            authparam_always: false,
            authparam_withtoken: true,
            ..Default::default()
        };
        let flags = RuntimeFlags::from_config(&conf);
        assert!(!flags.signature_v2_enabled);
        assert!(flags.chunked_upload_enabled);
        assert_eq!(flags.authparam_mode, AuthParamMode::WithToken);
    }
}

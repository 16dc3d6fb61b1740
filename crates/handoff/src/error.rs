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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandoffError>;

/// Handoff subsystem errors
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The outbound call to the Authenticator failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The Authenticator declined or could not supply a signing key
    #[error("Signing key unavailable: {0}")]
    SigningKey(String),

    /// Response parsing failure or invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// S3 error codes surfaced to the REST layer.
///
/// This is the subset of the gateway's S3 error taxonomy that delegated
/// authentication can produce. The REST layer renders the matching HTTP
/// response; this subsystem only selects the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3ErrorCode {
    AccessDenied,
    InvalidRequest,
    InvalidArgument,
    InternalError,
    InvalidAccessKeyId,
    InvalidIdentityToken,
    MethodNotAllowed,
    RequestTimeTooSkewed,
    SignatureDoesNotMatch,
    NotFound,
}

impl S3ErrorCode {
    /// The HTTP status the REST layer renders for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            S3ErrorCode::AccessDenied => 403,
            S3ErrorCode::InvalidRequest => 400,
            S3ErrorCode::InvalidArgument => 400,
            S3ErrorCode::InternalError => 500,
            S3ErrorCode::InvalidAccessKeyId => 403,
            S3ErrorCode::InvalidIdentityToken => 400,
            S3ErrorCode::MethodNotAllowed => 405,
            S3ErrorCode::RequestTimeTooSkewed => 403,
            S3ErrorCode::SignatureDoesNotMatch => 403,
            S3ErrorCode::NotFound => 404,
        }
    }

    /// The wire form of the code, as it appears in an S3 error document.
    pub fn as_str(&self) -> &'static str {
        match self {
            S3ErrorCode::AccessDenied => "AccessDenied",
            S3ErrorCode::InvalidRequest => "InvalidRequest",
            S3ErrorCode::InvalidArgument => "InvalidArgument",
            S3ErrorCode::InternalError => "InternalError",
            S3ErrorCode::InvalidAccessKeyId => "InvalidAccessKeyId",
            S3ErrorCode::InvalidIdentityToken => "InvalidIdentityToken",
            S3ErrorCode::MethodNotAllowed => "MethodNotAllowed",
            S3ErrorCode::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            S3ErrorCode::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            S3ErrorCode::NotFound => "NotFound",
        }
    }
}

impl std::fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(S3ErrorCode::AccessDenied.http_status(), 403);
        assert_eq!(S3ErrorCode::SignatureDoesNotMatch.http_status(), 403);
        assert_eq!(S3ErrorCode::InvalidRequest.http_status(), 400);
        assert_eq!(S3ErrorCode::MethodNotAllowed.http_status(), 405);
        assert_eq!(S3ErrorCode::NotFound.http_status(), 404);
        assert_eq!(S3ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn wire_form() {
        assert_eq!(S3ErrorCode::SignatureDoesNotMatch.as_str(), "SignatureDoesNotMatch");
        assert_eq!(S3ErrorCode::InvalidAccessKeyId.to_string(), "InvalidAccessKeyId");
    }
}

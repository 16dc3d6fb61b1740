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

use handoff_protos::authenticator::v1::s3_error_details::Type as AuthErrorType;

use crate::error::S3ErrorCode;
use crate::verdict::{Denial, ErrorCategory};

/// Map an Authenticator error onto a gateway S3 error code.
///
/// The Authenticator names its denial in `S3ErrorDetails.type`; the gateway
/// speaks its own S3 error taxonomy. Where no direct mapping exists we fall
/// back on the HTTP status the Authenticator asked for, and failing that on
/// access-denied. The Authenticator's message is carried verbatim.
///
/// Pure function: equal inputs always produce equal denials.
pub fn translate_authenticator_error(
    auth_type: AuthErrorType,
    auth_http_status_code: i32,
    message: &str,
) -> Denial {
    let code = match auth_type {
        AuthErrorType::AccessDenied => Some(S3ErrorCode::AccessDenied),
        AuthErrorType::AuthorizationHeaderMalformed => Some(S3ErrorCode::InvalidRequest),
        AuthErrorType::ExpiredToken => Some(S3ErrorCode::AccessDenied),
        AuthErrorType::InternalError => Some(S3ErrorCode::InternalError),
        AuthErrorType::InvalidAccessKeyId => Some(S3ErrorCode::InvalidAccessKeyId),
        AuthErrorType::InvalidRequest => Some(S3ErrorCode::InvalidArgument),
        AuthErrorType::InvalidSecurity => Some(S3ErrorCode::InvalidArgument),
        AuthErrorType::InvalidToken => Some(S3ErrorCode::InvalidIdentityToken),
        AuthErrorType::InvalidUri => Some(S3ErrorCode::InvalidRequest),
        AuthErrorType::MethodNotAllowed => Some(S3ErrorCode::MethodNotAllowed),
        AuthErrorType::MissingSecurityHeader => Some(S3ErrorCode::InvalidRequest),
        AuthErrorType::RequestTimeTooSkewed => Some(S3ErrorCode::RequestTimeTooSkewed),
        AuthErrorType::SignatureDoesNotMatch => Some(S3ErrorCode::SignatureDoesNotMatch),
        AuthErrorType::TokenRefreshRequired => Some(S3ErrorCode::InvalidRequest),
        AuthErrorType::Unspecified => None,
    };

    // No direct mapping: honour the HTTP status the Authenticator wants
    // returned. Far from perfect, but strictly better than a blanket 403.
    let code = code.unwrap_or(match auth_http_status_code {
        400 => S3ErrorCode::InvalidArgument,
        404 => S3ErrorCode::NotFound,
        _ => S3ErrorCode::AccessDenied,
    });

    Denial {
        category: ErrorCategory::Auth,
        code,
        message: message.to_owned(),
    }
}

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

//! Wire protocol for the external Authenticator service.
//!
//! The generated message and client code is committed under `src/generated`;
//! `src/authenticator.proto` is the source of truth for regeneration.

mod generated;

pub use generated::*;

use prost::Message;

use crate::authenticator::v1::S3ErrorDetails;

/// `type_url` suffix identifying an [`S3ErrorDetails`] payload inside a
/// `google.protobuf.Any`.
pub const S3_ERROR_DETAILS_TYPE: &str = "authenticator.v1.S3ErrorDetails";

/// Extract an [`S3ErrorDetails`] payload from a failed gRPC status, if one is
/// present.
///
/// The Authenticator reports failures through the gRPC richer error model: the
/// `grpc-status-details-bin` metadata carries a serialized `google.rpc.Status`
/// whose `details` list may contain an `S3ErrorDetails` message. `Ok(None)`
/// means the status carried no details, or none of them unpacked to an
/// `S3ErrorDetails`; `Err` means the `google.rpc.Status` itself failed to
/// decode — callers treat those differently (transport versus internal
/// failure).
pub fn s3_error_details_from_status(
    status: &tonic::Status,
) -> Result<Option<S3ErrorDetails>, prost::DecodeError> {
    let raw = status.details();
    if raw.is_empty() {
        return Ok(None);
    }
    let rpc_status = google::rpc::Status::decode(raw)?;
    for detail in &rpc_status.details {
        if detail.type_url.ends_with(S3_ERROR_DETAILS_TYPE) {
            if let Ok(details) = S3ErrorDetails::decode(detail.value.as_slice()) {
                return Ok(Some(details));
            }
        }
    }
    Ok(None)
}

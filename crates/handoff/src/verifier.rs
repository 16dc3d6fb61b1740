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

use tokio_util::sync::CancellationToken;

use crate::authparams::AuthorizationParameters;
use crate::error::Result;
use crate::verdict::Verdict;

/// The signing inputs presented to the Authenticator for one request.
///
/// The gateway never holds a secret; these are exactly the canonicalized
/// inputs the Authenticator needs to check the client's signature against the
/// vaulted key.
#[derive(Debug, Clone, Copy)]
pub struct VerifyRequest<'a> {
    pub transaction_id: &'a str,
    pub access_key_id: &'a str,
    /// The canonical string-to-sign, opaque bytes computed by the REST layer.
    pub string_to_sign: &'a [u8],
    /// The normalized `Authorization` header, inbound or synthesized.
    pub authorization: &'a str,
    pub session_token: Option<&'a str>,
    /// Enriched request context, when capture policy produced one.
    pub params: Option<&'a AuthorizationParameters>,
}

/// Transport-independent capability over the Authenticator service.
///
/// Two implementations exist: the gRPC client (primary) and the legacy HTTP
/// client. The engine is written against this trait only; tests substitute
/// their own implementation.
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    /// Present one request's signing inputs and obtain a verdict.
    ///
    /// Transport failures are folded into the verdict as access denials with
    /// a transport classification; this call does not error.
    async fn verify(&self, req: &VerifyRequest<'_>, cancel: &CancellationToken) -> Verdict;

    /// Fetch the per-day HMAC signing key for a chunked upload.
    ///
    /// The key is bound to the UTC date of issue and must not be cached
    /// beyond the request it was fetched for.
    async fn fetch_signing_key(
        &self,
        transaction_id: &str,
        authorization: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>;
}

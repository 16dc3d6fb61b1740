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

//! Delegated S3 signature authentication.
//!
//! The gateway never stores secret keys. Instead, the signing inputs of every
//! inbound request (the canonical string-to-sign, the access key id and the
//! `Authorization` header, inbound or synthesized from a presigned URL) are
//! forwarded to an external Authenticator service, which alone holds the
//! secrets and returns a typed verdict.
//!
//! # Example
//!
//! ```no_run
//! use handoff::{HandoffConfig, HandoffEngine, RequestSnapshot};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conf = HandoffConfig::from_env()?;
//! let engine = HandoffEngine::new(&conf)?;
//!
//! let mut snapshot = RequestSnapshot {
//!     transaction_id: "tx-0001".to_owned(),
//!     method: "GET".to_owned(),
//!     relative_uri: "/bucket/key".to_owned(),
//!     ..Default::default()
//! };
//! snapshot.env.set_header("Authorization", "AWS AKID:signature");
//!
//! let verdict = engine
//!     .authenticate(None, "AKID", b"...string to sign...", "signature", &snapshot, &CancellationToken::new())
//!     .await;
//! match verdict.user_id() {
//!     Some(uid) => println!("authenticated as {uid}"),
//!     None => println!("denied"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod authparams;
pub mod config;
pub mod engine;
pub mod error;
pub mod grpc;
pub mod http;
pub mod normalize;
pub mod request;
pub mod translate;
pub mod verdict;
pub mod verifier;

pub use authparams::AuthorizationParameters;
pub use config::{AuthParamMode, HandoffConfig, RuntimeFlags, TRACKED_CONFIG_KEYS};
pub use engine::{HandoffEngine, STREAMING_PAYLOAD_SHA256};
pub use error::{HandoffError, Result, S3ErrorCode};
pub use grpc::{ChannelTuning, GrpcVerifier};
pub use http::HttpVerifier;
pub use request::{RequestEnv, RequestSnapshot};
pub use translate::translate_authenticator_error;
pub use verdict::{Denial, ErrorCategory, Grant, Verdict};
pub use verifier::{Verifier, VerifyRequest};

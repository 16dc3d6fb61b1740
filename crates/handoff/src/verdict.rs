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

use crate::error::S3ErrorCode;

/// Classification of a denial, used for log severity and operational triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The Authenticator call itself failed or returned uninterpretable details.
    Transport,
    /// The Authenticator gave a structured verdict denying the request.
    Auth,
    /// Response parsing failure or invariant violation.
    Internal,
}

/// A successful authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Grant {
    /// The gateway user id associated with the access key.
    pub user_id: String,
    /// Human-readable message from the Authenticator. May be empty.
    pub message: String,
    /// Per-day HMAC signing key, present only for chunked uploads.
    pub signing_key: Option<Vec<u8>>,
}

// Key material must never leak through Debug formatting into logs.
impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grant")
            .field("user_id", &self.user_id)
            .field("message", &self.message)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A denied authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub category: ErrorCategory,
    pub code: S3ErrorCode,
    pub message: String,
}

/// The typed result of one delegated authentication.
///
/// Callers pattern-match, or use the total accessors; there is no way to read
/// a user id out of a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Granted(Grant),
    Denied(Denial),
}

impl Verdict {
    pub fn granted(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Verdict::Granted(Grant {
            user_id: user_id.into(),
            message: message.into(),
            signing_key: None,
        })
    }

    pub fn denied(category: ErrorCategory, code: S3ErrorCode, message: impl Into<String>) -> Self {
        Verdict::Denied(Denial {
            category,
            code,
            message: message.into(),
        })
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Denied(_))
    }

    /// The authenticated user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Verdict::Granted(g) => Some(&g.user_id),
            Verdict::Denied(_) => None,
        }
    }

    /// The signing key attached to a granted chunked-upload verdict.
    pub fn signing_key(&self) -> Option<&[u8]> {
        match self {
            Verdict::Granted(g) => g.signing_key.as_deref(),
            Verdict::Denied(_) => None,
        }
    }

    /// The S3 error code of a denial.
    pub fn error_code(&self) -> Option<S3ErrorCode> {
        match self {
            Verdict::Granted(_) => None,
            Verdict::Denied(d) => Some(d.code),
        }
    }

    /// The Authenticator's message, whatever the outcome.
    pub fn message(&self) -> &str {
        match self {
            Verdict::Granted(g) => &g.message,
            Verdict::Denied(d) => &d.message,
        }
    }

    /// Attach a signing key to a granted verdict. No-op on a denial.
    pub(crate) fn attach_signing_key(&mut self, key: Vec<u8>) {
        if let Verdict::Granted(g) = self {
            g.signing_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_total() {
        let ok = Verdict::granted("testid", "OK");
        assert!(ok.is_granted());
        assert_eq!(ok.user_id(), Some("testid"));
        assert_eq!(ok.error_code(), None);
        assert_eq!(ok.signing_key(), None);

        let err = Verdict::denied(ErrorCategory::Auth, S3ErrorCode::SignatureDoesNotMatch, "mismatch");
        assert!(err.is_denied());
        assert_eq!(err.user_id(), None);
        assert_eq!(err.error_code(), Some(S3ErrorCode::SignatureDoesNotMatch));
        assert_eq!(err.message(), "mismatch");
    }

    #[test]
    fn signing_key_only_sticks_to_grants() {
        let mut ok = Verdict::granted("testid", "");
        ok.attach_signing_key(vec![0u8; 32]);
        assert_eq!(ok.signing_key().map(<[u8]>::len), Some(32));

        let mut err = Verdict::denied(ErrorCategory::Transport, S3ErrorCode::AccessDenied, "down");
        err.attach_signing_key(vec![0u8; 32]);
        assert_eq!(err.signing_key(), None);
    }

    #[test]
    fn debug_redacts_key_material() {
        let mut ok = Verdict::granted("testid", "");
        ok.attach_signing_key(vec![0xAB; 32]);
        let rendered = format!("{ok:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("171")); // 0xAB
    }
}

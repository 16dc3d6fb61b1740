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

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::request::RequestSnapshot;

/// Environment-key prefix selecting the headers forwarded to the Authenticator.
const AMZ_HEADER_ENV_PREFIX: &str = "HTTP_X_AMZ_";

/// Gathered information about an in-flight request, sent to the Authenticator
/// for authorization-enhanced verification.
///
/// Normally these data are gathered later in the request and subject to
/// internal policies and ACLs; the Authenticator gets to see them early.
/// Nothing here has been validated beyond URL decoding, so the capture is
/// treated as untrusted hints, never as routing input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationParameters {
    method: String,
    bucket_name: String,
    object_key_name: String,
    http_headers: HashMap<String, String>,
    http_request_path: String,
    http_query_params: HashMap<String, String>,
}

impl AuthorizationParameters {
    /// Capture the enriched context from a request.
    ///
    /// Returns `None` when the request is not well-formed enough to be used
    /// (missing method, or a relative URI that does not begin with `/`). A
    /// bare `/` request is a valid capture that simply has no bucket or key;
    /// `s3cmd ls` with no arguments produces exactly that.
    pub fn capture(req: &RequestSnapshot) -> Option<Self> {
        if req.method.is_empty() {
            warn!("Invalid request method");
            return None;
        }

        // Bucket and key come from the path element only, never the query.
        let path = req.request_path().to_owned();
        let remainder = match path.strip_prefix('/') {
            Some(rest) => rest.to_owned(),
            None => {
                warn!("Invalid relative_uri string");
                return None;
            }
        };

        // Headers are uppercased with underscores in the environment; undo
        // that transformation for the wire form the Authenticator expects.
        let mut http_headers = HashMap::new();
        for (key, value) in req.env.iter() {
            if let Some(rest) = key.strip_prefix("HTTP_") {
                if key.starts_with(AMZ_HEADER_ENV_PREFIX) {
                    http_headers.insert(rest.replace('_', "-").to_lowercase(), value.to_owned());
                }
            }
        }

        let http_query_params = req.query_params.clone();

        // The first path element is the bucket name even for virtual-host
        // style URLs; the REST preprocessor has already prepended the bucket
        // for those.
        let (bucket_name, object_key_name) = match remainder.find('/') {
            Some(pos) => (remainder[..pos].to_owned(), remainder[pos + 1..].to_owned()),
            None => (remainder.to_owned(), String::new()),
        };

        Some(Self {
            method: req.method.clone(),
            bucket_name,
            object_key_name,
            http_headers,
            http_request_path: path,
            http_query_params,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// The object key. May legitimately be empty.
    pub fn object_key_name(&self) -> &str {
        &self.object_key_name
    }

    /// Forwarded `x-amz-*` headers, lowercased hyphenated names.
    pub fn http_headers(&self) -> &HashMap<String, String> {
        &self.http_headers
    }

    pub fn http_request_path(&self) -> &str {
        &self.http_request_path
    }

    pub fn http_query_params(&self) -> &HashMap<String, String> {
        &self.http_query_params
    }
}

// The object key is deliberately not printed: it can be large, full of
// unprintable characters, or private.
impl fmt::Display for AuthorizationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_map = |m: &HashMap<String, String>| {
            if m.is_empty() {
                return "none".to_owned();
            }
            let mut entries: Vec<String> = m.iter().map(|(k, v)| format!("{k}={v}")).collect();
            entries.sort();
            format!("[{}]", entries.join(","))
        };
        write!(
            f,
            "AuthorizationParameters(method={},bucket={},key_present={},request_path={},http_headers={},query_param={})",
            self.method,
            self.bucket_name,
            if self.object_key_name.is_empty() { "false" } else { "true" },
            self.http_request_path,
            fmt_map(&self.http_headers),
            fmt_map(&self.http_query_params),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, uri: &str) -> RequestSnapshot {
        RequestSnapshot {
            transaction_id: "tx-authparams".to_owned(),
            method: method.to_owned(),
            relative_uri: uri.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn bucket_and_key_split() {
        let p = AuthorizationParameters::capture(&request("GET", "/testnv/rand")).unwrap();
        assert_eq!(p.bucket_name(), "testnv");
        assert_eq!(p.object_key_name(), "rand");
        assert_eq!(p.http_request_path(), "/testnv/rand");
    }

    #[test]
    fn bucket_only_without_trailing_slash() {
        let p = AuthorizationParameters::capture(&request("GET", "/testnv")).unwrap();
        assert_eq!(p.bucket_name(), "testnv");
        assert_eq!(p.object_key_name(), "");
    }

    #[test]
    fn bucket_with_trailing_slash_has_empty_key() {
        let p = AuthorizationParameters::capture(&request("GET", "/testnv/")).unwrap();
        assert_eq!(p.bucket_name(), "testnv");
        assert_eq!(p.object_key_name(), "");
    }

    #[test]
    fn double_slash_key_keeps_leading_slash() {
        let p = AuthorizationParameters::capture(&request("GET", "/testnv//rand")).unwrap();
        assert_eq!(p.bucket_name(), "testnv");
        assert_eq!(p.object_key_name(), "/rand");
    }

    #[test]
    fn bare_root_is_valid_but_empty() {
        let p = AuthorizationParameters::capture(&request("GET", "/")).unwrap();
        assert_eq!(p.bucket_name(), "");
        assert_eq!(p.object_key_name(), "");
    }

    #[test]
    fn missing_method_is_unusable() {
        assert!(AuthorizationParameters::capture(&request("", "/testnv")).is_none());
    }

    #[test]
    fn relative_uri_must_start_with_slash() {
        assert!(AuthorizationParameters::capture(&request("GET", "testnv/rand")).is_none());
    }

    #[test]
    fn amz_headers_are_renamed_and_filtered() {
        let mut req = request("PUT", "/testnv/rand");
        req.env.set("HTTP_X_AMZ_CONTENT_SHA256", "UNSIGNED-PAYLOAD");
        req.env.set("HTTP_X_AMZ_DATE", "20231012T083736Z");
        req.env.set("HTTP_HOST", "s3.example.com");
        req.env.set("HTTP_AUTHORIZATION", "AWS foo:bar");

        let p = AuthorizationParameters::capture(&req).unwrap();
        assert_eq!(
            p.http_headers().get("x-amz-content-sha256").map(String::as_str),
            Some("UNSIGNED-PAYLOAD")
        );
        assert_eq!(p.http_headers().get("x-amz-date").map(String::as_str), Some("20231012T083736Z"));
        assert_eq!(p.http_headers().len(), 2);
    }

    #[test]
    fn query_params_copied_verbatim() {
        let mut req = request("GET", "/testnv/rand?versions");
        req.query_params.insert("versions".to_owned(), String::new());
        let p = AuthorizationParameters::capture(&req).unwrap();
        assert!(p.http_query_params().contains_key("versions"));
        assert_eq!(p.http_request_path(), "/testnv/rand");
    }

    #[test]
    fn display_omits_object_key() {
        let p = AuthorizationParameters::capture(&request("GET", "/testnv/secret-key-name")).unwrap();
        let rendered = p.to_string();
        assert!(rendered.contains("key_present=true"));
        assert!(!rendered.contains("secret-key-name"));
    }
}

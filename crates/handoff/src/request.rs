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

/// CGI-style request environment as supplied by the REST host.
///
/// Header names are uppercased, hyphens replaced with underscores, and
/// prefixed with `HTTP_` (so `Authorization` appears as `HTTP_AUTHORIZATION`).
#[derive(Debug, Clone, Default)]
pub struct RequestEnv {
    map: HashMap<String, String>,
}

impl RequestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw environment entry under its already-canonical key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Store a header under its canonical `HTTP_*` environment key.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let key = format!("HTTP_{}", name.to_uppercase().replace('-', "_"));
        self.map.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The read-only inputs required to authenticate one request.
///
/// Built by the REST host before dispatching into the engine; nothing in this
/// subsystem mutates it.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    /// Per-request identifier, propagated to the Authenticator and into every
    /// log line for correlation.
    pub transaction_id: String,
    /// The HTTP method, verbatim ("GET", "PUT", ...).
    pub method: String,
    /// Decoded request path, beginning with `/`. The query string has already
    /// been split off into `query_params`.
    pub relative_uri: String,
    /// Parsed query parameters. Parameter names beginning `X-Amz` arrive
    /// lowercased from the REST layer.
    pub query_params: HashMap<String, String>,
    /// Request environment (headers in `HTTP_*` form).
    pub env: RequestEnv,
    /// Bucket name decoded by the REST router, when the route has one.
    pub bucket_name: Option<String>,
    /// Object key decoded by the REST router, when the route has one.
    pub object_key: Option<String>,
}

impl RequestSnapshot {
    /// The request URI up to (but excluding) any `?`.
    pub fn request_path(&self) -> &str {
        match self.relative_uri.find('?') {
            Some(pos) => &self.relative_uri[..pos],
            None => &self.relative_uri,
        }
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_canonicalization() {
        let mut env = RequestEnv::new();
        env.set_header("X-Amz-Content-SHA256", "UNSIGNED-PAYLOAD");
        assert_eq!(env.get("HTTP_X_AMZ_CONTENT_SHA256"), Some("UNSIGNED-PAYLOAD"));
    }

    #[test]
    fn request_path_strips_query() {
        let snap = RequestSnapshot {
            relative_uri: "/bucket/key?acl".to_owned(),
            ..Default::default()
        };
        assert_eq!(snap.request_path(), "/bucket/key");

        let snap = RequestSnapshot {
            relative_uri: "/bucket/key".to_owned(),
            ..Default::default()
        };
        assert_eq!(snap.request_path(), "/bucket/key");
    }
}

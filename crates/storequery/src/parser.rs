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

//! `x-rgw-storequery` header grammar.
//!
//! Space-separated tokens; double-quoted tokens preserve spaces and `\"`
//! denotes a literal quote. The first token is the command name (matched
//! case-insensitively), the rest are parameters with case preserved.

use tracing::warn;

use crate::error::{Result, StoreQueryError};

/// Name of the HTTP header that triggers the side-channel.
pub const STOREQUERY_HEADER: &str = "x-rgw-storequery";

/// The longest supported value for the header.
pub const MAX_HEADER_LENGTH: usize = 2048;

/// Which REST handler received the request. Restricts the accepted commands:
/// an object-level query is meaningless on a service-level route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerScope {
    Service,
    Bucket,
    Object,
}

/// A parsed side-channel command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreQueryOp {
    /// Echo a caller-chosen request id. Accepted in any scope.
    Ping { request_id: String },
    /// Report the presence of the addressed object. Object scope only.
    ObjectStatus,
}

impl StoreQueryOp {
    pub fn name(&self) -> &'static str {
        match self {
            StoreQueryOp::Ping { .. } => "storequery_ping",
            StoreQueryOp::ObjectStatus => "storequery_objectstatus",
        }
    }
}

/// Stateful parser for the header value.
///
/// `tokenize` is public so the grammar can be tested on its own; `parse` runs
/// the full validation (length, character set, command dispatch).
#[derive(Debug, Default)]
pub struct HeaderParser {
    command: String,
    params: Vec<String>,
    op: Option<StoreQueryOp>,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.command.clear();
        self.params.clear();
        self.op = None;
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn op(&self) -> Option<&StoreQueryOp> {
        self.op.as_ref()
    }

    /// Split the header value into a command and parameters.
    ///
    /// Returns false on an empty value or an unterminated quote.
    pub fn tokenize(&mut self, input: &str) -> bool {
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => in_quotes = !in_quotes,
                ' ' if !in_quotes => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                other => current.push(other),
            }
        }
        if in_quotes {
            warn!("unterminated quote in storequery header");
            return false;
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        if tokens.is_empty() {
            return false;
        }

        self.command = tokens.remove(0).to_lowercase();
        self.params = tokens;
        true
    }

    /// Parse and validate the header value for the given scope.
    ///
    /// On success `op()` returns the command to execute. On failure the
    /// parser is left with no op and the caller must abort the request; a
    /// present-but-broken side-channel header never falls through to normal
    /// S3 processing.
    pub fn parse(&mut self, input: &str, scope: HandlerScope) -> bool {
        self.op = None;
        if input.is_empty() {
            warn!("empty storequery header");
            return false;
        }
        if input.len() > MAX_HEADER_LENGTH {
            warn!(length = input.len(), "storequery header too long");
            return false;
        }
        // Printable ASCII-7 only, codes 32..=126.
        if !input.chars().all(|c| (' '..='\x7e').contains(&c)) {
            warn!("storequery header contains non-printable characters");
            return false;
        }
        if !self.tokenize(input) {
            return false;
        }

        self.op = match self.command.as_str() {
            "ping" => {
                if self.params.len() != 1 {
                    warn!(params = self.params.len(), "ping expects exactly one parameter");
                    return false;
                }
                Some(StoreQueryOp::Ping {
                    request_id: self.params[0].clone(),
                })
            }
            "objectstatus" => {
                if !self.params.is_empty() {
                    warn!(params = self.params.len(), "objectstatus expects no parameters");
                    return false;
                }
                if scope != HandlerScope::Object {
                    warn!(?scope, "objectstatus is only valid on an object handler");
                    return false;
                }
                Some(StoreQueryOp::ObjectStatus)
            }
            other => {
                warn!(command = other, "unknown storequery command");
                return false;
            }
        };
        true
    }
}

/// Parse the header value, treating any failure as the terminal
/// [`StoreQueryError::BadHeader`].
pub fn parse_header(input: &str, scope: HandlerScope) -> Result<StoreQueryOp> {
    let mut parser = HeaderParser::new();
    if !parser.parse(input, scope) {
        return Err(StoreQueryError::BadHeader);
    }
    // parse() always sets the op on success.
    parser.op.ok_or(StoreQueryError::BadHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fails() {
        let mut p = HeaderParser::new();
        assert!(!p.parse("", HandlerScope::Service));
    }

    #[test]
    fn oversized_fails_boundary_exact() {
        let mut p = HeaderParser::new();
        // "ping " plus a 2043-character id: exactly 2048 bytes, accepted.
        let exact = format!("ping {}", "a".repeat(MAX_HEADER_LENGTH - 5));
        assert_eq!(exact.len(), MAX_HEADER_LENGTH);
        assert!(p.parse(&exact, HandlerScope::Service));

        // One more byte is rejected.
        p.reset();
        let over = format!("ping {}", "a".repeat(MAX_HEADER_LENGTH - 4));
        assert_eq!(over.len(), MAX_HEADER_LENGTH + 1);
        assert!(!p.parse(&over, HandlerScope::Service));
    }

    #[test]
    fn unknown_command_fails() {
        let mut p = HeaderParser::new();
        assert!(!p.parse("nope", HandlerScope::Service));
    }

    #[test]
    fn bogus_characters_fail() {
        let mut p = HeaderParser::new();
        // Control character.
        assert!(!p.parse("ping\u{7}", HandlerScope::Service));
        // Above ASCII-7.
        p.reset();
        assert!(!p.parse("ping\u{ff}", HandlerScope::Service));
    }

    #[test]
    fn tokenizer_splits_on_spaces() {
        let mut p = HeaderParser::new();
        assert!(p.tokenize("one two three"));
        assert_eq!(p.command(), "one");
        assert_eq!(p.params(), ["two", "three"]);
    }

    #[test]
    fn tokenizer_preserves_quoted_spaces() {
        let mut p = HeaderParser::new();
        assert!(p.tokenize(r#"one "two, two-and-a-half" three"#));
        assert_eq!(p.command(), "one");
        assert_eq!(p.params(), ["two, two-and-a-half", "three"]);
    }

    #[test]
    fn tokenizer_unescapes_quotes_in_quoted_token() {
        let mut p = HeaderParser::new();
        assert!(p.tokenize(r#"one "two\"" three"#));
        assert_eq!(p.command(), "one");
        assert_eq!(p.params(), ["two\"", "three"]);
    }

    #[test]
    fn tokenizer_unescapes_quotes_in_bare_token() {
        let mut p = HeaderParser::new();
        assert!(p.tokenize(r#"one "two" th\"ree"#));
        assert_eq!(p.command(), "one");
        assert_eq!(p.params(), ["two", "th\"ree"]);
    }

    #[test]
    fn tokenizer_rejects_unterminated_quote() {
        let mut p = HeaderParser::new();
        assert!(!p.tokenize(r#"one "two"#));
    }

    #[test]
    fn ping_parses_in_any_scope() {
        for scope in [HandlerScope::Service, HandlerScope::Bucket, HandlerScope::Object] {
            let mut p = HeaderParser::new();
            assert!(p.parse("Ping foo", scope));
            assert_eq!(p.command(), "ping");
            assert_eq!(p.params(), ["foo"]);
            let op = p.op().unwrap();
            assert_eq!(op.name(), "storequery_ping");
            assert_eq!(op, &StoreQueryOp::Ping { request_id: "foo".to_owned() });
        }
    }

    #[test]
    fn ping_arity_is_exactly_one() {
        let mut p = HeaderParser::new();
        assert!(!p.parse("ping", HandlerScope::Service));
        p.reset();
        assert!(!p.parse("ping foo bar", HandlerScope::Service));
    }

    #[test]
    fn objectstatus_parses_in_object_scope_only() {
        let mut p = HeaderParser::new();
        assert!(p.parse("ObjectStatus", HandlerScope::Object));
        assert_eq!(p.command(), "objectstatus");
        assert!(p.params().is_empty());
        assert_eq!(p.op().unwrap().name(), "storequery_objectstatus");

        p.reset();
        assert!(!p.parse("objectstatus foo", HandlerScope::Object));
        p.reset();
        assert!(!p.parse("objectstatus", HandlerScope::Service));
        p.reset();
        assert!(!p.parse("objectstatus", HandlerScope::Bucket));
    }

    #[test]
    fn parse_header_maps_failures_to_bad_header() {
        assert_eq!(
            parse_header("nope", HandlerScope::Service),
            Err(StoreQueryError::BadHeader)
        );
        assert_eq!(
            parse_header("ping foo", HandlerScope::Bucket),
            Ok(StoreQueryOp::Ping { request_id: "foo".to_owned() })
        );
    }
}

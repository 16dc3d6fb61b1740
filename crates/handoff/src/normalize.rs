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

//! Signature input normalization.
//!
//! Every request must end up with exactly one `Authorization` header value,
//! whether the client sent one or encoded the same information in presigned
//! URL query parameters. The v2 presigned form is produced by `s3cmd signurl`
//! and `aws s3 presign` without a region; the v4 form appears once a
//! non-default region is requested.

use time::PrimitiveDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::request::RequestSnapshot;

/// Environment key carrying the inbound `Authorization` header.
const ENV_AUTHORIZATION: &str = "HTTP_AUTHORIZATION";

/// Prefix distinguishing an AWS Signature Version 2 header.
pub const V2_HEADER_PREFIX: &str = "AWS ";

/// Produce the normalized `Authorization` header for a request: the inbound
/// header verbatim when present, otherwise one synthesized from presigned-URL
/// query parameters. `None` means the request carries no usable credential.
pub fn auth_header_for_request(req: &RequestSnapshot) -> Option<String> {
    if let Some(header) = req.env.get(ENV_AUTHORIZATION) {
        return Some(header.to_owned());
    }
    let header = synthesize_auth_header(req)?;
    debug!("synthesized Authorization header");
    Some(header)
}

/// True when the header was not sent inbound and would have to be synthesized.
pub(crate) fn is_presigned(req: &RequestSnapshot) -> bool {
    req.env.get(ENV_AUTHORIZATION).is_none()
}

/// Construct an `Authorization` header from presigned-URL query parameters.
///
/// Distinguishes the v2 form (an `AWSAccessKeyId` parameter) from the v4 form
/// (an `x-amz-credential` parameter; parameter names starting with `X-Amz`
/// reach us lowercased) and delegates to the version-specific synthesis.
pub fn synthesize_auth_header(req: &RequestSnapshot) -> Option<String> {
    if req.query_params.contains_key("AWSAccessKeyId") {
        return synthesize_v2_header(req);
    }
    if req.query_params.contains_key("x-amz-credential") {
        return synthesize_v4_header(req);
    }
    None
}

/// The v2 header is simply `AWS <accesskeyid>:<signature>`; everything else
/// the Authenticator needs arrives in the string-to-sign.
fn synthesize_v2_header(req: &RequestSnapshot) -> Option<String> {
    let credential = req.query_param("AWSAccessKeyId");
    if credential.is_none() {
        warn!("Missing AWSAccessKeyId parameter");
    }
    let signature = req.query_param("Signature");
    if signature.is_none() {
        warn!("Missing Signature parameter");
    }
    Some(format!("{}{}:{}", V2_HEADER_PREFIX, credential?, signature?))
}

/// The v4 header carries the full credential scope
/// (`<accesskeyid>/<date>/<region>/<service>/aws4_request`), the signed-header
/// list and the signature. Signature v4A (ECDSA) is not supported.
fn synthesize_v4_header(req: &RequestSnapshot) -> Option<String> {
    let credential = req.query_param("x-amz-credential");
    if credential.is_none() {
        warn!("Missing x-amz-credential parameter");
    }
    let signed_headers = req.query_param("x-amz-signedheaders");
    if signed_headers.is_none() {
        warn!("Missing x-amz-signedheaders parameter");
    }
    let signature = req.query_param("x-amz-signature");
    if signature.is_none() {
        warn!("Missing x-amz-signature parameter");
    }
    Some(format!(
        "AWS4-HMAC-SHA256 Credential={}, SignedHeaders={}, Signature={}",
        credential?, signed_headers?, signature?
    ))
}

/// Extract the v2 presigned expiry: a bare UNIX timestamp in `Expires`.
fn v2_presigned_expiry_time(req: &RequestSnapshot) -> Option<i64> {
    let expires = match req.query_param("Expires") {
        Some(v) => v,
        None => {
            warn!("Missing Expires parameter");
            return None;
        }
    };
    match expires.parse::<i64>() {
        Ok(t) => Some(t),
        Err(_) => {
            warn!(expires, "Failed to parse int from Expires");
            None
        }
    }
}

/// Deduce the v4 presigned expiry: `x-amz-date` (UTC, `YYYYMMDDTHHMMSSZ`)
/// plus a nonnegative `x-amz-expires` delta in seconds.
fn v4_presigned_expiry_time(req: &RequestSnapshot) -> Option<i64> {
    let date = match req.query_param("x-amz-date") {
        Some(v) => v,
        None => {
            warn!("Missing x-amz-date parameter");
            return None;
        }
    };
    let delta = match req.query_param("x-amz-expires") {
        Some(v) => v,
        None => {
            warn!("Missing x-amz-expires parameter");
            return None;
        }
    };

    let start = match PrimitiveDateTime::parse(
        date,
        format_description!("[year][month][day]T[hour][minute][second]Z"),
    ) {
        Ok(t) => t.assume_utc().unix_timestamp(),
        Err(err) => {
            warn!(date, %err, "Failed to parse x-amz-date");
            return None;
        }
    };
    let delta_seconds = match delta.parse::<i64>() {
        Ok(d) if d >= 0 => d,
        _ => {
            warn!(delta, "Failed to parse nonnegative int from x-amz-expires");
            return None;
        }
    };

    let expiry = start + delta_seconds;
    debug!(date, delta, expiry, "presigned expiry deduced");
    Some(expiry)
}

/// Check a presigned request's expiry time against `now` (UNIX seconds).
///
/// Fails closed: if the version-specific parameters are absent or do not
/// parse, the request is treated as expired.
pub fn valid_presigned_time(req: &RequestSnapshot, now: i64) -> bool {
    let expiry = if req.query_params.contains_key("AWSAccessKeyId") {
        v2_presigned_expiry_time(req)
    } else if req.query_params.contains_key("x-amz-credential") {
        v4_presigned_expiry_time(req)
    } else {
        None
    };

    let Some(expiry) = expiry else {
        warn!("Unable to extract presigned URL expiry time from query parameters");
        return false;
    };
    debug!(expiry, now, "presigned URL last valid second");
    if expiry < now {
        warn!(expiry, now, "Presigned URL expired");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // `s3cmd --host ... signurl s3://testnv/rand +60`, URL-decoded.
    fn v2_presigned() -> RequestSnapshot {
        let mut query_params = HashMap::new();
        query_params.insert("AWSAccessKeyId".to_owned(), "0555b35654ad1656d804".to_owned());
        query_params.insert("Expires".to_owned(), "1697122817".to_owned());
        query_params.insert("Signature".to_owned(), "2HxhmxDYl0WgfktL0L62GVC+9vY=".to_owned());
        RequestSnapshot {
            relative_uri: "/testnv/rand".to_owned(),
            query_params,
            ..Default::default()
        }
    }

    // `aws s3 presign s3://testnv/rand --expires 60 --region eu-west-2`.
    fn v4_presigned() -> RequestSnapshot {
        let mut query_params = HashMap::new();
        query_params.insert("x-amz-algorithm".to_owned(), "AWS4-HMAC-SHA256".to_owned());
        query_params.insert(
            "x-amz-credential".to_owned(),
            "0555b35654ad1656d804/20231012/eu-west-2/s3/aws4_request".to_owned(),
        );
        query_params.insert("x-amz-date".to_owned(), "20231012T153745Z".to_owned());
        query_params.insert("x-amz-expires".to_owned(), "60".to_owned());
        query_params.insert("x-amz-signedheaders".to_owned(), "host".to_owned());
        query_params.insert(
            "x-amz-signature".to_owned(),
            "d63f2167860f1f3a02b098988cbe9e7cf19e2d3208044e70d52bcc88985abb17".to_owned(),
        );
        RequestSnapshot {
            relative_uri: "/testnv/rand".to_owned(),
            query_params,
            ..Default::default()
        }
    }

    #[test]
    fn inbound_header_wins_verbatim() {
        let mut req = v2_presigned();
        req.env.set(ENV_AUTHORIZATION, "AWS4-HMAC-SHA256 Credential=x, SignedHeaders=host, Signature=y");
        assert_eq!(
            auth_header_for_request(&req).as_deref(),
            Some("AWS4-HMAC-SHA256 Credential=x, SignedHeaders=host, Signature=y")
        );
    }

    #[test]
    fn synthesizes_v2_header() {
        let req = v2_presigned();
        assert_eq!(
            synthesize_auth_header(&req).as_deref(),
            Some("AWS 0555b35654ad1656d804:2HxhmxDYl0WgfktL0L62GVC+9vY=")
        );
    }

    #[test]
    fn synthesizes_v4_header() {
        let req = v4_presigned();
        assert_eq!(
            synthesize_auth_header(&req).as_deref(),
            Some(
                "AWS4-HMAC-SHA256 Credential=0555b35654ad1656d804/20231012/eu-west-2/s3/aws4_request, \
                 SignedHeaders=host, \
                 Signature=d63f2167860f1f3a02b098988cbe9e7cf19e2d3208044e70d52bcc88985abb17"
            )
        );
    }

    #[test]
    fn v2_header_roundtrips_to_url_parameters() {
        let req = v2_presigned();
        let header = synthesize_auth_header(&req).unwrap();
        let rest = header.strip_prefix(V2_HEADER_PREFIX).unwrap();
        let (access_key, signature) = rest.split_once(':').unwrap();
        assert_eq!(Some(access_key), req.query_param("AWSAccessKeyId"));
        assert_eq!(Some(signature), req.query_param("Signature"));
    }

    #[test]
    fn missing_v2_signature_fails() {
        let mut req = v2_presigned();
        req.query_params.remove("Signature");
        assert_eq!(synthesize_auth_header(&req), None);
    }

    #[test]
    fn missing_v4_signedheaders_fails() {
        let mut req = v4_presigned();
        req.query_params.remove("x-amz-signedheaders");
        assert_eq!(synthesize_auth_header(&req), None);
    }

    #[test]
    fn no_usable_parameters_fails() {
        let req = RequestSnapshot::default();
        assert_eq!(auth_header_for_request(&req), None);
    }

    #[test]
    fn v2_expiry_boundaries() {
        let req = v2_presigned();
        let now = 1_697_122_757;
        let delta = 60;
        assert!(valid_presigned_time(&req, now));
        assert!(valid_presigned_time(&req, now + delta));
        assert!(!valid_presigned_time(&req, now + delta + 1));
    }

    #[test]
    fn v4_expiry_boundaries() {
        let req = v4_presigned();
        let now = 1_697_125_065;
        let delta = 60;
        assert!(valid_presigned_time(&req, now));
        assert!(valid_presigned_time(&req, now + delta));
        assert!(!valid_presigned_time(&req, now + delta + 1));
    }

    #[test]
    fn unparsable_expiry_fails_closed() {
        let mut req = v2_presigned();
        req.query_params.insert("Expires".to_owned(), "not-a-number".to_owned());
        assert!(!valid_presigned_time(&req, 0));

        let mut req = v4_presigned();
        req.query_params.insert("x-amz-date".to_owned(), "12th October".to_owned());
        assert!(!valid_presigned_time(&req, 0));

        let mut req = v4_presigned();
        req.query_params.insert("x-amz-expires".to_owned(), "-60".to_owned());
        assert!(!valid_presigned_time(&req, 0));
    }

    #[test]
    fn missing_expiry_fails_closed() {
        let mut req = v2_presigned();
        req.query_params.remove("Expires");
        assert!(!valid_presigned_time(&req, 0));
    }
}

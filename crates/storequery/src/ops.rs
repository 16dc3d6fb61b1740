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

//! StoreQuery command execution.
//!
//! Every command bypasses requester authorization and permission checks and
//! is strictly read-only against the store.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, StoreQueryError};
use crate::store::ObjectIndex;

/// Page size for both the version listing and the multipart listing.
const LIST_PAGE_SIZE: usize = 100;

/// `Content-Type` of every StoreQuery response body.
pub const RESPONSE_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PingResult {
    /// The caller's request id, echoed verbatim.
    pub request_id: String,
}

/// Response document for `ping`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PingResponse {
    #[serde(rename = "StoreQueryPingResult")]
    pub result: PingResult,
}

/// Presence information for one object key.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ObjectStatus {
    pub bucket: String,
    pub object: String,
    pub deleted: bool,
    pub multipart_upload_in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipart_upload_id: Option<String>,
}

/// Response document for `objectstatus`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ObjectStatusResponse {
    #[serde(rename = "StoreQueryObjectStatusResult")]
    pub result: ObjectStatusResult,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ObjectStatusResult {
    #[serde(rename = "Object")]
    pub object: ObjectStatus,
}

/// Execute `ping`: store the request id and echo it back.
pub fn execute_ping(request_id: &str) -> PingResponse {
    info!(request_id, "storequery ping");
    PingResponse {
        result: PingResult {
            request_id: request_id.to_owned(),
        },
    }
}

/// Execute `objectstatus` for the addressed object.
///
/// Pass A scans the versioned bucket index for the current entry of the exact
/// key. Pass B, only when A finds nothing, scans in-progress multipart
/// uploads for the exact key. Both passes page by 100 and follow the marker
/// cursor until the store stops truncating.
pub async fn execute_object_status(
    store: &dyn ObjectIndex,
    bucket: &str,
    object_key: &str,
    cancel: &CancellationToken,
) -> Result<ObjectStatusResponse> {
    debug!(bucket, "storequery objectstatus");

    if let Some(status) = scan_versions(store, bucket, object_key, cancel).await? {
        return Ok(ObjectStatusResponse {
            result: ObjectStatusResult { object: status },
        });
    }
    if let Some(status) = scan_multipart_uploads(store, bucket, object_key, cancel).await? {
        return Ok(ObjectStatusResponse {
            result: ObjectStatusResult { object: status },
        });
    }
    Err(StoreQueryError::NotFound)
}

async fn scan_versions(
    store: &dyn ObjectIndex,
    bucket: &str,
    object_key: &str,
    cancel: &CancellationToken,
) -> Result<Option<ObjectStatus>> {
    let mut marker = None;
    let mut version_id_marker = None;
    loop {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreQueryError::Cancelled),
            page = store.list_object_versions(
                bucket,
                object_key,
                marker.take(),
                version_id_marker.take(),
                LIST_PAGE_SIZE,
            ) => page?,
        };

        for entry in &page.objects {
            // The prefix listing may return longer keys; only the exact key
            // counts.
            if entry.name != object_key {
                continue;
            }
            if !entry.is_latest {
                continue;
            }
            let deleted = entry.delete_marker;
            let status = ObjectStatus {
                bucket: bucket.to_owned(),
                object: object_key.to_owned(),
                deleted,
                multipart_upload_in_progress: false,
                version_id: if deleted { None } else { entry.version_id.clone() },
                size: if deleted { None } else { Some(entry.size) },
                multipart_upload_id: None,
            };
            return Ok(Some(status));
        }

        if !page.is_truncated {
            return Ok(None);
        }
        marker = page.next_marker;
        version_id_marker = page.next_version_id_marker;
    }
}

async fn scan_multipart_uploads(
    store: &dyn ObjectIndex,
    bucket: &str,
    object_key: &str,
    cancel: &CancellationToken,
) -> Result<Option<ObjectStatus>> {
    let mut key_marker = None;
    let mut upload_id_marker = None;
    loop {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreQueryError::Cancelled),
            page = store.list_multipart_uploads(
                bucket,
                object_key,
                key_marker.take(),
                upload_id_marker.take(),
                LIST_PAGE_SIZE,
            ) => page?,
        };

        for upload in &page.uploads {
            if upload.object == object_key {
                let status = ObjectStatus {
                    bucket: bucket.to_owned(),
                    object: object_key.to_owned(),
                    deleted: false,
                    multipart_upload_in_progress: true,
                    version_id: None,
                    size: None,
                    multipart_upload_id: Some(upload.upload_id.clone()),
                };
                return Ok(Some(status));
            }
        }

        if !page.is_truncated {
            return Ok(None);
        }
        key_marker = page.next_key_marker;
        upload_id_marker = page.next_upload_id_marker;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_response_document() {
        let response = execute_ping("foo");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"StoreQueryPingResult":{"request_id":"foo"}}"#);
    }

    #[test]
    fn ping_echoes_verbatim() {
        let response = execute_ping("CaSe-Sensitive id");
        assert_eq!(response.result.request_id, "CaSe-Sensitive id");
    }

    #[test]
    fn object_status_document_skips_absent_fields() {
        let status = ObjectStatus {
            bucket: "testnv".to_owned(),
            object: "rand".to_owned(),
            deleted: true,
            multipart_upload_in_progress: false,
            version_id: None,
            size: None,
            multipart_upload_id: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["deleted"], true);
        assert!(json.get("size").is_none());
        assert!(json.get("version_id").is_none());
        assert!(json.get("multipart_upload_id").is_none());
    }
}

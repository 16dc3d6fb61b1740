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

use crate::error::Result;

/// One version entry from the bucket index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Object key.
    pub name: String,
    pub version_id: Option<String>,
    /// Whether this entry is the current version of its key.
    pub is_latest: bool,
    pub delete_marker: bool,
    pub size: i64,
}

/// One page of a versioned bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListObjectVersionsPage {
    pub is_truncated: bool,
    pub next_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
    pub objects: Vec<ObjectRecord>,
}

/// One in-flight multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartUploadRecord {
    /// Object key the upload will commit to.
    pub object: String,
    pub upload_id: String,
}

/// One page of a multipart-upload listing.
#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsPage {
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_upload_id_marker: Option<String>,
    pub uploads: Vec<MultipartUploadRecord>,
}

/// Read-only view of the bucket index and multipart upload table.
///
/// Implemented by the gateway's store layer; queries are ordered and paged
/// with marker cursors, S3-listing style.
#[async_trait::async_trait]
pub trait ObjectIndex: Send + Sync {
    /// List object versions under `prefix`, ordered, resuming from the
    /// marker pair.
    async fn list_object_versions(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<String>,
        version_id_marker: Option<String>,
        max_keys: usize,
    ) -> Result<ListObjectVersionsPage>;

    /// List in-progress multipart uploads under `prefix`, ordered, resuming
    /// from the marker pair.
    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
        key_marker: Option<String>,
        upload_id_marker: Option<String>,
        max_uploads: usize,
    ) -> Result<ListMultipartUploadsPage>;
}

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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreQueryError>;

/// StoreQuery errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreQueryError {
    /// The `x-rgw-storequery` header is present but unusable. Terminal: the
    /// whole request aborts rather than falling through to normal dispatch.
    #[error("malformed x-rgw-storequery header")]
    BadHeader,

    /// The queried object exists neither committed nor as an in-progress
    /// multipart upload.
    #[error("object not found")]
    NotFound,

    /// A bucket-index or multipart listing failed.
    #[error("store query failed: {0}")]
    Store(String),

    /// The request was cancelled upstream.
    #[error("store query cancelled")]
    Cancelled,
}

impl StoreQueryError {
    /// HTTP status the REST layer renders for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            StoreQueryError::BadHeader => 500,
            StoreQueryError::NotFound => 404,
            StoreQueryError::Store(_) => 500,
            StoreQueryError::Cancelled => 500,
        }
    }
}

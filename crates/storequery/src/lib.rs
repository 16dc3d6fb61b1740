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

//! Out-of-band store introspection over the `x-rgw-storequery` header.
//!
//! A request carrying the header is diverted from normal S3 processing into
//! one of a small set of read-only commands that bypass requester
//! authorization: `ping` (liveness echo) and `objectstatus` (is this key
//! present, deleted, or mid multipart upload). A present-but-malformed header
//! aborts the request with an internal error rather than falling through.
//!
//! The REST host parses the header with [`parse_header`] at dispatch time,
//! then executes the returned [`StoreQueryOp`] against its store via the
//! [`ObjectIndex`] view.

pub mod error;
pub mod ops;
pub mod parser;
pub mod store;

pub use error::{Result, StoreQueryError};
pub use ops::{
    execute_object_status, execute_ping, ObjectStatus, ObjectStatusResponse, ObjectStatusResult,
    PingResponse, PingResult, RESPONSE_CONTENT_TYPE,
};
pub use parser::{parse_header, HandlerScope, HeaderParser, StoreQueryOp, MAX_HEADER_LENGTH, STOREQUERY_HEADER};
pub use store::{
    ListMultipartUploadsPage, ListObjectVersionsPage, MultipartUploadRecord, ObjectIndex, ObjectRecord,
};

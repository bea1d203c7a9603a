/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::ops::RangeInclusive;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio_util::sync::CancellationToken;

/// Characters left intact when encoding a copy-source value: unreserved
/// characters plus the key's path separators.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// One source object contributing bytes to a compose operation.
///
/// Captured immutably when the operation starts; the engine guards against
/// the source changing mid-copy by attaching the ETag observed during the
/// stat batch (or [`match_etag`](Self::match_etag), when given) as a
/// match-precondition on every copy request.
#[derive(Debug, Clone)]
pub struct ComposeSource {
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) version_id: Option<String>,
    pub(crate) range: Option<RangeInclusive<u64>>,
    pub(crate) match_etag: Option<String>,
}

impl ComposeSource {
    /// Create a source covering the whole object.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            version_id: None,
            range: None,
            match_etag: None,
        }
    }

    /// Copy from a specific version of the object.
    pub fn version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Restrict the copy to the inclusive byte range `[start, end]`.
    ///
    /// The range is validated against the stat'd object size before any
    /// upload is initiated.
    pub fn range(mut self, start: u64, end: u64) -> Self {
        self.range = Some(start..=end);
        self
    }

    /// Require the source's ETag to match the given value on every copy,
    /// instead of the ETag captured by the stat batch.
    pub fn match_etag(mut self, etag: impl Into<String>) -> Self {
        self.match_etag = Some(etag.into());
        self
    }

    /// The `x-amz-copy-source` header value addressing this source.
    pub(crate) fn copy_source_id(&self) -> String {
        let key = utf8_percent_encode(&self.key, COPY_SOURCE);
        match &self.version_id {
            Some(version_id) => format!("/{}/{}?versionId={}", self.bucket, key, version_id),
            None => format!("/{}/{}", self.bucket, key),
        }
    }
}

/// Input for a compose operation: the destination object and the ordered
/// list of sources whose bytes it is assembled from.
#[derive(Debug, Clone)]
pub struct ComposeInput {
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) sources: Vec<ComposeSource>,
    pub(crate) cancellation_token: CancellationToken,
}

impl ComposeInput {
    /// Create an input for the given destination object.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            sources: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Append a source. Sources contribute bytes in the order they are added.
    pub fn source(mut self, source: ComposeSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the source list.
    pub fn sources(mut self, sources: Vec<ComposeSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Tie the operation to a cancellation token. Cancelling the token stops
    /// all in-flight requests; if a multipart upload was already initiated, a
    /// best-effort abort is still issued. Callers wanting a deadline can
    /// cancel the token from a timer.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Destination bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Destination key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, ETAG};
use http::{Method, StatusCode};

use crate::error::BoxError;

/// A single request against an S3-compatible endpoint, ready to be signed and
/// sent by the transport collaborator.
///
/// The engine only ever describes *what* to send: verb, object address, query
/// parameters, headers, and body. Everything transport-level — signing,
/// connection reuse, HTTP retries — is owned by the [`SignedTransport`]
/// implementation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SignedRequest {
    /// HTTP method
    pub method: Method,
    /// Target bucket
    pub bucket: String,
    /// Target object key
    pub key: String,
    /// Query parameters, in the order the engine added them. An empty value
    /// denotes a bare parameter (e.g. `?uploads`).
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl SignedRequest {
    pub(crate) fn new(method: Method, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key: key.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub(crate) fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub(crate) fn header(mut self, name: &'static str, value: &str) -> Self {
        // All header values the engine produces are ASCII (percent-encoded
        // copy sources, byte ranges, ETags echoed from prior responses).
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).expect("valid header value"),
        );
        self
    }

    pub(crate) fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Look up a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header value by name, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Raw response handed back by the transport collaborator.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Fully buffered response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// ETag header with surrounding quotes stripped.
    pub(crate) fn etag(&self) -> Option<String> {
        self.headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string())
    }

    pub(crate) fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    pub(crate) fn version_id(&self) -> Option<String> {
        self.header_str("x-amz-version-id").map(str::to_string)
    }
}

/// Issues signed HTTP requests against an S3-compatible endpoint.
///
/// This is the engine's only path to the network. Implementations own request
/// signing and authentication, connection pooling, and any HTTP-level retry
/// policy; the engine itself never retries.
#[async_trait]
pub trait SignedTransport: fmt::Debug + Send + Sync {
    /// Issue a single signed request and return the raw response.
    ///
    /// An `Err` means the request could not be carried out at all (connection
    /// failure, signing failure). Service-level errors come back as a normal
    /// [`TransportResponse`] with a non-2xx status.
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse, BoxError>;
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, ETAG};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use s3_object_engine::error::BoxError;
use s3_object_engine::transport::{SignedRequest, SignedTransport, TransportResponse};
use s3_object_engine::{Client, Config};

pub const MIB: u64 = 1024 * 1024;

/// Route engine tracing to the test output. Safe to call from every test;
/// only the first call installs a subscriber.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_object_engine=trace".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Scripted response with optional artificial latency, for exercising
/// completion-order behavior.
pub struct MockResponse {
    delay: Duration,
    result: Result<TransportResponse, String>,
}

impl MockResponse {
    pub fn ok(response: TransportResponse) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(response),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A `SignedTransport` that records every request it sees and answers from a
/// scripted handler.
pub struct MockTransport {
    handler: Box<dyn Fn(&SignedRequest) -> MockResponse + Send + Sync>,
    requests: Mutex<Vec<SignedRequest>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests.lock().unwrap().len())
            .finish()
    }
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&SignedRequest) -> MockResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_of(&self, op: Op) -> usize {
        self.requests().iter().filter(|r| op_of(r) == op).count()
    }
}

#[async_trait]
impl SignedTransport for MockTransport {
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse, BoxError> {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.result.map_err(|message| message.into())
    }
}

/// The wire operation a request corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Stat,
    Initiate,
    CopyPart,
    Complete,
    Abort,
    DirectCopy,
    Select,
}

pub fn op_of(request: &SignedRequest) -> Op {
    if request.method == Method::HEAD {
        Op::Stat
    } else if request.method == Method::DELETE {
        Op::Abort
    } else if request.method == Method::POST {
        if request.query_param("uploads").is_some() {
            Op::Initiate
        } else if request.query_param("select").is_some() {
            Op::Select
        } else {
            Op::Complete
        }
    } else if request.query_param("partNumber").is_some() {
        Op::CopyPart
    } else {
        Op::DirectCopy
    }
}

/// A client over the mock transport with part sizes scaled for tests:
/// 5 MiB min and max part size, service-default count/size ceilings.
pub fn test_client(transport: Arc<MockTransport>) -> Client {
    Client::new(
        Config::builder()
            .min_part_size(5 * MIB)
            .max_part_size(5 * MIB)
            .transport(transport)
            .build(),
    )
}

// ---------------------------------------------------------------------------
// response builders
// ---------------------------------------------------------------------------

pub fn xml_response(body: &str) -> TransportResponse {
    TransportResponse::new(
        StatusCode::OK,
        HeaderMap::new(),
        Bytes::copy_from_slice(body.as_bytes()),
    )
}

pub fn bytes_response(body: Vec<u8>) -> TransportResponse {
    TransportResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from(body))
}

pub fn status_response(status: u16, body: &str) -> TransportResponse {
    TransportResponse::new(
        StatusCode::from_u16(status).unwrap(),
        HeaderMap::new(),
        Bytes::copy_from_slice(body.as_bytes()),
    )
}

pub fn head_response(size: u64, etag: &str) -> TransportResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from_str(&size.to_string()).unwrap());
    headers.insert(ETAG, HeaderValue::from_str(&format!("\"{etag}\"")).unwrap());
    TransportResponse::new(StatusCode::OK, headers, Bytes::new())
}

pub fn initiate_response(upload_id: &str) -> TransportResponse {
    xml_response(&format!(
        "<InitiateMultipartUploadResult><Bucket>dest</Bucket><Key>key</Key>\
         <UploadId>{upload_id}</UploadId></InitiateMultipartUploadResult>"
    ))
}

pub fn copy_part_response(etag: &str) -> TransportResponse {
    xml_response(&format!(
        "<CopyPartResult><ETag>\"{etag}\"</ETag>\
         <LastModified>2026-01-01T00:00:00.000Z</LastModified></CopyPartResult>"
    ))
}

pub fn copy_object_response(etag: &str) -> TransportResponse {
    xml_response(&format!(
        "<CopyObjectResult><ETag>\"{etag}\"</ETag>\
         <LastModified>2026-01-01T00:00:00.000Z</LastModified></CopyObjectResult>"
    ))
}

pub fn complete_response(etag: &str) -> TransportResponse {
    xml_response(&format!(
        "<CompleteMultipartUploadResult><Bucket>dest</Bucket><Key>key</Key>\
         <ETag>\"{etag}\"</ETag></CompleteMultipartUploadResult>"
    ))
}

// ---------------------------------------------------------------------------
// event-stream frame builders
// ---------------------------------------------------------------------------

/// Encode one event-stream frame the way the service does: prelude with its
/// own CRC, length-prefixed colon-joined header names, trailing message CRC.
pub fn frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut header_block = Vec::new();
    for (name, value) in headers {
        header_block.push(name.len() as u8);
        header_block.extend_from_slice(name.as_bytes());
        header_block.push(7u8); // string value type
        header_block.extend_from_slice(&(value.len() as u16).to_be_bytes());
        header_block.extend_from_slice(value.as_bytes());
    }

    let total = 16 + header_block.len() + payload.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as i32).to_be_bytes());
    out.extend_from_slice(&(header_block.len() as i32).to_be_bytes());

    let mut crc = crc32fast::Hasher::new();
    crc.update(&out);
    let prelude_crc = crc.clone().finalize();
    out.extend_from_slice(&prelude_crc.to_be_bytes());
    crc.update(&prelude_crc.to_be_bytes());

    out.extend_from_slice(&header_block);
    crc.update(&header_block);
    out.extend_from_slice(payload);
    crc.update(payload);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
    out
}

pub fn records_frame(payload: &[u8]) -> Vec<u8> {
    frame(
        &[
            (":message-type", "event"),
            (":event-type", "Records"),
            (":content-type", "application/octet-stream"),
        ],
        payload,
    )
}

pub fn progress_frame(xml: &str) -> Vec<u8> {
    frame(
        &[
            (":message-type", "event"),
            (":event-type", "Progress"),
            (":content-type", "text/xml"),
        ],
        xml.as_bytes(),
    )
}

pub fn stats_frame(xml: &str) -> Vec<u8> {
    frame(
        &[
            (":message-type", "event"),
            (":event-type", "Stats"),
            (":content-type", "text/xml"),
        ],
        xml.as_bytes(),
    )
}

pub fn end_frame() -> Vec<u8> {
    frame(&[(":message-type", "event"), (":event-type", "End")], b"")
}

pub fn error_frame(code: &str, message: &str) -> Vec<u8> {
    frame(
        &[
            (":message-type", "error"),
            (":error-code", code),
            (":error-message", message),
        ],
        b"",
    )
}

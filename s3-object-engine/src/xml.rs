/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Minimal helpers for the small XML documents on the multipart and select
//! wire. Bucket/object configuration schemas are out of scope; everything
//! here is a flat element-and-text document.

use std::io::{self, Write};

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::RemoteError;
use crate::transport::TransportResponse;
use crate::types::CompletedPart;

/// The S3 XML namespace.
pub(crate) const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Write a simple `<tag>text</tag>` element.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Serialize the `CompleteMultipartUpload` request body. `parts` must already
/// be sorted ascending by part number.
pub(crate) fn complete_multipart_upload_body(parts: &[CompletedPart]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128 + parts.len() * 96);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("CompleteMultipartUpload")
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| {
            for part in parts {
                w.create_element("Part").write_inner_content(|w| {
                    write_text_element(w, "PartNumber", &part.part_number.to_string())?;
                    write_text_element(w, "ETag", &format!("\"{}\"", part.etag))?;
                    Ok(())
                })?;
            }
            Ok(())
        })?;

    Ok(buf)
}

/// Scan a response document for the text content of the first element with
/// the given local name. Returns `None` on malformed XML or a missing
/// element; callers decide whether that is an error.
pub(crate) fn element_text(xml: &[u8], name: &str) -> Option<String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event().ok()? {
            Event::Start(e) if e.local_name().as_ref() == name.as_bytes() => {
                let mut text = String::new();
                loop {
                    match reader.read_event().ok()? {
                        Event::Text(t) => {
                            let decoded = t.decode().ok()?;
                            let unescaped = quick_xml::escape::unescape(&decoded).ok()?;
                            text.push_str(&unescaped);
                        }
                        Event::End(_) => return Some(text),
                        Event::Eof => return None,
                        _ => {}
                    }
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

/// Build a [`RemoteError`] from a non-2xx response, pulling `Code` and
/// `Message` out of the error document when the service sent one.
pub(crate) fn response_error(response: &TransportResponse) -> RemoteError {
    match element_text(&response.body, "Code") {
        Some(code) => {
            let message = element_text(&response.body, "Message").unwrap_or_default();
            RemoteError::new(code, message)
        }
        None => RemoteError::new(
            response.status.as_str(),
            format!("unexpected HTTP status {}", response.status),
        ),
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    use super::*;

    #[test]
    fn complete_body_lists_parts_in_order() {
        let parts = vec![
            CompletedPart {
                part_number: 1,
                etag: "etag-1".to_string(),
            },
            CompletedPart {
                part_number: 2,
                etag: "etag-2".to_string(),
            },
        ];
        let body = complete_multipart_upload_body(&parts).unwrap();
        let body = String::from_utf8(body).unwrap();
        let first = body.find("<PartNumber>1</PartNumber>").unwrap();
        let second = body.find("<PartNumber>2</PartNumber>").unwrap();
        assert!(first < second);
        assert!(body.contains("&quot;etag-1&quot;"));
        assert!(body.starts_with("<?xml"));
    }

    #[test]
    fn element_text_finds_nested_elements() {
        let xml = br#"<?xml version="1.0"?>
            <InitiateMultipartUploadResult>
                <Bucket>dest</Bucket>
                <Key>big&amp;bold</Key>
                <UploadId>abc-123</UploadId>
            </InitiateMultipartUploadResult>"#;
        assert_eq!(element_text(xml, "UploadId").as_deref(), Some("abc-123"));
        assert_eq!(element_text(xml, "Key").as_deref(), Some("big&bold"));
        assert_eq!(element_text(xml, "Missing"), None);
    }

    #[test]
    fn response_error_prefers_the_error_document() {
        let body = Bytes::from_static(
            b"<Error><Code>NoSuchUpload</Code><Message>gone</Message></Error>",
        );
        let resp = TransportResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), body);
        let err = response_error(&resp);
        assert_eq!(err.code(), "NoSuchUpload");
        assert_eq!(err.message(), "gone");

        let resp =
            TransportResponse::new(StatusCode::SERVICE_UNAVAILABLE, HeaderMap::new(), Bytes::new());
        let err = response_error(&resp);
        assert_eq!(err.code(), "503");
    }
}

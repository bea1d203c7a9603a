/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Decoder for the binary event-stream framing used by select-content
//! responses.
//!
//! Each frame is: 4-byte total length, 4-byte header length, 4-byte prelude
//! CRC, header block, payload, 4-byte message CRC. Integers are big-endian;
//! both CRCs use the standard CRC32 (deflate) polynomial. A frame is only
//! dispatched after both CRCs verify.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{self, Error};

/// Cursor-based exact-byte reader over a fully buffered response body.
#[derive(Debug)]
pub(crate) struct FrameReader {
    buf: Bytes,
}

impl FrameReader {
    pub(crate) fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub(crate) fn has_remaining(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Read exactly `n` bytes, advancing the cursor.
    fn read(&mut self, n: usize) -> Result<Bytes, Error> {
        if self.buf.len() < n {
            return Err(error::protocol(format!(
                "unexpected end of stream: needed {n} bytes, {} remain",
                self.buf.len()
            )));
        }
        Ok(self.buf.split_to(n))
    }

    fn read_i32(&mut self) -> Result<(i32, [u8; 4]), Error> {
        let bytes = self.read(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes);
        Ok((i32::from_be_bytes(raw), raw))
    }

    fn read_u32(&mut self) -> Result<(u32, [u8; 4]), Error> {
        let bytes = self.read(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes);
        Ok((u32::from_be_bytes(raw), raw))
    }
}

/// A fully verified frame: header map plus raw payload.
#[derive(Debug)]
struct Frame {
    headers: HashMap<String, String>,
    payload: Bytes,
}

impl Frame {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// One decoded event-stream message.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DecodedMessage {
    /// A chunk of raw record bytes
    Records(Bytes),
    /// Progress document text
    Progress(String),
    /// Stats document text
    Stats(String),
    /// Terminal event; decoding is complete
    End,
    /// An event type this client does not know; skipped for forward
    /// compatibility
    Unknown(String),
}

/// Pull-based decoder over a buffered select-content response body.
#[derive(Debug)]
pub(crate) struct EventStreamDecoder {
    reader: FrameReader,
}

impl EventStreamDecoder {
    pub(crate) fn new(body: Bytes) -> Self {
        Self {
            reader: FrameReader::new(body),
        }
    }

    /// Decode and dispatch the next frame. `Ok(None)` once the input is
    /// exhausted. Checksum and protocol failures are fatal: the decoder must
    /// not be polled again after an error.
    pub(crate) fn next_message(&mut self) -> Result<Option<DecodedMessage>, Error> {
        if !self.reader.has_remaining() {
            return Ok(None);
        }
        let frame = self.read_frame()?;
        dispatch(frame).map(Some)
    }

    fn read_frame(&mut self) -> Result<Frame, Error> {
        let mut crc = crc32fast::Hasher::new();

        let (total_length, total_raw) = self.reader.read_i32()?;
        let (header_length, header_raw) = self.reader.read_i32()?;
        crc.update(&total_raw);
        crc.update(&header_raw);

        let (prelude_crc, prelude_crc_raw) = self.reader.read_u32()?;
        let computed = crc.clone().finalize();
        if prelude_crc != computed {
            return Err(error::checksum_mismatch("prelude", prelude_crc, computed));
        }
        // the message CRC also covers the prelude CRC bytes themselves
        crc.update(&prelude_crc_raw);

        if total_length < 16 || header_length < 0 || header_length as i64 > total_length as i64 - 16
        {
            return Err(error::protocol(format!(
                "malformed frame: total length {total_length}, header length {header_length}"
            )));
        }

        let header_block = if header_length > 0 {
            self.reader.read(header_length as usize)?
        } else {
            Bytes::new()
        };
        crc.update(&header_block);
        let headers = parse_headers(&header_block)?;

        let payload_length = (total_length - header_length - 16) as usize;
        let payload = if payload_length > 0 {
            self.reader.read(payload_length)?
        } else {
            Bytes::new()
        };
        crc.update(&payload);

        let (message_crc, _) = self.reader.read_u32()?;
        let computed = crc.finalize();
        if message_crc != computed {
            return Err(error::checksum_mismatch("message", message_crc, computed));
        }

        Ok(Frame { headers, payload })
    }
}

/// Parse the header block: each entry is a u8 name length, a colon-joined
/// name whose second token is the key, a one-byte value type tag (carries no
/// information we need), a u16 value length, and the value bytes.
fn parse_headers(block: &[u8]) -> Result<HashMap<String, String>, Error> {
    fn take<'a>(block: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], Error> {
        if block.len() - *pos < n {
            return Err(error::protocol("truncated frame header block"));
        }
        let out = &block[*pos..*pos + n];
        *pos += n;
        Ok(out)
    }

    let mut headers = HashMap::new();
    let mut pos = 0usize;

    while pos < block.len() {
        let name_length = take(block, &mut pos, 1)?[0] as usize;
        let name = std::str::from_utf8(take(block, &mut pos, name_length)?)
            .map_err(error::protocol)?;
        let key = name
            .split(':')
            .nth(1)
            .ok_or_else(|| error::protocol(format!("malformed frame header name {name:?}")))?
            .to_string();

        let _value_type = take(block, &mut pos, 1)?[0];

        let value_raw = take(block, &mut pos, 2)?;
        let value_length = u16::from_be_bytes([value_raw[0], value_raw[1]]) as usize;
        let value = std::str::from_utf8(take(block, &mut pos, value_length)?)
            .map_err(error::protocol)?;

        headers.insert(key, value.to_string());
    }

    Ok(headers)
}

fn dispatch(frame: Frame) -> Result<DecodedMessage, Error> {
    let message_type = frame
        .header("message-type")
        .ok_or_else(|| error::protocol("frame is missing a message-type header"))?;

    match message_type {
        "error" => Err(error::remote(
            frame.header("error-code").unwrap_or("UnknownError"),
            frame.header("error-message").unwrap_or_default(),
        )),
        "event" => {
            let event_type = frame
                .header("event-type")
                .ok_or_else(|| error::protocol("event frame is missing an event-type header"))?;
            match event_type {
                "End" => Ok(DecodedMessage::End),
                "Records" => Ok(DecodedMessage::Records(frame.payload.clone())),
                "Progress" | "Stats" => {
                    let content_type = frame.header("content-type");
                    if content_type != Some("text/xml") {
                        return Err(error::protocol(format!(
                            "unexpected content-type {:?} for event-type {event_type}",
                            content_type.unwrap_or("<missing>"),
                        )));
                    }
                    let text = std::str::from_utf8(&frame.payload)
                        .map_err(error::protocol)?
                        .to_string();
                    if event_type == "Progress" {
                        Ok(DecodedMessage::Progress(text))
                    } else {
                        Ok(DecodedMessage::Stats(text))
                    }
                }
                other => {
                    tracing::warn!("skipping unrecognized event-type {other}");
                    Ok(DecodedMessage::Unknown(other.to_string()))
                }
            }
        }
        other => {
            tracing::warn!("skipping frame with unrecognized message-type {other}");
            Ok(DecodedMessage::Unknown(other.to_string()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    /// Encode a frame the way the service does.
    fn frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
        let mut header_block = Vec::new();
        for (name, value) in headers {
            header_block.push(name.len() as u8);
            header_block.extend_from_slice(name.as_bytes());
            header_block.push(7u8);
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

    fn records(payload: &[u8]) -> Vec<u8> {
        frame(
            &[
                (":message-type", "event"),
                (":event-type", "Records"),
                (":content-type", "application/octet-stream"),
            ],
            payload,
        )
    }

    #[test]
    fn decodes_records_then_end() {
        let mut body = records(b"a,b,c\n1,2,3\n");
        body.extend(frame(
            &[(":message-type", "event"), (":event-type", "End")],
            b"",
        ));

        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        assert_eq!(
            decoder.next_message().unwrap(),
            Some(DecodedMessage::Records(Bytes::from_static(
                b"a,b,c\n1,2,3\n"
            )))
        );
        assert_eq!(decoder.next_message().unwrap(), Some(DecodedMessage::End));
        assert_eq!(decoder.next_message().unwrap(), None);
    }

    #[test]
    fn corrupted_prelude_is_a_checksum_mismatch() {
        let mut body = records(b"payload");
        body[1] ^= 0x01;
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn corrupted_payload_is_a_checksum_mismatch() {
        let mut body = records(b"payload");
        let n = body.len();
        body[n - 6] ^= 0x40; // inside the payload, before the message CRC
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn truncated_stream_is_a_protocol_error() {
        let body = records(b"payload");
        let mut decoder = EventStreamDecoder::new(Bytes::from(body[..body.len() - 3].to_vec()));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Protocol);
    }

    #[test]
    fn error_event_carries_code_and_message_verbatim() {
        let body = frame(
            &[
                (":message-type", "error"),
                (":error-code", "InternalError"),
                (":error-message", "We encountered an internal error."),
            ],
            b"",
        );
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Remote);
        let remote = err.as_remote().unwrap();
        assert_eq!(remote.code(), "InternalError");
        assert_eq!(remote.message(), "We encountered an internal error.");
    }

    #[test]
    fn progress_requires_xml_content_type() {
        let body = frame(
            &[
                (":message-type", "event"),
                (":event-type", "Progress"),
                (":content-type", "application/json"),
            ],
            b"{}",
        );
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Protocol);
    }

    #[test]
    fn unknown_event_type_is_skipped() {
        let body = frame(
            &[(":message-type", "event"), (":event-type", "Cont")],
            b"",
        );
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        assert_eq!(
            decoder.next_message().unwrap(),
            Some(DecodedMessage::Unknown("Cont".to_string()))
        );
    }

    #[test]
    fn header_name_without_colon_is_malformed() {
        let body = frame(&[("message-type", "event")], b"");
        let mut decoder = EventStreamDecoder::new(Bytes::from(body));
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Protocol);
    }
}

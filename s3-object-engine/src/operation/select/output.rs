/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::VecDeque;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::Error;
use crate::transport::TransportResponse;

use super::decoder::{DecodedMessage, EventStreamDecoder};

/// Decoded result of a select-content query.
///
/// Record bytes accumulate in arrival order and are handed out through
/// [`records`](Self::records), a single-pass sequence: chunks are consumed as
/// they are yielded and cannot be replayed. Run a fresh query for a second
/// pass.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct SelectOutput {
    records: VecDeque<Bytes>,
    progress: Option<String>,
    stats: Option<String>,
    status: Option<StatusCode>,
    headers: HeaderMap,
    ended: bool,
}

impl SelectOutput {
    /// Drain the decoder into a new output. The response metadata is attached
    /// when the terminal `End` event is observed.
    pub(crate) fn accumulate(
        mut decoder: EventStreamDecoder,
        response: &TransportResponse,
    ) -> Result<SelectOutput, Error> {
        let mut output = SelectOutput::default();

        loop {
            match decoder.next_message()? {
                Some(DecodedMessage::Records(bytes)) => output.records.push_back(bytes),
                Some(DecodedMessage::Progress(text)) => output.progress = Some(text),
                Some(DecodedMessage::Stats(text)) => output.stats = Some(text),
                Some(DecodedMessage::Unknown(_)) => {}
                Some(DecodedMessage::End) => {
                    output.status = Some(response.status);
                    output.headers = response.headers.clone();
                    output.ended = true;
                    break;
                }
                None => break,
            }
        }

        Ok(output)
    }

    /// The record bytes decoded so far, as a consuming, single-pass sequence.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            chunks: &mut self.records,
        }
    }

    /// Most recent progress document, when progress reporting was requested.
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Most recent stats document.
    pub fn stats(&self) -> Option<&str> {
        self.stats.as_deref()
    }

    /// Whether the stream's terminal `End` event was observed.
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// HTTP status of the response, attached once the stream ended.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Headers of the response, attached once the stream ended.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Single-pass iterator over decoded record chunks. Yielded chunks are
/// removed from the output and not replayed.
#[derive(Debug)]
pub struct Records<'a> {
    chunks: &'a mut VecDeque<Bytes>,
}

impl Iterator for Records<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.pop_front()
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod decoder;
mod input;
mod output;

use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use crate::client::Handle;
use crate::error::{Error, ErrorKind};
use crate::transport::SignedRequest;
use crate::xml;

use decoder::EventStreamDecoder;

pub use input::{
    CompressionType, ExpressionType, FileHeaderInfo, InputSerialization, JsonType,
    OutputSerialization, SelectInput,
};
pub use output::{Records, SelectOutput};

/// Operation struct for a select-content query
#[derive(Clone, Default, Debug)]
pub(crate) struct Select;

impl Select {
    /// Execute a single `Select` operation
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: SelectInput,
    ) -> Result<SelectOutput, Error> {
        let body = input.to_xml()?;
        let req = SignedRequest::new(Method::POST, &input.bucket, &input.key)
            .query("select", "")
            .query("select-type", "2")
            .body(Bytes::from(body));

        let resp = handle
            .config()
            .transport()
            .send(req)
            .await
            .map_err(|err| Error::new(ErrorKind::Remote, err))?;
        if !resp.status.is_success() {
            return Err(Error::new(ErrorKind::Remote, xml::response_error(&resp)));
        }

        tracing::debug!(
            "decoding select response for {}/{} ({} bytes)",
            input.bucket,
            input.key,
            resp.body.len()
        );
        SelectOutput::accumulate(EventStreamDecoder::new(resp.body.clone()), &resp)
    }
}

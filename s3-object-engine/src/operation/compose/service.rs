/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use http::Method;
use tokio::task;
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};

use crate::error::{self, Error};
use crate::transport::SignedRequest;
use crate::types::CompletedPart;
use crate::xml;

use super::planner::{PartPlan, PlannedPart};
use super::ComposeContext;

/// Request/input type for our "copy part" service.
#[derive(Debug, Clone)]
pub(super) struct CopyPartRequest {
    pub(super) ctx: ComposeContext,
    pub(super) upload_id: String,
    pub(super) part: PlannedPart,
    /// ETag precondition for the part's source, when one was captured.
    pub(super) if_match: Option<String>,
}

/// handler (service fn) for a single part copy
async fn copy_part_handler(request: CopyPartRequest) -> Result<CompletedPart, Error> {
    let ctx = &request.ctx;
    let part_number = request.part.part_number;
    let source = &ctx.input.sources[request.part.source_index];
    let range = &request.part.range;

    let mut req = SignedRequest::new(Method::PUT, &ctx.input.bucket, &ctx.input.key)
        .query("partNumber", part_number.to_string())
        .query("uploadId", &request.upload_id)
        .header("x-amz-copy-source", &source.copy_source_id())
        .header(
            "x-amz-copy-source-range",
            &format!("bytes={}-{}", range.start(), range.end()),
        );
    if let Some(etag) = &request.if_match {
        req = req.header("x-amz-copy-source-if-match", etag);
    }

    let resp = ctx
        .transport()
        .send(req)
        .await
        .map_err(|err| error::part_copy_failed(part_number, err))?;
    if !resp.status.is_success() {
        return Err(error::part_copy_failed(
            part_number,
            xml::response_error(&resp),
        ));
    }

    let etag = xml::element_text(&resp.body, "ETag").ok_or_else(|| {
        error::part_copy_failed(part_number, "copy part response is missing an ETag")
    })?;

    tracing::trace!("completed copy of part number {}", part_number);
    Ok(CompletedPart {
        part_number,
        etag: etag.trim_matches('"').to_string(),
    })
}

/// Create a new tower::Service for copying individual parts into the destination
pub(super) fn copy_part_service(
    ctx: &ComposeContext,
) -> impl Service<CopyPartRequest, Response = CompletedPart, Error = Error, Future: Send>
       + Clone
       + Send {
    let svc = service_fn(copy_part_handler);
    ServiceBuilder::new()
        .concurrency_limit(ctx.handle.num_workers())
        .service(svc)
}

/// Spawn one task per planned part. Completion order is arbitrary; each task
/// reports its own part number, so results are correlated by part, not by
/// arrival.
pub(super) fn distribute_work(
    tasks: &mut task::JoinSet<Result<CompletedPart, Error>>,
    ctx: &ComposeContext,
    upload_id: &str,
    plan: &PartPlan,
    if_match: &[Option<String>],
) {
    let svc = copy_part_service(ctx);

    for part in &plan.parts {
        let req = CopyPartRequest {
            ctx: ctx.clone(),
            upload_id: upload_id.to_string(),
            part: part.clone(),
            if_match: if_match[part.source_index].clone(),
        };
        let svc = svc.clone();
        let token = ctx.input.cancellation_token.clone();

        let task = async move {
            tokio::select! {
                _ = token.cancelled() => Err(error::operation_cancelled()),
                resp = svc.oneshot(req) => resp,
            }
        };
        tasks.spawn(task);
    }

    tracing::trace!("work distributed for copying {} parts", plan.parts.len());
}

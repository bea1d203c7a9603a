/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation input types
mod input;
mod output;
mod planner;
mod service;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::try_join_all;
use http::Method;
use tokio::task;

use crate::client::Handle;
use crate::error::{self, Error, ErrorKind};
use crate::transport::{SignedRequest, SignedTransport};
use crate::types::{CompletedPart, ObjectStat};
use crate::xml;

pub use input::{ComposeInput, ComposeSource};
pub use output::ComposeOutput;

use planner::PartPlan;

/// Operation struct for composing a destination object from source objects
#[derive(Clone, Default, Debug)]
pub(crate) struct Compose;

impl Compose {
    /// Execute a single `Compose` operation
    pub(crate) async fn orchestrate(
        handle: Arc<Handle>,
        input: ComposeInput,
    ) -> Result<ComposeOutput, Error> {
        if input.sources.is_empty() {
            return Err(error::invalid_input("compose requires at least one source"));
        }

        let ctx = ComposeContext {
            handle,
            input: Arc::new(input),
        };
        let token = ctx.input.cancellation_token.clone();

        let stats = match token.run_until_cancelled(stat_sources(&ctx)).await {
            Some(stats) => stats?,
            None => return Err(error::operation_cancelled()),
        };

        let plan = planner::plan(&ctx.input.sources, &stats, ctx.handle.config().limits())?;

        // A single unranged source that fits in one part never needs a
        // multipart session; plain CopyObject has no source-range header, so
        // ranged requests always take the multipart path.
        if ctx.input.sources.len() == 1
            && ctx.input.sources[0].range.is_none()
            && plan.parts.len() <= 1
        {
            tracing::trace!(
                "composition of {} bytes reduces to a single part; sending as direct copy",
                plan.total_size
            );
            return match token.run_until_cancelled(direct_copy(&ctx, &stats, &plan)).await {
                Some(result) => result,
                None => Err(error::operation_cancelled()),
            };
        }

        if plan.parts.is_empty() {
            return Err(error::invalid_input(
                "composition resolves to zero parts; sources are all empty",
            ));
        }

        multipart_compose(&ctx, &stats, &plan).await
    }
}

/// Shared state for a single compose operation
#[derive(Debug, Clone)]
pub(crate) struct ComposeContext {
    pub(crate) handle: Arc<Handle>,
    pub(crate) input: Arc<ComposeInput>,
}

impl ComposeContext {
    pub(crate) fn transport(&self) -> &Arc<dyn SignedTransport> {
        self.handle.config().transport()
    }
}

/// State of one multipart upload session. Each compose call owns exactly one;
/// a session reaches `Completed` or `Aborted` at most once and is never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Pending,
    InProgress,
    Completed,
    Aborted,
}

#[derive(Debug)]
struct UploadSession {
    upload_id: String,
    bucket: String,
    key: String,
    parts: Vec<CompletedPart>,
    state: SessionState,
}

impl UploadSession {
    fn new(upload_id: String, bucket: String, key: String) -> Self {
        Self {
            upload_id,
            bucket,
            key,
            parts: Vec::new(),
            state: SessionState::Pending,
        }
    }

    fn start(&mut self) {
        debug_assert_eq!(self.state, SessionState::Pending);
        self.state = SessionState::InProgress;
    }

    fn record_part(&mut self, part: CompletedPart) {
        debug_assert_eq!(self.state, SessionState::InProgress);
        self.parts.push(part);
    }

    fn complete(&mut self) {
        debug_assert_eq!(self.state, SessionState::InProgress);
        self.state = SessionState::Completed;
    }

    fn abort(&mut self) {
        debug_assert_ne!(self.state, SessionState::Completed);
        debug_assert_ne!(self.state, SessionState::Aborted);
        self.state = SessionState::Aborted;
    }
}

/// Stat every source concurrently. Results are keyed by source index; the
/// first failure wins and nothing has been initiated at that point.
async fn stat_sources(ctx: &ComposeContext) -> Result<Vec<ObjectStat>, Error> {
    try_join_all(ctx.input.sources.iter().map(|source| stat_source(ctx, source))).await
}

async fn stat_source(ctx: &ComposeContext, source: &ComposeSource) -> Result<ObjectStat, Error> {
    let mut req = SignedRequest::new(Method::HEAD, &source.bucket, &source.key);
    if let Some(version_id) = &source.version_id {
        req = req.query("versionId", version_id);
    }

    let resp = ctx
        .transport()
        .send(req)
        .await
        .map_err(error::stat_failed)?;
    if !resp.status.is_success() {
        return Err(error::stat_failed(xml::response_error(&resp)));
    }

    let size = resp.content_length().ok_or_else(|| {
        error::stat_failed(format!(
            "stat response for {}/{} is missing Content-Length",
            source.bucket, source.key
        ))
    })?;

    Ok(ObjectStat {
        size,
        etag: resp.etag(),
        version_id: resp.version_id(),
    })
}

/// ETag precondition to attach to copies from each source: the caller's
/// `match_etag` wins, otherwise the ETag captured by the stat batch.
fn copy_preconditions(ctx: &ComposeContext, stats: &[ObjectStat]) -> Vec<Option<String>> {
    ctx.input
        .sources
        .iter()
        .zip(stats)
        .map(|(source, stat)| source.match_etag.clone().or_else(|| stat.etag.clone()))
        .collect()
}

/// Copy a single source into the destination with one server-side copy,
/// bypassing the multipart protocol entirely.
async fn direct_copy(
    ctx: &ComposeContext,
    stats: &[ObjectStat],
    plan: &PartPlan,
) -> Result<ComposeOutput, Error> {
    let source = &ctx.input.sources[0];
    let if_match = copy_preconditions(ctx, stats).swap_remove(0);

    let mut req = SignedRequest::new(Method::PUT, &ctx.input.bucket, &ctx.input.key)
        .header("x-amz-copy-source", &source.copy_source_id());
    if let Some(etag) = &if_match {
        req = req.header("x-amz-copy-source-if-match", etag);
    }

    let resp = ctx
        .transport()
        .send(req)
        .await
        .map_err(|err| error::part_copy_failed(1, err))?;
    if !resp.status.is_success() {
        return Err(error::part_copy_failed(1, xml::response_error(&resp)));
    }

    let e_tag = xml::element_text(&resp.body, "ETag")
        .map(|etag| etag.trim_matches('"').to_string())
        .or_else(|| resp.etag());

    Ok(ComposeOutput {
        bucket: ctx.input.bucket.clone(),
        key: ctx.input.key.clone(),
        e_tag,
        version_id: resp.version_id(),
        object_size: plan.total_size,
        upload_id: None,
    })
}

/// Drive a full multipart session: initiate, fan out all part copies, then
/// complete — or abort once and surface the original failure.
async fn multipart_compose(
    ctx: &ComposeContext,
    stats: &[ObjectStat],
    plan: &PartPlan,
) -> Result<ComposeOutput, Error> {
    let token = ctx.input.cancellation_token.clone();

    let upload_id = match token.run_until_cancelled(initiate_upload(ctx)).await {
        Some(result) => result?,
        None => return Err(error::operation_cancelled()),
    };
    tracing::trace!("multipart upload started with upload id: {upload_id}");

    let mut session = UploadSession::new(
        upload_id,
        ctx.input.bucket.clone(),
        ctx.input.key.clone(),
    );
    session.start();

    let mut tasks = task::JoinSet::new();
    service::distribute_work(
        &mut tasks,
        ctx,
        &session.upload_id,
        plan,
        &copy_preconditions(ctx, stats),
    );

    while let Some(join_result) = tasks.join_next().await {
        let result = join_result.map_err(Error::from).and_then(|r| r);
        match result {
            Ok(part) => session.record_part(part),
            Err(err) => {
                tracing::error!("part copy failed, aborting multipart upload");
                tasks.abort_all();
                while (tasks.join_next().await).is_some() {}
                abort_upload(ctx, &mut session).await;
                return Err(err);
            }
        }
    }
    debug_assert_eq!(session.parts.len(), plan.parts.len());

    // parts must be sorted regardless of the order copies finished in
    session.parts.sort_by_key(|p| p.part_number);

    match token.run_until_cancelled(complete_upload(ctx, &session, plan)).await {
        Some(Ok(output)) => {
            session.complete();
            tracing::trace!("compose completed successfully");
            Ok(output)
        }
        Some(Err(err)) => {
            tracing::error!("failed to complete multipart upload, aborting");
            abort_upload(ctx, &mut session).await;
            Err(err)
        }
        None => {
            abort_upload(ctx, &mut session).await;
            Err(error::operation_cancelled())
        }
    }
}

/// Start a new multipart upload by sending `POST ?uploads`
async fn initiate_upload(ctx: &ComposeContext) -> Result<String, Error> {
    let req = SignedRequest::new(Method::POST, &ctx.input.bucket, &ctx.input.key)
        .query("uploads", "");

    let resp = ctx
        .transport()
        .send(req)
        .await
        .map_err(|err| Error::new(ErrorKind::Remote, err))?;
    if !resp.status.is_success() {
        return Err(Error::new(
            ErrorKind::Remote,
            xml::response_error(&resp),
        ));
    }

    xml::element_text(&resp.body, "UploadId")
        .ok_or_else(|| error::protocol("initiate response is missing an UploadId"))
}

async fn complete_upload(
    ctx: &ComposeContext,
    session: &UploadSession,
    plan: &PartPlan,
) -> Result<ComposeOutput, Error> {
    let body = xml::complete_multipart_upload_body(&session.parts)?;
    let req = SignedRequest::new(Method::POST, &session.bucket, &session.key)
        .query("uploadId", &session.upload_id)
        .body(Bytes::from(body));

    let resp = ctx
        .transport()
        .send(req)
        .await
        .map_err(error::completion_failed)?;
    if !resp.status.is_success() {
        return Err(error::completion_failed(xml::response_error(&resp)));
    }

    let e_tag = xml::element_text(&resp.body, "ETag")
        .map(|etag| etag.trim_matches('"').to_string())
        .or_else(|| resp.etag());

    Ok(ComposeOutput {
        bucket: session.bucket.clone(),
        key: session.key.clone(),
        e_tag,
        version_id: resp.version_id(),
        object_size: plan.total_size,
        upload_id: Some(session.upload_id.clone()),
    })
}

/// Best-effort abort of the multipart session. The abort's own outcome is
/// never surfaced; the caller propagates whatever error got us here.
async fn abort_upload(ctx: &ComposeContext, session: &mut UploadSession) {
    session.abort();

    let req = SignedRequest::new(Method::DELETE, &session.bucket, &session.key)
        .query("uploadId", &session.upload_id);

    match ctx.transport().send(req).await {
        Ok(resp) if resp.status.is_success() => {
            tracing::debug!("aborted multipart upload {}", session.upload_id);
        }
        Ok(resp) => {
            tracing::warn!(
                status = %resp.status,
                "failed to abort multipart upload {}",
                session.upload_id
            );
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                "failed to abort multipart upload {}",
                session.upload_id
            );
        }
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error;
use crate::operation::compose::{Compose, ComposeInput, ComposeOutput};
use crate::operation::select::{Select, SelectInput, SelectOutput};
use crate::types::ConcurrencySetting;
use crate::{Config, DEFAULT_CONCURRENCY};

/// Engine client for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, limits, transport
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
}

impl Handle {
    /// Get the concrete number of workers to use based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Explicit(concurrency) => *concurrency,
            _ => DEFAULT_CONCURRENCY,
        }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }
}

impl Client {
    /// Creates a new client from an engine config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Compose a destination object from one or more source objects using
    /// server-side copy.
    ///
    /// Small single-source compositions are carried out as one direct copy;
    /// everything else drives a multipart upload session to completion or
    /// abort. See [`ComposeInput`] for the per-source options.
    pub async fn compose(
        &self,
        input: ComposeInput,
    ) -> Result<ComposeOutput, crate::error::Error> {
        Compose::orchestrate(self.handle.clone(), input).await
    }

    /// Run a select-content query against an object and decode the streamed
    /// response into a [`SelectOutput`].
    pub async fn select_object_content(
        &self,
        input: SelectInput,
    ) -> Result<SelectOutput, error::Error> {
        Select::orchestrate(self.handle.clone(), input).await
    }
}

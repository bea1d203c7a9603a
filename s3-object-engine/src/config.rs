/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::transport::SignedTransport;
use crate::types::ConcurrencySetting;
use crate::MEBIBYTE;

/// Minimum size of a non-final part in a composed object
const DEFAULT_MIN_PART_SIZE: u64 = 5 * MEBIBYTE;

/// Maximum size of a single part
const DEFAULT_MAX_PART_SIZE: u64 = 5 * 1024 * MEBIBYTE;

/// Maximum number of parts in a single multipart upload
const DEFAULT_MAX_PART_COUNT: u64 = 10_000;

/// Maximum size of a composed object
const DEFAULT_MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * MEBIBYTE;

/// Size and count ceilings a compose operation is validated against.
///
/// Defaults are the well-known S3 service limits; deployments fronting other
/// S3-compatible stores may supply their own. The engine enforces the
/// invariants against whatever values are configured, it does not own them.
#[derive(Debug, Clone, Copy)]
pub struct SizeLimits {
    pub(crate) min_part_size: u64,
    pub(crate) max_part_size: u64,
    pub(crate) max_part_count: u64,
    pub(crate) max_object_size: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_part_size: DEFAULT_MIN_PART_SIZE,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_part_count: DEFAULT_MAX_PART_COUNT,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
        }
    }
}

impl SizeLimits {
    /// Minimum size of every part except the final part of a composition.
    pub fn min_part_size(&self) -> u64 {
        self.min_part_size
    }

    /// Maximum size of a single part.
    pub fn max_part_size(&self) -> u64 {
        self.max_part_size
    }

    /// Maximum number of parts in a single multipart upload.
    pub fn max_part_count(&self) -> u64 {
        self.max_part_count
    }

    /// Maximum total size of a composed object.
    pub fn max_object_size(&self) -> u64 {
        self.max_object_size
    }
}

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    limits: SizeLimits,
    concurrency: ConcurrencySetting,
    transport: Arc<dyn SignedTransport>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the size limits compose operations are validated against
    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Returns the concurrency setting to use for part-copy fan-out
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// The transport that will be used to send requests to the service.
    pub fn transport(&self) -> &Arc<dyn SignedTransport> {
        &self.transport
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Default)]
pub struct Builder {
    limits: SizeLimits,
    concurrency: ConcurrencySetting,
    transport: Option<Arc<dyn SignedTransport>>,
}

impl Builder {
    /// Minimum size of every part except the final part of a composition.
    pub fn min_part_size(mut self, size: u64) -> Self {
        self.limits.min_part_size = size;
        self
    }

    /// Maximum size of a single part. Compositions are split into ranges of
    /// at most this many bytes.
    pub fn max_part_size(mut self, size: u64) -> Self {
        self.limits.max_part_size = size;
        self
    }

    /// Maximum number of parts a single composition may plan.
    pub fn max_part_count(mut self, count: u64) -> Self {
        self.limits.max_part_count = count;
        self
    }

    /// Maximum total size of a composed object.
    pub fn max_object_size(mut self, size: u64) -> Self {
        self.limits.max_object_size = size;
        self
    }

    /// Set the concurrency level part copies are allowed to use.
    ///
    /// This sets the maximum number of concurrent in-flight part-copy requests.
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the transport used to send requests to the service.
    pub fn transport(mut self, transport: Arc<dyn SignedTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Config {
        Config {
            limits: self.limits,
            concurrency: self.concurrency,
            transport: self.transport.expect("transport set"),
        }
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// The concurrency setting to use for a single compose operation's part copies.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Automatically configure an optimal concurrency setting based on the execution environment.
    #[default]
    Auto,

    /// Explicitly configured concurrency setting.
    Explicit(usize),
}

/// Metadata captured for a source object by the stat batch.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub(crate) size: u64,
    pub(crate) etag: Option<String>,
    pub(crate) version_id: Option<String>,
}

impl ObjectStat {
    /// Total size of the object in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// ETag of the object at the time it was stat'd.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Version id of the object, if the bucket is versioned.
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }
}

/// A destination part that has been copied, identified by part number and the
/// ETag the service assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub(crate) part_number: u64,
    pub(crate) etag: String,
}

impl CompletedPart {
    /// The destination part number.
    pub fn part_number(&self) -> u64 {
        self.part_number
    }

    /// The ETag the service assigned to the copied part.
    pub fn etag(&self) -> &str {
        &self.etag
    }
}

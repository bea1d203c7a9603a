/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Metadata for the destination object written by a compose operation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ComposeOutput {
    /// Bucket the object was written to
    pub bucket: String,

    /// Key of the composed object
    pub key: String,

    /// Entity tag of the composed object
    pub e_tag: Option<String>,

    /// Version id of the composed object, if the bucket is versioned
    pub version_id: Option<String>,

    /// Total size of the composed object in bytes
    pub object_size: u64,

    /// ID of the multipart upload the object was assembled through.
    /// `None` when the composition reduced to a single direct copy.
    pub upload_id: Option<String>,
}

impl ComposeOutput {
    /// Entity tag of the composed object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// Version id of the composed object, if the bucket is versioned
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Total size of the composed object in bytes
    pub fn object_size(&self) -> u64 {
        self.object_size
    }

    /// ID of the multipart upload, when one was used
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Client-side engine for S3-compatible object stores.
//!
//! Two subsystems make up the engine: server-side composition of a large
//! destination object from one or more source objects via the multipart
//! upload protocol, and the binary event-stream decoder behind
//! `SelectObjectContent`. Request signing, connection management, and
//! HTTP-level retries live behind the [`transport::SignedTransport`] seam.

#![warn(
    missing_debug_implementations,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `s3-object-engine`
pub mod error;

/// Common types used by `s3-object-engine`
pub mod types;

/// Engine configuration
pub mod config;

/// The signed-request seam the engine issues all network calls through
pub mod transport;

/// Engine client
pub mod client;

/// Engine operations
pub mod operation;

mod xml;

pub use client::Client;
pub use config::Config;

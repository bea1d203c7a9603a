/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of engine errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues, detected before any network call is made
    InputInvalid,

    /// A frame in a select response failed CRC verification. Always fatal,
    /// decoding stops at the offending frame.
    ChecksumMismatch,

    /// Malformed frame or unexpected framing in a select response
    Protocol,

    /// The remote service reported an error (an error event in a select
    /// response, or an HTTP-level failure)
    Remote,

    /// Failed to stat a source object; nothing was initiated
    SourceStatFailed,

    /// Failed to copy a byte range into a destination part
    PartCopyFailed(PartFailed),

    /// All parts copied but completing the multipart upload failed
    CompletionFailed,

    /// The operation was cancelled by the caller
    OperationCancelled,

    /// Some kind of internal runtime issue (e.g. task failure)
    RuntimeError,
}

/// Stores information about a failed part copy
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartFailed {
    part_number: u64,
}

impl PartFailed {
    /// The destination part number of the copy that failed.
    pub fn part_number(&self) -> u64 {
        self.part_number
    }
}

/// An error reported by the storage service, carrying the code and message
/// exactly as the service sent them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteError {
    code: String,
    message: String,
}

impl RemoteError {
    pub(crate) fn new(code: impl Into<String>, message: impl Into<String>) -> RemoteError {
        RemoteError {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The error code reported by the service.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The error message reported by the service.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RemoteError {}

impl Error {
    /// Creates a new engine [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// If the failure originated from the service, the code and message it reported.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        self.source.downcast_ref::<RemoteError>()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::ChecksumMismatch => write!(f, "event stream checksum mismatch"),
            ErrorKind::Protocol => write!(f, "protocol error"),
            ErrorKind::Remote => write!(f, "remote service error"),
            ErrorKind::SourceStatFailed => write!(f, "failed to stat source object"),
            ErrorKind::PartCopyFailed(part_failed) => {
                write!(f, "failed to copy part {}", part_failed.part_number)
            }
            ErrorKind::CompletionFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn protocol<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::Protocol, err)
}

pub(crate) fn checksum_mismatch(scope: &str, expected: u32, computed: u32) -> Error {
    Error::new(
        ErrorKind::ChecksumMismatch,
        format!("{scope} CRC mismatch: frame carries {expected:#010x}, computed {computed:#010x}"),
    )
}

pub(crate) fn remote(code: impl Into<String>, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Remote, RemoteError::new(code, message))
}

pub(crate) fn stat_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::SourceStatFailed, err)
}

pub(crate) fn part_copy_failed<E>(part_number: u64, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::PartCopyFailed(PartFailed { part_number }), err)
}

pub(crate) fn completion_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::CompletionFailed, err)
}

static CANCELLATION_ERROR: &str =
    "the operation was cancelled, all in-flight requests are being dropped";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}

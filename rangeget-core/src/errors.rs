use std::{io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

use crate::event::RangeFailure;

/// Errors that end a download as a whole.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(String),

    #[error("invalid input for '{field}': {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The metadata probe failed. Nothing has been written to disk.
    #[error("connection to {url} failed: {message}")]
    Probe { url: String, message: String },

    #[error("storage error at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// One or more ranges failed and the partial file was removed.
    /// `failures` holds the reason for each failed range, and
    /// `cleanup_error` is set when the removal itself failed.
    #[error("download failed: {failed} of {total} ranges failed")]
    DownloadFailed {
        failed: usize,
        total: usize,
        failures: Vec<RangeFailure>,
        cleanup_error: Option<io::Error>,
    },
}

/// Reason a single range could not be fetched and written.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    /// The server answered `200 OK` with the whole file instead of the requested span.
    #[error("server ignored the range request")]
    RangeIgnored,

    #[error("write failed: {0}")]
    Storage(#[from] io::Error),

    #[error("expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },

    #[error("task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Request(e) if e.is_timeout())
    }
}

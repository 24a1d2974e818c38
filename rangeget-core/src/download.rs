use std::path::{Path, PathBuf};

use reqwest::{header, Client};
use tracing::debug;

use crate::{errors::DownloadError, utils::file_name_from_url};

/// The file to download, as discovered by the metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    /// Size in bytes reported by the server. Fixed once probed.
    pub total_length: u64,
    /// Where the assembled file is written.
    pub local_path: PathBuf,
}

/// An inclusive `[start, end]` span of the file fetched by one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Range` request header for this span.
    pub fn header_value(&self) -> String {
        format!("bytes={start}-{end}", start = self.start, end = self.end)
    }
}

impl DownloadTarget {
    /// Sends a HEAD request to `url` and reads the content length.
    /// The local file name is checked first, so a URL without one
    /// never reaches the network.
    pub async fn probe(
        client: &Client,
        url: &str,
        output_dir: &Path,
    ) -> Result<Self, DownloadError> {
        let file_name = file_name_from_url(url)?;

        let probe_error = |message: String| DownloadError::Probe {
            url: url.to_string(),
            message,
        };

        let response = client
            .head(url)
            .send()
            .await
            .map_err(|e| probe_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(probe_error(format!("server responded with {}", response.status())));
        }

        // HEAD responses carry no body, so the header is read directly
        // instead of relying on the body size hint.
        let total_length = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .ok_or_else(|| probe_error(String::from("missing content length")))?
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| probe_error(String::from("unparseable content length")))?;

        debug!(url, total_length, "probed download target");

        Ok(DownloadTarget {
            url: url.to_string(),
            total_length,
            local_path: output_dir.join(file_name),
        })
    }
}

/// Splits `total_length` bytes into `workers` contiguous ranges.
///
/// Every range has `total_length / workers` bytes except the last, which also
/// takes the remainder. The result partitions `[0, total_length - 1]` with no
/// gap and no overlap; concurrent writers rely on this to share the output file
/// without locking. A zero-length file yields no ranges, and when there are
/// fewer bytes than workers the worker count drops to one byte per range.
pub fn plan(total_length: u64, workers: usize) -> Result<Vec<ByteRange>, DownloadError> {
    if workers == 0 {
        return Err(DownloadError::InvalidInput {
            field: "workers",
            message: String::from("at least one worker is required"),
        });
    }

    if total_length == 0 {
        return Ok(Vec::new());
    }

    let workers = (workers as u64).min(total_length);
    let part_size = total_length / workers;

    let ranges = (0..workers)
        .map(|i| {
            let start = i * part_size;
            ByteRange {
                index: i as usize,
                start,
                end: if i + 1 != workers {
                    start + part_size - 1
                } else {
                    total_length - 1
                },
            }
        })
        .collect();

    Ok(ranges)
}

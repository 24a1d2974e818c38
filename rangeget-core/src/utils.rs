use std::{io, path::Path};

use reqwest::Url;
use tokio::fs::OpenOptions;

use crate::errors::DownloadError;

/// Parses a user supplied worker count. Anything that is not a positive
/// integer is rejected with the raw value in the error.
pub fn parse_worker_count(raw: &str) -> Result<usize, DownloadError> {
    match raw.trim().parse::<i64>() {
        Ok(count) if count > 0 => {
            usize::try_from(count).map_err(|_| DownloadError::InvalidWorkerCount(raw.to_string()))
        }
        _ => Err(DownloadError::InvalidWorkerCount(raw.to_string())),
    }
}

/// Gets the local file name from a download url: the last path segment,
/// without query string or fragment.
pub fn file_name_from_url(url: &str) -> Result<String, DownloadError> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{url}: {e}")))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .ok_or_else(|| DownloadError::InvalidUrl(format!("{url}: no file name in path")))
}

/// Creates (or truncates) the download file and sizes it to `size` bytes.
/// The extended region reads back as zeros.
pub async fn create_download_file(path: &Path, size: u64) -> io::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;
    file.set_len(size).await?;
    file.sync_all().await
}

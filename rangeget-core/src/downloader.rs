use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use futures::future::join_all;
use futures_util::StreamExt;
use reqwest::{header, Client, StatusCode};
use tokio::{
    fs,
    sync::mpsc::{self, UnboundedSender},
    task,
};
use tracing::{debug, error, info, warn};

use crate::{
    download::{plan, ByteRange, DownloadTarget},
    errors::{DownloadError, FetchError},
    event::{DownloadResult, Event, FetchOutcome, Progress},
    storage::RangeWriter,
    utils::create_download_file,
};

/// Per request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory to store the file. The path has to exist.
    pub output_dir: PathBuf,
    /// Timeout applied to the probe and to each range request, body included.
    pub request_timeout: Duration,
    /// Extra attempts for a failed range. Only the failed range is fetched again.
    pub max_retries: u32,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        DownloadOptions {
            output_dir: PathBuf::from("."),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: 0,
        }
    }
}

/// Downloads a file over several concurrent range requests.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    options: DownloadOptions,
}

impl Downloader {
    pub fn new(options: DownloadOptions) -> Result<Self, DownloadError> {
        if !options.output_dir.is_dir() {
            return Err(DownloadError::InvalidInput {
                field: "output_dir",
                message: format!(
                    "{} doesn't exist or path leads to a file",
                    options.output_dir.display()
                ),
            });
        }

        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Downloader { client, options })
    }

    /// Probes `url` and downloads it with `workers` concurrent range requests.
    /// Returns the path of the assembled file.
    pub async fn download(&self, url: &str, workers: usize) -> Result<PathBuf, DownloadError> {
        if workers == 0 {
            return Err(DownloadError::InvalidWorkerCount(workers.to_string()));
        }
        let target = self.probe(url).await?;
        self.run(&target, workers, |_| {}).await
    }

    pub async fn probe(&self, url: &str) -> Result<DownloadTarget, DownloadError> {
        info!(url, "probing download target");
        DownloadTarget::probe(&self.client, url, &self.options.output_dir).await
    }

    /// Allocates the output file, fetches every range and decides the verdict.
    ///
    /// On failure the partial file is removed before returning.
    pub async fn run<P>(
        &self,
        target: &DownloadTarget,
        workers: usize,
        mut on_progress: P,
    ) -> Result<PathBuf, DownloadError>
    where
        P: FnMut(Progress),
    {
        let ranges = plan(target.total_length, workers)?;
        let path = target.local_path.clone();

        debug!(path = %path.display(), size = target.total_length, "allocating output file");
        create_download_file(&path, target.total_length)
            .await
            .map_err(|source| DownloadError::Storage {
                path: path.clone(),
                source,
            })?;

        if ranges.is_empty() {
            info!(path = %path.display(), "empty file, nothing to fetch");
            on_progress(Progress {
                downloaded: 0,
                total: 0,
            });
            return Ok(path);
        }

        info!(url = %target.url, ranges = ranges.len(), "download starting");

        let total_ranges = ranges.len();
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let mut join_handles = Vec::with_capacity(total_ranges);
        for range in ranges.into_iter() {
            let tx = tx.clone();
            let client = self.client.clone();
            let url = target.url.clone();
            let path = path.clone();
            let total_length = target.total_length;
            let max_retries = self.options.max_retries;
            let h = task::spawn(async move {
                let outcome =
                    fetch_with_retries(&client, &url, &path, range, total_length, max_retries, &tx)
                        .await;
                let _ = tx.send(Event::Finished {
                    index: range.index,
                    outcome,
                });
            });
            join_handles.push(h);
        }
        // Only the tasks hold senders now, so the channel closes once all of them are done.
        drop(tx);

        let mut result = DownloadResult::default();
        let mut written = vec![0u64; total_ranges];
        let mut downloaded = 0u64;

        while let Some(event) = rx.recv().await {
            match event {
                Event::ProgressChanged { index, written: w } => {
                    downloaded = downloaded - written[index] + w;
                    written[index] = w;
                    on_progress(Progress {
                        downloaded,
                        total: target.total_length,
                    });
                }
                Event::Finished { index, outcome } => {
                    if let FetchOutcome::Failed(e) = &outcome {
                        warn!(range = index, timed_out = e.is_timeout(), error = %e, "range failed");
                    }
                    result.record(index, outcome);
                }
            }
        }

        for (index, joined) in join_all(join_handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!(range = index, error = %e, "range task panicked");
                result.record(
                    index,
                    FetchOutcome::Failed(FetchError::Aborted(e.to_string())),
                );
            }
        }

        self.finalize(&path, total_ranges, result).await
    }

    async fn finalize(
        &self,
        path: &Path,
        total: usize,
        result: DownloadResult,
    ) -> Result<PathBuf, DownloadError> {
        if result.is_success() {
            info!(path = %path.display(), "download successful");
            return Ok(path.to_path_buf());
        }

        let cleanup_error = match fs::remove_file(path).await {
            Ok(()) => None,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to remove incomplete file");
                Some(e)
            }
        };

        warn!(failed = result.failed, total, "download failed");
        Err(DownloadError::DownloadFailed {
            failed: result.failed,
            total,
            failures: result.failures,
            cleanup_error,
        })
    }
}

async fn fetch_with_retries(
    client: &Client,
    url: &str,
    path: &Path,
    range: ByteRange,
    total_length: u64,
    max_retries: u32,
    tx: &UnboundedSender<Event>,
) -> FetchOutcome {
    let mut attempt = 0;
    loop {
        match fetch_range(client, url, path, range, total_length, tx).await {
            Ok(()) => return FetchOutcome::Success,
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(range = range.index, attempt, error = %e, "retrying range");
                let _ = tx.send(Event::ProgressChanged {
                    index: range.index,
                    written: 0,
                });
            }
            Err(e) => return FetchOutcome::Failed(e),
        }
    }
}

/// Downloads one range and writes it at its offset in the output file.
/// Nothing is written unless the server accepted the range request; the body
/// is streamed in, so a range failing midway may leave a partial span until
/// the coordinator removes the file.
async fn fetch_range(
    client: &Client,
    url: &str,
    path: &Path,
    range: ByteRange,
    total_length: u64,
    tx: &UnboundedSender<Event>,
) -> Result<(), FetchError> {
    debug!(range = range.index, start = range.start, end = range.end, "fetching range");

    let response = client
        .get(url)
        .header(header::RANGE, range.header_value())
        .send()
        .await?;

    match response.status() {
        StatusCode::PARTIAL_CONTENT => {}
        StatusCode::OK if range.start == 0 && range.len() == total_length => {}
        StatusCode::OK => return Err(FetchError::RangeIgnored),
        status => return Err(FetchError::Status(status)),
    }

    let mut writer = RangeWriter::open(path, range).await?;
    let mut bytes_stream = response.bytes_stream();

    while let Some(data) = bytes_stream.next().await {
        writer.write(&data?).await?;
        let _ = tx.send(Event::ProgressChanged {
            index: range.index,
            written: writer.written(),
        });
    }

    let received = writer.finish().await?;
    if received != range.len() {
        return Err(FetchError::Incomplete {
            expected: range.len(),
            received,
        });
    }

    debug!(range = range.index, bytes = received, "range complete");
    Ok(())
}

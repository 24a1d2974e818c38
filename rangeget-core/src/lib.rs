//! Concurrent ranged HTTP downloads.
//!
//! A file is probed for its size, split into contiguous byte ranges, and each
//! range is fetched by its own task and written straight to its offset in a
//! preallocated output file.

pub mod download;
pub mod downloader;
pub mod errors;
pub mod event;
pub mod storage;
pub mod utils;

pub use download::{plan, ByteRange, DownloadTarget};
pub use downloader::{DownloadOptions, Downloader};
pub use errors::{DownloadError, FetchError};
pub use event::{DownloadResult, FetchOutcome, Progress, RangeFailure};
pub use utils::parse_worker_count;

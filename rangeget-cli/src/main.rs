use clap::Parser;
use commands::handle_download;
use rangeget_core::parse_worker_count;
use std::{path::PathBuf, process};
use tracing::Level;

pub mod commands;

/// Download a file over several concurrent HTTP range requests
#[derive(Parser)]
#[clap(name = "rangeget", version)]
struct RangeGet {
    /// URL of the file to download
    #[clap(value_parser)]
    url: String,
    /// Number of concurrent range requests
    #[clap(value_parser = parse_worker_count, allow_hyphen_values = true)]
    workers: usize,
    /// Directory to store the file in
    #[clap(long, short, value_parser, default_value = ".")]
    output_dir: PathBuf,
    /// Timeout in seconds for each request
    #[clap(long, value_parser, default_value_t = 60)]
    timeout: u64,
    /// Extra attempts for a failed range
    #[clap(long, value_parser, default_value_t = 0)]
    retries: u32,
    /// Log every range as it is fetched
    #[clap(long, short, action)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = RangeGet::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let successful = handle_download(
        args.url,
        args.workers,
        args.output_dir,
        args.timeout,
        args.retries,
    )
    .await
    .is_ok();

    if !successful {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = RangeGet::try_parse_from([
            "rangeget",
            "https://go.dev/dl/go1.18.3.linux-amd64.tar.gz",
            "8",
            "--output-dir",
            "/tmp",
            "--retries",
            "2",
        ])
        .unwrap();

        assert_eq!(args.workers, 8);
        assert_eq!(args.output_dir, PathBuf::from("/tmp"));
        assert_eq!(args.timeout, 60);
        assert_eq!(args.retries, 2);
        assert!(!args.verbose);
    }

    #[test]
    fn test_rejects_bad_worker_counts() {
        for raw in ["0", "-3", "abc"] {
            let err = RangeGet::try_parse_from(["rangeget", "https://hello.com/smallFile.zip", raw])
                .err()
                .unwrap();

            assert!(err.to_string().contains(raw), "{err}");
        }
    }
}

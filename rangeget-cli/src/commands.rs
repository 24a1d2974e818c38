use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use rangeget_core::{DownloadError, DownloadOptions, Downloader, RangeFailure};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";

pub async fn handle_download(
    url: String,
    workers: usize,
    output_dir: PathBuf,
    timeout: u64,
    max_retries: u32,
) -> Result<(), ()> {
    let downloader = match Downloader::new(DownloadOptions {
        output_dir,
        request_timeout: Duration::from_secs(timeout),
        max_retries,
    }) {
        Ok(downloader) => downloader,
        Err(e) => {
            eprintln!("{}", e);
            return Err(());
        }
    };

    println!("Profiling file to download....");
    let target = match downloader.probe(&url).await {
        Ok(target) => target,
        Err(DownloadError::Probe { .. }) => {
            eprintln!("Connection to URL failed. Recheck internet connection or URL entered");
            return Err(());
        }
        Err(e) => {
            eprintln!("{}", e);
            return Err(());
        }
    };

    println!(
        "File Name : {fname}\nFile Size : {fsize} bytes\n",
        fname = target.local_path.display(),
        fsize = target.total_length
    );

    let bar = ProgressBar::new(target.total_length);
    if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        bar.set_style(style.progress_chars("#>-"));
    }

    println!("Download starting");
    let result = downloader
        .run(&target, workers, |progress| bar.set_position(progress.downloaded))
        .await;
    bar.finish_and_clear();

    match result {
        Ok(path) => {
            println!("Download successful : {}", path.display());
            Ok(())
        }
        Err(DownloadError::DownloadFailed {
            failed,
            failures,
            cleanup_error,
            ..
        }) => {
            for line in failure_report(failed, &failures, cleanup_error.as_ref(), &target.local_path) {
                eprintln!("{}", line);
            }
            Err(())
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(())
        }
    }
}

/// Lines printed when a download fails: the failed count, one line per failed
/// range, and a warning when the incomplete file could not be removed.
fn failure_report(
    failed: usize,
    failures: &[RangeFailure],
    cleanup_error: Option<&io::Error>,
    path: &Path,
) -> Vec<String> {
    let mut lines = vec![format!("Download failed. Ranges failed : {}", failed)];
    lines.extend(
        failures
            .iter()
            .map(|failure| format!("  range {} : {}", failure.index, failure.reason)),
    );
    if let Some(e) = cleanup_error {
        lines.push(format!(
            "Could not remove incomplete file {} : {}",
            path.display(),
            e
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_out_range() -> Vec<RangeFailure> {
        vec![RangeFailure {
            index: 2,
            reason: String::from("request failed: operation timed out"),
        }]
    }

    #[test]
    fn test_failure_report_lists_failed_ranges() {
        let lines = failure_report(1, &timed_out_range(), None, Path::new("main.zip"));

        assert_eq!(
            lines,
            vec![
                String::from("Download failed. Ranges failed : 1"),
                String::from("  range 2 : request failed: operation timed out"),
            ]
        );
    }

    #[test]
    fn test_failure_report_names_leftover_file() {
        let cleanup_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");

        let lines = failure_report(
            1,
            &timed_out_range(),
            Some(&cleanup_error),
            Path::new("main.zip"),
        );

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Could not remove incomplete file main.zip : denied");
    }
}

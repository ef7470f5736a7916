mod common;

use std::{collections::HashMap, path::Path, time::Duration};

use common::{refused_url, serve, Reply};
use gsod_sync::{DiffKey, DownloadError, DownloadTask, Downloader, RetryPolicy};
use indicatif::ProgressBar;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const ARCHIVE: &str = "2021.tar.gz";

fn task(base_url: &str, data_dir: &Path) -> DownloadTask {
    let key = DiffKey {
        timestamped_name: "2021_ts_20210331_0838.tar.gz".to_string(),
        canonical_name: ARCHIVE.to_string(),
    };
    DownloadTask::new(&key, base_url, data_dir)
}

fn downloader(attempts: u32, stall: Duration, cancel: CancellationToken) -> Downloader {
    Downloader::new(
        reqwest::Client::new(),
        RetryPolicy::new(attempts, Duration::from_millis(10)),
        stall,
        cancel,
    )
}

fn route(reply: Reply) -> HashMap<String, Reply> {
    HashMap::from([(format!("/archive/{}", ARCHIVE), reply)])
}

fn archive_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn should_write_complete_archive_to_timestamped_path() {
    let tmp = TempDir::new().unwrap();
    let body = vec![7u8; 64 * 1024];
    let base = serve(route(Reply::ok(body.clone()))).await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let path = downloader(3, Duration::from_secs(5), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(path, tmp.path().join("2021").join("2021_ts_20210331_0838.tar.gz"));
    assert_eq!(std::fs::read(&path).unwrap(), body);
}

#[tokio::test]
async fn should_report_missing_archive_as_invalid_url() {
    let tmp = TempDir::new().unwrap();
    let base = serve(route(Reply::status(404))).await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let err = downloader(3, Duration::from_secs(5), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    assert!(err.is_skippable());
    assert_eq!(archive_files(&task.destination_dir), 0);
}

#[tokio::test]
async fn should_give_up_after_refused_connections() {
    let tmp = TempDir::new().unwrap();
    let base = refused_url().await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let err = downloader(2, Duration::from_secs(5), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::ConnectionRefused { .. }));
    assert!(!task.destination_path().exists());
}

#[tokio::test]
async fn should_remove_truncated_archive() {
    let tmp = TempDir::new().unwrap();
    let base = serve(route(Reply::Truncated {
        body: vec![1u8; 1000],
        claimed: 5000,
    }))
    .await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let err = downloader(1, Duration::from_secs(5), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Unexpected { .. }));
    assert_eq!(archive_files(&task.destination_dir), 0);
}

#[tokio::test]
async fn should_time_out_silent_server() {
    let tmp = TempDir::new().unwrap();
    let base = serve(route(Reply::Silent)).await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let err = downloader(1, Duration::from_millis(200), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Timeout { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn should_time_out_stalled_body_and_remove_partial_file() {
    let tmp = TempDir::new().unwrap();
    let base = serve(route(Reply::Stall {
        body: vec![1u8; 512],
        claimed: 4096,
    }))
    .await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let err = downloader(2, Duration::from_millis(200), CancellationToken::new())
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Timeout { .. }));
    assert_eq!(archive_files(&task.destination_dir), 0);
}

#[tokio::test]
async fn should_remove_partial_file_when_cancelled() {
    let tmp = TempDir::new().unwrap();
    let base = serve(route(Reply::Stall {
        body: vec![1u8; 512],
        claimed: 4096,
    }))
    .await;
    let task = task(&format!("{}/archive", base), tmp.path());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let err = downloader(3, Duration::from_secs(30), cancel)
        .fetch(&task, &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Cancelled { .. }));
    assert_eq!(archive_files(&task.destination_dir), 0);
}

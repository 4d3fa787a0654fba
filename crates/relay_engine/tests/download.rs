use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use relay_core::{AllowList, JobRegistry, JobStatus, NotificationFeed, NotificationKind};
use relay_engine::{Downloader, UpstreamClient, UpstreamSettings};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn downloader() -> (Downloader, Arc<JobRegistry>, Arc<NotificationFeed>) {
    let allow = AllowList::with_extra_hosts(vec!["127.0.0.1".to_string()]);
    let upstream = Arc::new(UpstreamClient::new(UpstreamSettings::default(), allow).unwrap());
    let jobs = Arc::new(JobRegistry::new());
    let notifications = Arc::new(NotificationFeed::default());
    (
        Downloader::new(upstream, jobs.clone(), notifications.clone()),
        jobs,
        notifications,
    )
}

#[tokio::test]
async fn successful_download_completes_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/weights.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "10")
                .set_body_bytes(b"0123456789".to_vec()),
        )
        .mount(&server)
        .await;

    let (downloader, jobs, notifications) = downloader();
    let temp = TempDir::new().unwrap();
    let url = format!("{}/files/weights.bin", server.uri());
    let id = jobs.create(&url, temp.path().to_string_lossy());

    downloader.run(id, &url, temp.path(), None).await;

    let job = jobs.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.bytes_received, 10);
    assert_eq!(job.bytes_total, Some(10));

    let saved = temp.path().join("weights.bin");
    assert_eq!(fs::read(&saved).unwrap(), b"0123456789");

    let items = notifications.list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, NotificationKind::Success);
}

#[tokio::test]
async fn explicit_filename_overrides_the_derived_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let (downloader, jobs, _) = downloader();
    let temp = TempDir::new().unwrap();
    let url = format!("{}/blob", server.uri());
    let id = jobs.create(&url, temp.path().to_string_lossy());

    downloader
        .run(id, &url, temp.path(), Some("renamed.bin".to_string()))
        .await;

    assert!(temp.path().join("renamed.bin").exists());
}

#[tokio::test]
async fn traversal_filename_stays_inside_the_download_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let (downloader, jobs, _) = downloader();
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloads");
    fs::create_dir(&dest).unwrap();
    let url = format!("{}/blob", server.uri());
    let id = jobs.create(&url, dest.to_string_lossy());

    downloader
        .run(id, &url, &dest, Some("../evil.bin".to_string()))
        .await;

    assert_eq!(jobs.get(id).unwrap().status, JobStatus::Completed);
    assert!(dest.join("evil.bin").exists());
    assert!(!temp.path().join("evil.bin").exists());
}

#[tokio::test]
async fn upstream_failure_fails_the_job_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/missing.bin"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (downloader, jobs, notifications) = downloader();
    let temp = TempDir::new().unwrap();
    let url = format!("{}/files/missing.bin", server.uri());
    let id = jobs.create(&url, temp.path().to_string_lossy());

    downloader.run(id, &url, temp.path(), None).await;

    let job = jobs.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error.is_some());
    assert!(!temp.path().join("missing.bin").exists());

    let items = notifications.list();
    assert_eq!(items[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn cancelled_job_keeps_its_cancelled_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/slow.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1 << 16]))
        .mount(&server)
        .await;

    let (downloader, jobs, notifications) = downloader();
    let temp = TempDir::new().unwrap();
    let url = format!("{}/files/slow.bin", server.uri());
    let id = jobs.create(&url, temp.path().to_string_lossy());

    // Cancel before the first chunk is consumed.
    assert!(jobs.cancel(id));
    downloader.run(id, &url, temp.path(), None).await;

    let job = jobs.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(!temp.path().join("slow.bin").exists());
    assert!(notifications.is_empty());
}

/// SourceLoader 的 HTTP 路径，以及它和预加载队列的端到端配合
use std::time::Duration;

use media_preloader::error::LoadError;
use media_preloader::loader::{Container, MediaLoader, SourceLoader, SourceLoaderConfig};
use media_preloader::preloader::{PreloadConfig, PreloadEvent, spawn_preloader};
use tokio::time::timeout;

fn loader(probe_bytes: usize) -> SourceLoader {
    SourceLoader::new(SourceLoaderConfig {
        http_timeout_secs: 5,
        http_connect_timeout_secs: 5,
        probe_bytes,
    })
}

fn mp4_body(len: usize) -> Vec<u8> {
    let mut body = vec![0, 0, 0, 0x20];
    body.extend_from_slice(b"ftypisom");
    body.resize(len, 0);
    body
}

#[tokio::test]
async fn http_range_request_reads_head_only() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/clip.mp4")
        .match_header("range", "bytes=0-15")
        .with_status(206)
        .with_header("content-type", "video/mp4")
        .with_header("content-range", "bytes 0-15/4096")
        .with_body(mp4_body(32))
        .create_async()
        .await;

    let url = format!("{}/clip.mp4", server.url());
    let handle = loader(16).load(&url).await.expect("load");

    mock.assert_async().await;
    assert_eq!(handle.head_len(), 16);
    assert_eq!(handle.container, Container::Mp4);
    assert_eq!(handle.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(handle.content_length, Some(4096));
    assert_eq!(handle.source, url);
}

#[tokio::test]
async fn http_error_status_is_a_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing.webm")
        .with_status(404)
        .create_async()
        .await;

    let url = format!("{}/missing.webm", server.url());
    let err = loader(16).load(&url).await.expect_err("404");
    match err {
        LoadError::Status { status, url: u } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(u, url);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_empty_body_is_a_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/empty.mp4")
        .with_status(200)
        .create_async()
        .await;

    let url = format!("{}/empty.mp4", server.url());
    let err = loader(16).load(&url).await.expect_err("empty");
    assert!(matches!(err, LoadError::Empty(_)));
}

#[tokio::test]
async fn preloader_over_http_keeps_going_after_failure() {
    let mut server = mockito::Server::new_async().await;
    let _broken = server
        .mock("GET", "/broken.mp4")
        .with_status(500)
        .create_async()
        .await;
    let _ok = server
        .mock("GET", "/ok.mp4")
        .with_status(200)
        .with_body(mp4_body(64))
        .create_async()
        .await;

    let broken = format!("{}/broken.mp4", server.url());
    let ok = format!("{}/ok.mp4", server.url());

    let (preloader, mut events) = spawn_preloader(
        loader(32),
        PreloadConfig {
            lookahead: 3,
            drain_delay: Duration::from_millis(1),
            command_capacity: 16,
        },
    );
    preloader
        .initialize([broken.clone(), ok.clone()])
        .await
        .expect("initialize");

    let mut failed = Vec::new();
    loop {
        match timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("事件超时")
        {
            Some(PreloadEvent::LoadFailed { id, .. }) => failed.push(id),
            Some(PreloadEvent::Idle) => break,
            Some(_) => {}
            None => panic!("事件 channel 已关闭"),
        }
    }

    assert_eq!(failed, vec![broken.clone()]);
    assert!(!preloader.is_loaded(broken).await.expect("query"));
    let handle = preloader.handle(ok).await.expect("query").expect("loaded");
    assert_eq!(handle.container, Container::Mp4);
    assert_eq!(handle.head_len(), 32);
}

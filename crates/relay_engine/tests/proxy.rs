use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use relay_core::AllowList;
use relay_engine::{ProxyStream, UpstreamClient, UpstreamError, UpstreamSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_client() -> UpstreamClient {
    let allow = AllowList::with_extra_hosts(vec!["127.0.0.1".to_string()]);
    UpstreamClient::new(UpstreamSettings::default(), allow).unwrap()
}

async fn collect(stream: ProxyStream) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut body = stream.body;
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk.expect("chunk ok"));
    }
    bytes
}

#[tokio::test]
async fn proxy_streams_body_and_passes_safe_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/data.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .insert_header("ETag", "\"abc123\"")
                .insert_header("X-Internal-Secret", "do-not-forward")
                .set_body_bytes(b"0123456789".to_vec()),
        )
        .mount(&server)
        .await;

    let client = local_client();
    let stream = client
        .open_proxy(&format!("{}/files/data.bin", server.uri()))
        .await
        .expect("proxy ok");

    assert_eq!(stream.status, 200);
    assert_eq!(stream.filename, "data.bin");
    let names: Vec<&str> = stream.headers.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"content-type"));
    assert!(names.contains(&"etag"));
    assert!(!names.contains(&"x-internal-secret"));

    assert_eq!(collect(stream).await, b"0123456789");
}

#[tokio::test]
async fn proxy_prefers_upstream_disposition_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"model.gguf\"")
                .set_body_bytes(b"gg".to_vec()),
        )
        .mount(&server)
        .await;

    let client = local_client();
    let stream = client
        .open_proxy(&format!("{}/blob", server.uri()))
        .await
        .expect("proxy ok");
    assert_eq!(stream.filename, "model.gguf");
}

#[tokio::test]
async fn proxy_follows_redirects_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new/file.bin"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/file.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"moved".to_vec()))
        .mount(&server)
        .await;

    let client = local_client();
    let stream = client
        .open_proxy(&format!("{}/old", server.uri()))
        .await
        .expect("proxy ok");
    assert_eq!(stream.filename, "file.bin");
    assert_eq!(collect(stream).await, b"moved");
}

#[tokio::test]
async fn proxy_propagates_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = local_client();
    let Err(err) = client.open_proxy(&format!("{}/gone", server.uri())).await else {
        panic!("expected an upstream status error");
    };
    assert!(matches!(err, UpstreamError::Status(404)));
}

#[tokio::test]
async fn proxy_rejects_disallowed_host() {
    let client = UpstreamClient::new(UpstreamSettings::default(), AllowList::default()).unwrap();
    let Err(err) = client.open_proxy("https://example.com/file.bin").await else {
        panic!("expected a host rejection");
    };
    assert!(matches!(err, UpstreamError::HostNotAllowed(_)));
}

use pretty_assertions::assert_eq;
use relay_core::AllowList;
use relay_engine::{UpstreamClient, UpstreamError, UpstreamSettings};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_client() -> UpstreamClient {
    let allow = AllowList::with_extra_hosts(vec!["127.0.0.1".to_string()]);
    UpstreamClient::new(UpstreamSettings::default(), allow).unwrap()
}

#[tokio::test]
async fn resolve_reads_metadata_from_head() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/files/model.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "2048")
                .insert_header("Content-Disposition", "attachment; filename=\"x.bin\""),
        )
        .mount(&server)
        .await;

    let client = local_client();
    let url = format!("{}/files/model.bin", server.uri());
    let resolution = client.resolve(&url).await.expect("resolve ok");

    assert!(resolution.ok);
    assert_eq!(resolution.status, 200);
    assert_eq!(resolution.final_url, url);
    assert_eq!(resolution.filename, "x.bin");
    assert_eq!(resolution.size_bytes, Some(2048));
}

#[tokio::test]
async fn resolve_follows_redirects_to_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/hop"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/hop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/final/weights.bin"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/final/weights.bin"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Length", "7"))
        .mount(&server)
        .await;

    let client = local_client();
    let resolution = client
        .resolve(&format!("{}/start", server.uri()))
        .await
        .expect("resolve ok");

    assert!(resolution.ok);
    assert_eq!(
        resolution.final_url,
        format!("{}/final/weights.bin", server.uri())
    );
    assert_eq!(resolution.filename, "weights.bin");
}

#[tokio::test]
async fn resolve_fails_past_the_redirect_limit() {
    let server = MockServer::start().await;
    // Every hop redirects back to itself.
    Mock::given(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let client = local_client();
    let err = client
        .resolve(&format!("{}/loop", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::TooManyRedirects { limit: 5 }));
}

#[tokio::test]
async fn resolve_falls_back_to_get_when_head_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/get-only"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-only"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "11")
                .set_body_string("hello world"),
        )
        .mount(&server)
        .await;

    let client = local_client();
    let resolution = client
        .resolve(&format!("{}/get-only", server.uri()))
        .await
        .expect("resolve ok");

    assert!(resolution.ok);
    assert_eq!(resolution.status, 200);
    assert_eq!(resolution.filename, "get-only");
    assert_eq!(resolution.size_bytes, Some(11));
}

#[tokio::test]
async fn resolve_reports_upstream_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = local_client();
    let resolution = client
        .resolve(&format!("{}/missing", server.uri()))
        .await
        .expect("resolve still returns metadata");

    assert!(!resolution.ok);
    assert_eq!(resolution.status, 404);
}

#[tokio::test]
async fn disallowed_host_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    // Client without the mock host on its allow-list.
    let client =
        UpstreamClient::new(UpstreamSettings::default(), AllowList::default()).unwrap();
    let err = client
        .resolve(&format!("{}/files/model.bin", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::HostNotAllowed(_)));

    server.verify().await;
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let client =
        UpstreamClient::new(UpstreamSettings::default(), AllowList::default()).unwrap();
    let err = client.resolve("not a url").await.unwrap_err();
    assert!(matches!(err, UpstreamError::InvalidUrl(_)));
}

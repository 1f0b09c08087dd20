use std::time::Duration;

use cookbook_engine::{FailureKind, FetchRequest, FetchSettings, ReqwestTransport, Transport};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn transport_returns_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", "AutomationsCookbook/1.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(FetchSettings::default()).unwrap();
    let url = format!("{}/doc", server.uri());

    let response = transport.send(&FetchRequest::get(&url)).await.expect("fetch ok");
    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, url);
    assert!(response.content_type.unwrap().starts_with("text/html"));
    assert_eq!(response.body, b"<html>ok</html>");
}

#[tokio::test]
async fn transport_sends_query_pairs_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .and(query_param("rows", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer k"))
        .and(body_string(r#"{"a":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(FetchSettings::default()).unwrap();
    let search = FetchRequest::get(format!("{}/search", server.uri()))
        .query("page", 2)
        .query("rows", 50);
    assert_eq!(transport.send(&search).await.unwrap().body, b"[]");

    let chat = FetchRequest::post_json(format!("{}/chat", server.uri()), r#"{"a":1}"#.to_string())
        .header("Authorization", "Bearer k");
    assert_eq!(transport.send(&chat).await.unwrap().body, b"{}");
}

#[tokio::test]
async fn transport_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(FetchSettings::default()).unwrap();

    let err = transport
        .send(&FetchRequest::get(format!("{}/missing", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert!(!err.is_transient());

    let err = transport
        .send(&FetchRequest::get(format!("{}/busy", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(429));
    assert!(err.is_transient());
}

#[tokio::test]
async fn transport_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let transport = ReqwestTransport::new(settings).unwrap();

    let err = transport
        .send(&FetchRequest::get(format!("{}/slow", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_transient());
}

#[tokio::test]
async fn transport_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let transport = ReqwestTransport::new(settings).unwrap();

    let err = transport
        .send(&FetchRequest::get(format!("{}/large", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn transport_rejects_unsupported_scheme() {
    let transport = ReqwestTransport::new(FetchSettings::default()).unwrap();
    let err = transport
        .send(&FetchRequest::get("ftp://example.com/file"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

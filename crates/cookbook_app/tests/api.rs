use std::fs;
use std::path::Path;

use cookbook_app::api;
use cookbook_core::{merge, Catalog, RawRecord, Source};
use cookbook_engine::CatalogStore;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn seed(dir: &Path, records: Vec<RawRecord>) {
    let (catalog, _) = merge(Catalog::new(), records);
    CatalogStore::new(dir.to_path_buf()).save(&catalog).unwrap();
}

fn standard_records() -> Vec<RawRecord> {
    vec![
        RawRecord::new(Source::N8n, "n8n:1").with_title("One"),
        RawRecord::new(Source::Zapier, "zapier:a").with_title("A"),
        RawRecord::new(Source::N8n, "n8n:2").with_title("Two"),
        RawRecord::new(Source::N8n, "n8n:3").with_title("Three"),
        RawRecord::new(Source::Zapier, "zapier:b").with_title("B"),
    ]
}

/// Starts the router on an ephemeral port and returns its base url.
async fn start(dir: &Path) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::router(CatalogStore::new(dir.to_path_buf()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn get(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    let body = response.text().await.unwrap();
    (status, serde_json::from_str(&body).unwrap())
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn lists_filters_and_limits_in_catalog_order() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), standard_records());
    let base = start(temp.path()).await;

    let (status, all) = get(&format!("{base}/templates")).await;
    assert_eq!(status, 200);
    assert_eq!(ids(&all), vec!["n8n:1", "zapier:a", "n8n:2", "n8n:3", "zapier:b"]);
    assert_eq!(all[0]["source"], "n8n");
    assert_eq!(all[0]["title"], "One");

    let (_, n8n) = get(&format!("{base}/templates?source=n8n&limit=2")).await;
    assert_eq!(ids(&n8n), vec!["n8n:1", "n8n:2"]);

    let (_, zapier) = get(&format!("{base}/templates?source=ZAPIER")).await;
    assert_eq!(ids(&zapier), vec!["zapier:a", "zapier:b"]);

    let (status, unknown) = get(&format!("{base}/templates?source=make")).await;
    assert_eq!(status, 200);
    assert_eq!(unknown, Value::Array(Vec::new()));

    let (_, none) = get(&format!("{base}/templates?limit=0")).await;
    assert_eq!(none, Value::Array(Vec::new()));
}

#[tokio::test]
async fn invalid_limit_is_a_bad_request() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), standard_records());
    let base = start(temp.path()).await;

    let (status, body) = get(&format!("{base}/templates?limit=-1")).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("invalid limit"));

    let (status, _) = get(&format!("{base}/templates?limit=ten")).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn options_is_ok_and_other_methods_are_rejected() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), standard_records());
    let base = start(temp.path()).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/templates");

    let options = client
        .request(reqwest::Method::OPTIONS, &url)
        .send()
        .await
        .unwrap();
    assert_eq!(options.status().as_u16(), 200);

    let post = client.post(&url).body("{}").send().await.unwrap();
    assert_eq!(post.status().as_u16(), 405);

    let delete = client.delete(&url).send().await.unwrap();
    assert_eq!(delete.status().as_u16(), 405);
}

#[tokio::test]
async fn cors_headers_are_sent() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), standard_records());
    let base = start(temp.path()).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/templates"))
        .header("Origin", "https://cookbook.example")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn catalog_is_reread_per_request() {
    let temp = TempDir::new().unwrap();
    let base = start(temp.path()).await;

    let (status, empty) = get(&format!("{base}/templates")).await;
    assert_eq!(status, 200);
    assert_eq!(empty, Value::Array(Vec::new()));

    seed(temp.path(), standard_records());
    let (_, filled) = get(&format!("{base}/templates?source=n8n")).await;
    assert_eq!(ids(&filled), vec!["n8n:1", "n8n:2", "n8n:3"]);
}

#[tokio::test]
async fn unreadable_catalog_is_a_server_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("templates.json"), "not json").unwrap();
    let base = start(temp.path()).await;

    let (status, body) = get(&format!("{base}/templates")).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("corrupt"));
}

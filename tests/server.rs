//! HTTP API tests against an in-memory store seeded from the fixture snapshot.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;

use glossary_core::store::memory::InMemoryStore;
use glossary_harness::config::parse_config;
use glossary_harness::connector_snapshot::parse_snapshot;
use glossary_harness::ingest::{apply_batch, prepare_batch};
use glossary_harness::server::{router, AppState};

const SNAPSHOT: &str = include_str!("fixtures/snapshot.json");

const CONFIG: &str = r#"
[db]
path = "unused.sqlite"

[tree.order]
security = 1
network = 2

[server]
bind = "127.0.0.1:0"
site_url = "https://glossary.example.com"
"#;

async fn spawn_server() -> SocketAddr {
    let config = parse_config(CONFIG).unwrap();
    let store = InMemoryStore::new();
    let batch = prepare_batch(parse_snapshot(SNAPSHOT).unwrap());
    apply_batch(&store, &batch).await.unwrap();

    let state = AppState::new(config, Arc::new(store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("http://{}{}", addr, path))
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let addr = spawn_server().await;
    let (status, body) = get_json(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_ranked() {
    let addr = spawn_server().await;
    let (status, body) = get_json(addr, "/api/terms?q=dns").await;
    assert_eq!(status, 200);
    assert_eq!(body["active"], true);
    assert_eq!(body["totalCount"], 3);

    let titles: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["term"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["DNS", "DNSSEC", "UDP (uses DNS lookups)"]);
    assert_eq!(body["results"][0]["tier"], "exact");
}

#[tokio::test]
async fn test_search_blank_is_inactive() {
    let addr = spawn_server().await;
    let (status, body) = get_json(addr, "/api/terms?q=").await;
    assert_eq!(status, 200);
    assert_eq!(body["active"], false);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_filters_and_limit() {
    let addr = spawn_server().await;

    let (_, body) = get_json(addr, "/api/terms?q=dns&difficulty=advanced").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["term"]["id"], "dnssec");

    let (_, body) = get_json(addr, "/api/terms?q=dns&limit=1").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalCount"], 3);
}

#[tokio::test]
async fn test_search_bad_requests() {
    let addr = spawn_server().await;

    let (status, body) = get_json(addr, "/api/terms?q=dns&difficulty=expert").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = get_json(addr, "/api/terms?q=dns&limit=0").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = get_json(addr, "/api/terms?q=dns&limit=abc").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_get_term() {
    let addr = spawn_server().await;

    let (status, body) = get_json(addr, "/api/terms/dns").await;
    assert_eq!(status, 200);
    assert_eq!(body["term"]["title"], "DNS");
    assert_eq!(body["difficultyLabel"], "初級");
    let crumbs: Vec<&str> = body["breadcrumb"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(crumbs, vec!["network", "protocols"]);
    assert_eq!(body["related"][0]["slug"], "udp");

    let (status, body) = get_json(addr, "/api/terms/encryption").await;
    assert_eq!(status, 200);
    assert_eq!(body["term"]["id"], "angou");
}

#[tokio::test]
async fn test_get_term_not_found() {
    let addr = spawn_server().await;
    let (status, body) = get_json(addr, "/api/terms/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "term not found: nope");
}

#[tokio::test]
async fn test_category_tree() {
    let addr = spawn_server().await;
    let (status, body) = get_json(addr, "/api/categories/tree").await;
    assert_eq!(status, 200);

    let roots: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(roots, vec!["security", "network", "orphan"]);
    assert_eq!(body["categories"][1]["children"][0]["id"], "protocols");
    assert_eq!(
        body["categories"][1]["children"][0]["terms"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_terms_by_category() {
    let addr = spawn_server().await;

    let (status, body) = get_json(addr, "/api/terms-by-category/protocols").await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["terms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["dns", "udp"]);
    assert_eq!(body["totalCount"], 2);

    let (status, body) = get_json(addr, "/api/terms-by-category/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_index() {
    let addr = spawn_server().await;

    let (status, body) = get_json(addr, "/api/index").await;
    assert_eq!(status, 200);
    assert_eq!(body["unindexed"], 1);
    let keys: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["D", "T", "U", "0-9"]);

    let (status, body) = get_json(addr, "/api/index/d").await;
    assert_eq!(status, 200);
    assert_eq!(body["terms"].as_array().unwrap().len(), 2);

    let (status, body) = get_json(addr, "/api/index/q").await;
    assert_eq!(status, 200);
    assert!(body["terms"].as_array().unwrap().is_empty());

    let (status, body) = get_json(addr, "/api/index/ab").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_recommended() {
    let addr = spawn_server().await;

    let (status, body) = get_json(addr, "/api/recommended-terms").await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["terms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["tls", "dns"]);

    let (_, body) = get_json(addr, "/api/recommended-terms?limit=1").await;
    assert_eq!(body["terms"].as_array().unwrap().len(), 1);
    assert_eq!(body["terms"][0]["title"], "TLS");
}

#[tokio::test]
async fn test_sitemap() {
    let addr = spawn_server().await;
    let resp = reqwest::get(format!("http://{}/sitemap.xml", addr))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "application/xml"
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("<loc>https://glossary.example.com/terms/dns</loc>"));
    assert!(body.contains("<loc>https://glossary.example.com/recommended</loc>"));
}

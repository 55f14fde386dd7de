use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, ServerConfig};
use staysearch_core::persist::{save_generation, IndexPaths};
use staysearch_core::{build, CatalogEntry, IndexConfig, Measure};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

const LISTINGS: &str = r#"{"id": 1, "name": "Cozy seaside apartment with sea view"}
{"id": 2, "name": "Modern city loft"}
{"id": 3, "name": "Seaside villa with private pool"}
{"id": 4, "name": null}
"#;

fn write_corpus(dir: &Path) -> String {
    let path = dir.join("listings.jsonl");
    fs::write(&path, LISTINGS).unwrap();
    path.to_string_lossy().to_string()
}

fn app_for(corpus: String, admin_token: Option<&str>) -> Router {
    build_app(ServerConfig {
        corpus: Some(corpus),
        default_k: 10,
        max_k: 100,
        admin_token: admin_token.map(str::to_string),
        ..Default::default()
    })
    .unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn ids(json: &Value) -> Vec<String> {
    json["results"].as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap().to_string()).collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    let app = app_for(write_corpus(dir.path()), None);

    let (status, json) = call(&app, get("/search?q=seaside%20apartment&k=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_matches"], 2);
    assert_eq!(json["measure"], "cosine");
    assert_eq!(ids(&json), vec!["1", "3"]);
    let first = &json["results"][0];
    assert_eq!(first["name"], "Cozy seaside apartment with sea view");
    for m in ["cosine", "jaccard", "dice"] {
        let s = first["scores"][m].as_f64().unwrap();
        assert!(s > 0.0 && s <= 1.0);
    }
}

#[tokio::test]
async fn post_search_with_measure() {
    let dir = tempdir().unwrap();
    let app = app_for(write_corpus(dir.path()), None);
    let req = Request::post("/search")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query": "seaside pool", "measure": "jaccard", "k": 1}"#))
        .unwrap();
    let (status, json) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["measure"], "jaccard");
    assert_eq!(json["total_matches"], 2);
    assert_eq!(ids(&json), vec!["3"]);
    assert_eq!(json["results"][0]["score"], json["results"][0]["scores"]["jaccard"]);
}

#[tokio::test]
async fn unknown_measure_is_bad_request() {
    let dir = tempdir().unwrap();
    let app = app_for(write_corpus(dir.path()), None);
    let (status, json) = call(&app, get("/search?q=loft&measure=euclidean")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("euclidean"));
}

#[tokio::test]
async fn empty_and_unknown_queries_match_nothing() {
    let dir = tempdir().unwrap();
    let app = app_for(write_corpus(dir.path()), None);
    for uri in ["/search?q=", "/search?q=xyzzy%20plugh&measure=dice"] {
        let (status, json) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_matches"], 0);
        assert!(json["results"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn doc_exposes_term_weights() {
    let dir = tempdir().unwrap();
    let app = app_for(write_corpus(dir.path()), None);
    let (status, json) = call(&app, get("/doc/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Modern city loft");
    let terms: Vec<&str> = json["terms"].as_array().unwrap().iter().map(|t| t["term"].as_str().unwrap()).collect();
    assert_eq!(terms, vec!["city", "loft", "modern"]);

    let (status, _) = call(&app, get("/doc/4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_requires_token_and_swaps_generation() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app_for(corpus.clone(), Some("secret"));

    let (_, stats) = call(&app, get("/stats")).await;
    assert_eq!(stats["generation"], 1);
    assert_eq!(stats["num_docs"], 3);
    assert_eq!(stats["skipped"], 1);

    let (status, _) = call(&app, Request::post("/index/rebuild").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(&corpus, format!("{LISTINGS}{{\"id\": 5, \"name\": \"Seaside apartment by the harbour\"}}\n")).unwrap();
    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, info) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["generation"], 2);
    assert_eq!(info["num_docs"], 4);

    let (_, json) = call(&app, get("/search?q=seaside%20apartment")).await;
    assert_eq!(json["total_matches"], 3);
}

#[tokio::test]
async fn failed_rebuild_keeps_serving() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app_for(corpus.clone(), Some("secret"));
    let (_, before) = call(&app, get("/search?q=seaside%20apartment")).await;

    fs::remove_file(&corpus).unwrap();
    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, after) = call(&app, get("/search?q=seaside%20apartment")).await;
    assert_eq!(ids(&before), ids(&after));
    assert_eq!(before["results"], after["results"]);
}

#[tokio::test]
async fn serves_from_snapshot() {
    let dir = tempdir().unwrap();
    let generation = build(
        vec![CatalogEntry::named("a", "Garden flat"), CatalogEntry::named("b", "Roof terrace studio")],
        &IndexConfig::default(),
    );
    save_generation(&IndexPaths::new(dir.path()), &generation).unwrap();

    let app = build_app(ServerConfig {
        index: Some(dir.path().to_string_lossy().to_string()),
        default_measure: Measure::Dice,
        default_k: 5,
        max_k: 5,
        ..Default::default()
    })
    .unwrap();
    let (status, json) = call(&app, get("/search?q=terrace")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["measure"], "dice");
    assert_eq!(ids(&json), vec!["b"]);

    let (status, _) = call(&app, Request::post("/index/rebuild").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rebuild_without_corpus_conflicts() {
    let dir = tempdir().unwrap();
    let generation = build(vec![CatalogEntry::named("a", "Garden flat")], &IndexConfig::default());
    save_generation(&IndexPaths::new(dir.path()), &generation).unwrap();

    let app = build_app(ServerConfig {
        index: Some(dir.path().to_string_lossy().to_string()),
        default_k: 5,
        max_k: 5,
        admin_token: Some("s3cret".into()),
        ..Default::default()
    })
    .unwrap();
    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "s3cret").body(Body::empty()).unwrap();
    let (status, json) = call(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("no corpus source"));

    let (status, json) = call(&app, get("/search?q=garden")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["a"]);
}

#[test]
fn startup_requires_a_source() {
    assert!(build_app(ServerConfig::default()).is_err());
}

//! HTTP API tests driven through the router without a socket

use std::sync::Arc;

use axum::{
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;

use talkdex::api::SearchView;
use talkdex::{create_router, AppState, FieldAnalyzers, IndexSettings, IndexStore, Indexer, Searcher, Talk};

fn talk(title: &str, categories: &[&str]) -> Talk {
    Talk::new(
        format!("/talks/{title}.properties"),
        title,
        vec!["Florian Hopf".to_string()],
        NaiveDate::from_ymd_opt(2012, 6, 12).unwrap(),
        format!("Ein Vortrag über {title}."),
        categories.iter().map(|c| c.to_string()).collect(),
    )
}

fn setup() -> (Arc<IndexStore>, Router) {
    let settings = IndexSettings::default();
    let analyzers = FieldAnalyzers::from_settings(&settings).unwrap();
    let store = Arc::new(IndexStore::in_memory(analyzers));
    Indexer::new(store.clone())
        .index(&[
            talk("Apache Camel", &["Java", "Integration"]),
            talk("Apache Karaf", &["Java", "OSGi"]),
        ])
        .unwrap();
    let router = create_router(AppState::new(Searcher::new(store.clone(), settings)));
    (store, router)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_search_without_query_lists_categories() {
    let (_, app) = setup();
    let (status, body) = get(&app, "/lucene").await;
    assert_eq!(status, StatusCode::OK);

    let view: SearchView = serde_json::from_value(body).unwrap();
    assert_eq!(view.query, "-");
    assert!(view.results.is_empty());
    assert_eq!(view.categories, vec!["Integration", "Java", "OSGi"]);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn test_search_with_query() {
    let (_, app) = setup();
    let (status, body) = get(&app, "/lucene?query=karaf").await;
    assert_eq!(status, StatusCode::OK);

    let view: SearchView = serde_json::from_value(body).unwrap();
    assert_eq!(view.query, "karaf");
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].title, "Apache Karaf");
    assert_eq!(view.results[0].speakers, vec!["Florian Hopf"]);
    assert_eq!(view.categories.len(), 3);
}

#[tokio::test]
async fn test_search_encoded_query() {
    let (_, app) = setup();
    let (_, body) = get(&app, "/lucene?query=apache%20-category%3AOSGi").await;
    let view: SearchView = serde_json::from_value(body).unwrap();
    assert_eq!(view.query, "apache -category:OSGi");
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].title, "Apache Camel");
}

#[tokio::test]
async fn test_parse_error_degrades_to_empty_results() {
    let (_, app) = setup();
    let (status, body) = get(&app, "/lucene?query=title%3A%28apache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["error"], "query_parse_error");

    let view: SearchView = serde_json::from_value(body).unwrap();
    assert_eq!(view.query, "title:(apache");
    assert!(view.results.is_empty());
    assert_eq!(view.categories.len(), 3);
}

#[tokio::test]
async fn test_deeply_nested_query_is_rejected() {
    let (_, app) = setup();
    let uri = format!(
        "/lucene?query={}apache{}",
        "%28".repeat(20_000),
        "%29".repeat(20_000)
    );
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["error"], "query_parse_error");
    assert_eq!(body["results"].as_array().map(Vec::len), Some(0));

    let (status, body) = get(&app, "/lucene?query=apache").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_closed_store_is_unavailable() {
    let (store, app) = setup();
    store.close();

    let (status, body) = get(&app, "/lucene?query=apache").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "closed_store");

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "closed");
}

#[tokio::test]
async fn test_health() {
    let (_, app) = setup();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], talkdex::VERSION);
}

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use bytes::Bytes;
use opendal::Operator;
use opendal::services::Memory;
use pylon::prelude::*;
use pylon_opendal::OpendalStore;
use std::sync::Arc;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}/")
}

async fn read_object(
    State(op): State<Operator>,
    Path(key): Path<String>,
) -> Result<Bytes, StatusCode> {
    op.read(&key)
        .await
        .map(|buffer| buffer.to_bytes())
        .map_err(|_| StatusCode::NOT_FOUND)
}

/// An in-memory bucket plus a CDN that serves it.
async fn bucket() -> (OpendalStore, String) {
    let store = OpendalStore::new(Operator::new(Memory::default()).unwrap().finish());
    let router = Router::new()
        .route("/{*key}", get(read_object))
        .with_state(store.operator().clone());
    let cdn = serve(router).await;
    (store, cdn)
}

fn build_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("static/js")).unwrap();
    std::fs::create_dir_all(root.join("static/css")).unwrap();
    std::fs::write(root.join("index.html"), "<html></html>").unwrap();
    std::fs::write(
        root.join("main.abc123.js"),
        r#"var x="static/js/2.js"; y="/","#,
    )
    .unwrap();
    std::fs::write(
        root.join("asset-manifest.json"),
        r#"{"main.js":"/static/js/main.js"}"#,
    )
    .unwrap();
    std::fs::write(root.join("static/js/2.js"), "console.log(2)").unwrap();
    std::fs::write(
        root.join("static/css/main.1.css"),
        "a{background:url(/static/media/logo.png)}",
    )
    .unwrap();
    dir
}

fn config(cdn: &str) -> PublishConfig {
    PublishConfig {
        endpoint: "oss.example.com".into(),
        bucket_name: "ui".into(),
        object_key_prefix: "answer/".into(),
        access_key_id: "id".into(),
        access_key_secret: "secret".into(),
        visit_url_prefix: cdn.into(),
        ..Default::default()
    }
}

async fn read(store: &OpendalStore, key: &str) -> String {
    let data = store.operator().read(key).await.unwrap().to_bytes();
    String::from_utf8(data.to_vec()).unwrap()
}

#[tokio::test]
async fn publishes_a_build_directory() {
    let dir = build_dir();
    let (store, cdn) = bucket().await;
    let source = AssetRoot::select(dir.path().to_str(), EmbeddedSource::default());
    assert_eq!(source.kind(), "disk");

    let bucket_store = store.clone();
    let publisher = Publisher::new(source, move |_: &PublishConfig| {
        Ok::<_, StorageError>(bucket_store.clone())
    });

    assert_eq!(publisher.state().static_prefix(), "");
    let report = publisher.publish(Arc::new(config(&cdn))).await.unwrap();

    let keys: Vec<_> = report.published.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "answer/asset-manifest.json",
            "answer/main.abc123.js",
            "answer/static/css/main.1.css",
            "answer/static/js/2.js",
        ]
    );
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "index.html");

    assert_eq!(
        read(&store, "answer/main.abc123.js").await,
        format!(r#"var x="{cdn}answer/static/js/2.js"; y="","#)
    );
    assert_eq!(
        read(&store, "answer/asset-manifest.json").await,
        format!(r#"{{"main.js":"{cdn}answer/static/js/main.js"}}"#)
    );
    assert_eq!(
        read(&store, "answer/static/css/main.1.css").await,
        "a{background:url(../../static/media/logo.png)}"
    );
    assert_eq!(read(&store, "answer/static/js/2.js").await, "console.log(2)");

    let state = publisher.state();
    assert!(state.is_ready());
    assert_eq!(state.static_prefix(), format!("{cdn}answer/"));
}

#[tokio::test]
async fn unreachable_cdn_keeps_assets_on_origin() {
    let dir = build_dir();
    let (store, _cdn) = bucket().await;
    let source = AssetRoot::select(dir.path().to_str(), EmbeddedSource::default());
    let publisher = Publisher::new(source, move |_: &PublishConfig| {
        Ok::<_, StorageError>(store.clone())
    });

    let (_other, elsewhere) = bucket().await;
    let err = publisher
        .publish(Arc::new(config(&elsewhere)))
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Verification { .. }));
    let state = publisher.state();
    assert!(!state.is_ready());
    assert_eq!(state.static_prefix(), "");
}

#[tokio::test]
async fn handle_republishes_on_configuration_change() {
    let dir = build_dir();
    let (store, cdn) = bucket().await;
    let source = AssetRoot::select(dir.path().to_str(), EmbeddedSource::default());
    let bucket_store = store.clone();
    let handle = Publisher::new(source, move |_: &PublishConfig| {
        Ok::<_, StorageError>(bucket_store.clone())
    })
    .spawn();

    let first = handle.wait_for(handle.update_config(config(&cdn))).await;
    assert!(first.is_ready());

    let mut moved = config(&cdn);
    moved.object_key_prefix = "v2/".into();
    let second = handle.wait_for(handle.update_config(moved)).await;

    assert!(second.generation > first.generation);
    assert_eq!(handle.static_prefix(), format!("{cdn}v2/"));
    assert_eq!(read(&store, "v2/static/js/2.js").await, "console.log(2)");
}

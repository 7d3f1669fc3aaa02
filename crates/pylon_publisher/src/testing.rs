//! Test fixtures: an in-memory bucket and a fake CDN serving it.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use bytes::Bytes;
use opendal::Operator;
use opendal::services::Memory;
use pylon_opendal::OpendalStore;

pub fn memory_store() -> OpendalStore {
    OpendalStore::new(Operator::new(Memory::default()).unwrap().finish())
}

/// Starts `router` on a random local port and returns its base URL with a
/// trailing slash.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}/")
}

/// A base URL nothing listens on.
pub async fn unused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
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

/// Serves whatever is in the store's bucket, 404 for everything else.
pub async fn cdn_for(store: &OpendalStore) -> String {
    let router = Router::new()
        .route("/{*key}", get(read_object))
        .with_state(store.operator().clone());
    serve(router).await
}

//! Redirect integration tests
//!
//! Exercise the redirect router end to end: destination resolution,
//! click counting, visit recording, and the guarantee that telemetry
//! failures never block the redirect response.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use shrinker::models::{NewVisit, ShortLink, Visit};
use shrinker::redirect;
use shrinker::storage::{SqliteStorage, Storage, StorageResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::{Layer, ServiceExt};

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Helper layer to inject ConnectInfo for tests
#[derive(Clone)]
struct TestConnectInfoLayer;

impl<S> Layer<S> for TestConnectInfoLayer {
    type Service = TestConnectInfoMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TestConnectInfoMiddleware { inner }
    }
}

#[derive(Clone)]
struct TestConnectInfoMiddleware<S> {
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for TestConnectInfoMiddleware<S>
where
    S: tower::Service<Request<B>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let addr = SocketAddr::from(([127, 0, 0, 1], 12345));
        req.extensions_mut()
            .insert(axum::extract::connect_info::ConnectInfo(addr));

        self.inner.call(req)
    }
}

fn test_router(storage: Arc<dyn Storage>, trust_forwarded: bool) -> axum::Router {
    redirect::create_redirect_router(storage, None, trust_forwarded).layer(TestConnectInfoLayer)
}

#[tokio::test]
async fn redirect_resolves_destination_and_records_telemetry() {
    let storage = create_test_storage().await;

    storage
        .create_link("ab12Cd", "https://example.com/page", None)
        .await
        .unwrap();

    let app = test_router(storage.clone(), false);

    let request = Request::builder()
        .uri("/ab12Cd")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/page"
    );

    // Telemetry writes are detached from the response path.
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let link = storage.get_link("ab12Cd").await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);

    let visits = storage.visits("ab12Cd").await.unwrap();
    assert_eq!(visits.len(), 1);
    // No GeoIP database and no user-agent header: sentinel values.
    assert_eq!(visits[0].country, "Unknown");
    assert_eq!(visits[0].device, "Desktop");
    assert_eq!(visits[0].ip, "127.0.0.1");
}

#[tokio::test]
async fn unknown_code_is_404_and_records_nothing() {
    let storage = create_test_storage().await;
    let app = test_router(storage.clone(), false);

    let request = Request::builder()
        .uri("/missing")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    let visits = storage.visits("missing").await.unwrap();
    assert!(visits.is_empty(), "a 404 must never record a visit");
}

#[tokio::test]
async fn mobile_user_agent_is_classified() {
    let storage = create_test_storage().await;

    storage
        .create_link("phone1", "https://example.com", None)
        .await
        .unwrap();

    let app = test_router(storage.clone(), false);

    let request = Request::builder()
        .uri("/phone1")
        .header(
            "user-agent",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1",
        )
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    let visits = storage.visits("phone1").await.unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].device, "Mobile");
}

#[tokio::test]
async fn forwarded_header_is_used_only_when_trusted() {
    let storage = create_test_storage().await;

    storage
        .create_link("fwd1", "https://example.com", None)
        .await
        .unwrap();
    storage
        .create_link("fwd2", "https://example.com", None)
        .await
        .unwrap();

    // Untrusted deployment: the header is ignored.
    let app = test_router(storage.clone(), false);
    let request = Request::builder()
        .uri("/fwd1")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    // Trusted proxy deployment: the header wins.
    let app = test_router(storage.clone(), true);
    let request = Request::builder()
        .uri("/fwd2")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(storage.visits("fwd1").await.unwrap()[0].ip, "127.0.0.1");
    assert_eq!(storage.visits("fwd2").await.unwrap()[0].ip, "203.0.113.9");
}

#[tokio::test]
async fn concurrent_redirects_count_every_click_and_visit() {
    let storage = create_test_storage().await;

    storage
        .create_link("popular", "https://example.com", None)
        .await
        .unwrap();

    let app = test_router(storage.clone(), false);

    let mut handles = vec![];
    for _ in 0..100 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri("/popular")
                .body(Body::empty())
                .unwrap();
            app_clone.oneshot(request).await
        }));
    }

    let mut success_count = 0;
    for handle in handles {
        if let Ok(Ok(response)) = handle.await {
            if response.status() == StatusCode::FOUND {
                success_count += 1;
            }
        }
    }
    assert_eq!(success_count, 100, "all 100 redirects should succeed");

    // Wait for the detached telemetry tasks to settle.
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    let link = storage.get_link("popular").await.unwrap().unwrap();
    assert_eq!(link.clicks, 100, "atomic increments must not lose updates");

    let visits = storage.visits("popular").await.unwrap();
    assert_eq!(visits.len(), 100);
}

/// Storage wrapper whose visit appends always fail, for exercising the
/// documented counter/event-log divergence.
struct FailingVisitStorage {
    inner: Arc<dyn Storage>,
}

#[async_trait]
impl Storage for FailingVisitStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create_link(
        &self,
        short_code: &str,
        original_url: &str,
        created_by: Option<&str>,
    ) -> StorageResult<ShortLink> {
        self.inner
            .create_link(short_code, original_url, created_by)
            .await
    }

    async fn get_link(&self, short_code: &str) -> Result<Option<ShortLink>> {
        self.inner.get_link(short_code).await
    }

    async fn code_exists(&self, short_code: &str) -> Result<bool> {
        self.inner.code_exists(short_code).await
    }

    async fn increment_clicks(&self, short_code: &str) -> Result<()> {
        self.inner.increment_clicks(short_code).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>> {
        self.inner.list_by_owner(owner).await
    }

    async fn delete_link(&self, short_code: &str) -> Result<bool> {
        self.inner.delete_link(short_code).await
    }

    async fn record_visit(&self, _visit: &NewVisit) -> Result<()> {
        anyhow::bail!("event store unavailable")
    }

    async fn visits(&self, short_code: &str) -> Result<Vec<Visit>> {
        self.inner.visits(short_code).await
    }

    async fn delete_visits(&self, short_code: &str) -> Result<u64> {
        self.inner.delete_visits(short_code).await
    }
}

#[tokio::test]
async fn event_append_failure_does_not_block_the_redirect() {
    let inner = create_test_storage().await;
    inner
        .create_link("flaky", "https://example.com/page", None)
        .await
        .unwrap();

    let storage: Arc<dyn Storage> = Arc::new(FailingVisitStorage {
        inner: Arc::clone(&inner),
    });
    let app = test_router(storage, false);

    let request = Request::builder()
        .uri("/flaky")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // The redirect must still be delivered.
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/page"
    );

    // Give the retry loop time to give up: the counter advances while
    // the event log does not. This divergence is accepted by design.
    tokio::time::sleep(tokio::time::Duration::from_millis(400)).await;

    let link = inner.get_link("flaky").await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);
    assert!(inner.visits("flaky").await.unwrap().is_empty());
}

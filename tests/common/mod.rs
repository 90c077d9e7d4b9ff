#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aquarium_analyser::analysis::{AnalysisKind, VisionModel};
use aquarium_analyser::article::rewrite::{ArticleRewriter, PassthroughRewriter};
use aquarium_analyser::config::Config;
use aquarium_analyser::error::AppError;
use aquarium_analyser::topic::Topic;
use aquarium_analyser::AppState;
use async_trait::async_trait;
use axum::{http::StatusCode, response::Html, routing::get, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use url::Url;

pub const BBA_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Black Beard Algae | 2Hr Aquarist</title></head>
<body>
  <h1 class="article__title">How to get rid of Black Beard Algae</h1>
  <div class="article__content">
    <p>BBA is one of the most stubborn pests in a planted tank.</p>
    <div class="share-buttons"><a href="https://twitter.com/share">Share</a></div>
    <h2>What Is BBA?</h2>
    <p>A red algae that grows in dark tufts on hardscape and slow growing leaves.</p>
    <img src="/cdn/bba-tufts.jpg" srcset="/cdn/bba-tufts-2x.jpg 2x" sizes="100vw" loading="lazy">
    <h3>CO2 stability</h3>
    <p>Fluctuating CO2 is the usual trigger.</p>
    <img src="/cdn/bba-missing.jpg">
    <img src="/cdn/bba-driftwood.jpg">
    <script>trackReader()</script>
  </div>
</body>
</html>"#;

pub const PAGE_WITHOUT_CONTENT: &str = r#"<!doctype html>
<html><body><main><h2>Shop our fertilisers</h2><p>Redesigned page</p></main></body></html>"#;

pub const IMAGE_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg";

/// Local stand-in for the content site, counting article page hits.
pub struct ContentSite {
    pub origin: Url,
    pub page_hits: Arc<AtomicUsize>,
}

impl ContentSite {
    pub fn hits(&self) -> usize {
        self.page_hits.load(Ordering::SeqCst)
    }
}

pub async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

/// Black beard algae page with three images (one unreachable) and a hair algae
/// page that lost its content container.
pub async fn content_site() -> ContentSite {
    let page_hits = Arc::new(AtomicUsize::new(0));
    let bba_hits = page_hits.clone();
    let hair_hits = page_hits.clone();

    let router = Router::new()
        .route(
            "/blogs/algae/black-beard-algae",
            get(move || {
                let hits = bba_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    // Widen the window for concurrent callers
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Html(BBA_PAGE)
                }
            }),
        )
        .route(
            "/blogs/algae/hair-algae",
            get(move || {
                let hits = hair_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Html(PAGE_WITHOUT_CONTENT)
                }
            }),
        )
        .route("/cdn/bba-tufts.jpg", get(|| async { IMAGE_BYTES }))
        .route("/cdn/bba-driftwood.jpg", get(|| async { IMAGE_BYTES }))
        .route(
            "/blogs/algae/green-water",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );

    ContentSite {
        origin: serve(router).await,
        page_hits,
    }
}

/// A content site where every topic page has a content container and one image.
pub async fn full_content_site() -> Url {
    let mut router = Router::new();
    for topic in Topic::ALL {
        let page = format!(
            r#"<html><body>
  <h1>Beating {name} for good</h1>
  <div class="article__content">
    <p>Most tanks meet this pest sooner or later.</p>
    <h2>Causes</h2>
    <p>Light and nutrients drifting out of balance.</p>
    <img src="/cdn/{slug}.jpg" alt="">
  </div>
</body></html>"#,
            name = topic.display_name(),
            slug = topic.slug(),
        );
        router = router
            .route(
                topic.profile().source_path,
                get(move || {
                    let page = page.clone();
                    async move { Html(page) }
                }),
            )
            .route(&format!("/cdn/{}.jpg", topic.slug()), get(|| async { IMAGE_BYTES }));
    }
    serve(router).await
}

/// A content site whose article page answers after `delay`.
pub async fn slow_content_site(delay: Duration) -> Url {
    let router = Router::new().route(
        "/blogs/algae/black-beard-algae",
        get(move || async move {
            tokio::time::sleep(delay).await;
            Html(BBA_PAGE)
        }),
    );
    serve(router).await
}

pub fn test_config(origin: Url, public_dir: &Path) -> Config {
    Config {
        source_origin: origin,
        public_dir: public_dir.to_path_buf(),
        rate_limit_per_minute: None,
        http_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn state_with(config: Config, rewriter: Arc<dyn ArticleRewriter>, vision: Arc<dyn VisionModel>) -> AppState {
    AppState::with_services(config, rewriter, vision).unwrap()
}

pub fn passthrough_state(config: Config) -> AppState {
    state_with(config, Arc::new(PassthroughRewriter), Arc::new(StubVision::answering(Value::Null)))
}

/// Rewrites one word differently on every call, like a sampling model would.
#[derive(Default)]
pub struct DriftingRewriter {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ArticleRewriter for DriftingRewriter {
    async fn rewrite(&self, html: &str) -> Result<String, AppError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(html.replacen("stubborn", &format!("persistent (take {})", n), 1))
    }
}

pub struct FailingRewriter;

#[async_trait]
impl ArticleRewriter for FailingRewriter {
    async fn rewrite(&self, _html: &str) -> Result<String, AppError> {
        Err(AppError::ModelError("429 Too Many Requests".to_string()))
    }
}

/// Drops all markup, which must never reach a client.
pub struct FlatteningRewriter;

#[async_trait]
impl ArticleRewriter for FlatteningRewriter {
    async fn rewrite(&self, _html: &str) -> Result<String, AppError> {
        Ok("<p>Here is your rewritten article about algae.</p>".to_string())
    }
}

/// Returns a canned model answer, or an error when none is set.
pub struct StubVision {
    answer: Option<Value>,
    pub calls: AtomicUsize,
}

impl StubVision {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer: Some(answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VisionModel for StubVision {
    async fn analyze_image(&self, _kind: AnalysisKind, _mime: &str, _image_base64: &str) -> Result<Value, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| AppError::ModelError("vision model unavailable".to_string()))
    }
}

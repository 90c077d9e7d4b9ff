//! Scrape → extract → assemble → materialize images → rewrite pipeline for
//! the algae articles, fronted by a per-topic cache.

pub mod assemble;
pub mod cache;
pub mod extract;
pub mod fetch;
pub mod images;
pub mod rewrite;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use url::Url;

use crate::error::AppError;
use crate::topic::Topic;
use cache::ArticleCache;
use extract::{Extraction, ImageRef};
use fetch::PageFetcher;
use images::ImageMaterializer;
use rewrite::{rewrite_or_original, ArticleRewriter};

/// A non-fatal problem hit while rendering an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// The content container was missing; the canned article was used.
    ContentFallback,
    ImageDownload {
        source: String,
        local_path: String,
        reason: String,
    },
    RewriteFailed {
        reason: String,
    },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::ContentFallback => write!(f, "content container not found, served fallback article"),
            PipelineWarning::ImageDownload { source, local_path, reason } => {
                write!(f, "image {} was not saved to {}: {}", source, local_path, reason)
            }
            PipelineWarning::RewriteFailed { reason } => write!(f, "SEO rewrite skipped: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Extracted,
    FallbackTemplate,
}

/// Final article for one topic plus everything that went wrong on the way.
#[derive(Debug, Clone)]
pub struct RenderedArticle {
    pub topic: Topic,
    pub html: String,
    pub source: ContentSource,
    pub images: Vec<ImageRef>,
    pub warnings: Vec<PipelineWarning>,
}

pub struct ArticleService {
    fetcher: PageFetcher,
    materializer: ImageMaterializer,
    rewriter: Arc<dyn ArticleRewriter>,
    cache: ArticleCache,
    origin: Url,
}

impl ArticleService {
    pub fn new(
        fetcher: PageFetcher,
        materializer: ImageMaterializer,
        rewriter: Arc<dyn ArticleRewriter>,
        origin: Url,
    ) -> Self {
        Self {
            fetcher,
            materializer,
            rewriter,
            cache: ArticleCache::new(),
            origin,
        }
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    /// Cached article for `topic`, rendering it on the first request.
    pub async fn article(&self, topic: Topic) -> Result<Arc<RenderedArticle>, AppError> {
        self.cache.get_or_render(topic, || self.render(topic)).await
    }

    /// Runs the full pipeline without touching the cache.
    #[tracing::instrument(skip_all, fields(topic = %topic))]
    pub async fn render(&self, topic: Topic) -> Result<RenderedArticle, AppError> {
        let url = topic.source_url(&self.origin)?;
        let html = self.fetcher.fetch_html(&url).await?;

        let origin = self.origin.clone();
        let span = tracing::info_span!("extract_article");
        let extraction = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            extract::extract(&html, topic, &origin)
        })
        .await??;

        let mut warnings = Vec::new();
        let source = match extraction {
            Extraction::Extracted(_) => ContentSource::Extracted,
            Extraction::FallbackTemplate { .. } => {
                warnings.push(PipelineWarning::ContentFallback);
                ContentSource::FallbackTemplate
            }
        };

        let assembled = assemble::assemble(topic, &extraction, Utc::now().date_naive());
        let images = extraction.images().to_vec();

        warnings.extend(self.materializer.materialize(&images).await);

        let (html, rewrite_warning) = rewrite_or_original(self.rewriter.as_ref(), &assembled).await;
        warnings.extend(rewrite_warning);

        for warning in &warnings {
            tracing::warn!("{} article: {}", topic, warning);
        }
        tracing::info!(
            "Rendered {} article ({:?}, {} images, {} warnings)",
            topic,
            source,
            images.len(),
            warnings.len()
        );

        Ok(RenderedArticle {
            topic,
            html,
            source,
            images,
            warnings,
        })
    }
}

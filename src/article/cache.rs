use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::RenderedArticle;
use crate::error::AppError;
use crate::topic::Topic;

/// Process-lifetime article cache with one slot per topic.
///
/// A slot goes from empty to populated at most once and is never refreshed.
/// Concurrent misses for the same topic share a single render; a failed
/// render leaves the slot empty so the next request tries again.
#[derive(Debug)]
pub struct ArticleCache {
    slots: HashMap<Topic, OnceCell<Arc<RenderedArticle>>>,
}

impl Default for ArticleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleCache {
    pub fn new() -> Self {
        Self {
            slots: Topic::ALL.into_iter().map(|topic| (topic, OnceCell::new())).collect(),
        }
    }

    pub fn get(&self, topic: Topic) -> Option<Arc<RenderedArticle>> {
        self.slots.get(&topic).and_then(|slot| slot.get().cloned())
    }

    pub async fn get_or_render<F, Fut>(&self, topic: Topic, render: F) -> Result<Arc<RenderedArticle>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RenderedArticle, AppError>>,
    {
        let slot = self
            .slots
            .get(&topic)
            .ok_or_else(|| AppError::InternalError(format!("no cache slot for topic {}", topic)))?;

        if let Some(article) = slot.get() {
            tracing::debug!("Serving cached article for {}", topic);
            return Ok(article.clone());
        }

        slot.get_or_try_init(|| async move {
            tracing::info!("Article cache miss for {}, rendering", topic);
            render().await.map(Arc::new)
        })
        .await
        .cloned()
    }
}

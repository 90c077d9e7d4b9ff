use async_trait::async_trait;
use select::document::Document;
use select::node::Node;

use super::PipelineWarning;
use crate::error::AppError;
use crate::openai::{strip_code_fences, ChatMessage, OpenAiClient};

const REWRITE_SYSTEM_PROMPT: &str = "You are an SEO content editor for an aquarium website. You rewrite article prose so it reads as original, search-engine friendly content while keeping every fact intact.";

const REWRITE_MAX_TOKENS: u32 = 4096;

/// Produces a reworded variant of an assembled article fragment.
///
/// Output is not deterministic; callers must only rely on structure.
#[async_trait]
pub trait ArticleRewriter: Send + Sync {
    async fn rewrite(&self, html: &str) -> Result<String, AppError>;
}

/// Returns the input unchanged. Used when rewriting is disabled or no API key is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRewriter;

#[async_trait]
impl ArticleRewriter for PassthroughRewriter {
    async fn rewrite(&self, html: &str) -> Result<String, AppError> {
        Ok(html.to_string())
    }
}

#[async_trait]
impl ArticleRewriter for OpenAiClient {
    async fn rewrite(&self, html: &str) -> Result<String, AppError> {
        let prompt = format!(
            "Rewrite the prose in the following HTML article so that it is unique and optimized for search engines. \
            Keep every HTML tag, attribute, id, class and image exactly as they are, keep the \
            <script type=\"application/ld+json\"> block unchanged, and only vary the human-readable text. \
            Return only the rewritten HTML with no explanation.\n\n{}",
            html
        );
        let messages = [ChatMessage::system(REWRITE_SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let content = self.chat(&self.rewrite_model, &messages, REWRITE_MAX_TOKENS, false).await?;
        Ok(strip_code_fences(&content).to_string())
    }
}

/// Runs the rewriter, falling back to `html` when it fails or mangles the markup.
#[tracing::instrument(skip_all, fields(html_len = html.len()))]
pub async fn rewrite_or_original(rewriter: &dyn ArticleRewriter, html: &str) -> (String, Option<PipelineWarning>) {
    let reason = match rewriter.rewrite(html).await {
        Ok(rewritten) if rewritten.trim().is_empty() => "rewrite returned empty output".to_string(),
        Ok(rewritten) => {
            let expected = skeleton(html);
            let actual = skeleton(&rewritten);
            if expected == actual {
                tracing::info!("SEO rewrite applied");
                return (rewritten, None);
            }
            format!(
                "rewrite changed the document structure ({} structural elements before, {} after)",
                expected.len(),
                actual.len()
            )
        }
        Err(e) => e.to_string(),
    };

    tracing::debug!("Falling back to unrewritten article: {}", reason);
    (html.to_string(), Some(PipelineWarning::RewriteFailed { reason }))
}

/// Ordered names of the elements a rewrite must preserve.
pub fn skeleton(html: &str) -> Vec<String> {
    Document::from(html)
        .find(|node: &Node| {
            matches!(
                node.name(),
                Some("article" | "header" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "img" | "script" | "a")
            )
        })
        .filter_map(|node| node.name().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRewriter(Result<String, ()>);

    #[async_trait]
    impl ArticleRewriter for FixedRewriter {
        async fn rewrite(&self, _html: &str) -> Result<String, AppError> {
            self.0
                .clone()
                .map_err(|_| AppError::ModelError("provider unavailable".to_string()))
        }
    }

    const ARTICLE: &str = r#"<article><header><h1>T</h1></header><h2 id="a">A</h2><p>one</p><img src="/images/bba-image-0.jpg"><script type="application/ld+json">{}</script></article>"#;

    #[tokio::test]
    async fn passthrough_is_identity() {
        let (html, warning) = rewrite_or_original(&PassthroughRewriter, ARTICLE).await;
        assert_eq!(html, ARTICLE);
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn structurally_equal_rewrite_is_accepted() {
        let rewritten = ARTICLE.replace("<p>one</p>", "<p>a different sentence</p>");
        let (html, warning) = rewrite_or_original(&FixedRewriter(Ok(rewritten.clone())), ARTICLE).await;
        assert_eq!(html, rewritten);
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn provider_error_returns_original() {
        let (html, warning) = rewrite_or_original(&FixedRewriter(Err(())), ARTICLE).await;
        assert_eq!(html, ARTICLE);
        assert!(matches!(warning, Some(PipelineWarning::RewriteFailed { .. })));
    }

    #[tokio::test]
    async fn dropped_tags_return_original() {
        let mangled = "<article><p>All the text, none of the headings.</p></article>".to_string();
        let (html, warning) = rewrite_or_original(&FixedRewriter(Ok(mangled)), ARTICLE).await;
        assert_eq!(html, ARTICLE);
        assert!(matches!(warning, Some(PipelineWarning::RewriteFailed { .. })));
    }

    #[tokio::test]
    async fn empty_output_returns_original() {
        let (html, warning) = rewrite_or_original(&FixedRewriter(Ok("  ".to_string())), ARTICLE).await;
        assert_eq!(html, ARTICLE);
        assert!(warning.is_some());
    }
}

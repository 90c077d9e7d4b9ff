//! DOM extraction for scraped article pages.
//!
//! Reading is done with `select`; every mutation of the content subtree goes
//! through `lol_html` rewriting passes over the serialized fragment.

use std::cell::Cell;
use std::error::Error;

use lol_html::html_content::{ContentType, Element};
use lol_html::{element, rewrite_str, RewriteStrSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name};
use url::Url;

use crate::error::AppError;
use crate::topic::Topic;

/// Class of the container holding the article body on the content site.
pub const CONTENT_CLASS: &str = "article__content";

const RESPONSIVE_ATTRIBUTES: &[&str] = &["srcset", "sizes", "data-srcset", "data-sizes", "data-widths"];
const IMAGE_CLASS: &str = "w-full rounded-lg shadow-md";

static NON_WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]+").expect("NON_WORD_RUN: hardcoded regex is valid"));

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// An image discovered in the content subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub original_source: Url,
    pub local_path: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub html: String,
    pub images: Vec<ImageRef>,
}

/// Outcome of looking for the article body.
#[derive(Debug, Clone)]
pub enum Extraction {
    Extracted(ExtractedContent),
    /// No element matched [`CONTENT_CLASS`]; the canned article is used instead.
    FallbackTemplate { title: Option<String> },
}

impl Extraction {
    pub fn title(&self) -> Option<&str> {
        match self {
            Extraction::Extracted(content) => content.title.as_deref(),
            Extraction::FallbackTemplate { title } => title.as_deref(),
        }
    }

    pub fn images(&self) -> &[ImageRef] {
        match self {
            Extraction::Extracted(content) => &content.images,
            Extraction::FallbackTemplate { .. } => &[],
        }
    }
}

/// Anchor id for a heading: lowercase, runs of non-word characters collapsed
/// to one hyphen, no leading or trailing hyphen.
pub fn heading_id(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, "-").trim_matches('-').to_string()
}

#[tracing::instrument(skip_all, fields(topic = %topic, html_len = html.len()))]
pub fn extract(html: &str, topic: Topic, origin: &Url) -> Result<Extraction, AppError> {
    let document = Document::from(html);

    let title = document
        .find(Name("h1"))
        .next()
        .map(|node| node.text().trim().to_string())
        .filter(|title| !title.is_empty());

    let content = match document.find(Class(CONTENT_CLASS)).next() {
        Some(node) => node.inner_html(),
        None => {
            tracing::debug!("No element with class {} found, using fallback article", CONTENT_CLASS);
            return Ok(Extraction::FallbackTemplate { title });
        }
    };

    let cleaned = strip_noise(&content)?;
    let headings = heading_texts(&cleaned);
    let (html, images) = rewrite_content(&cleaned, topic, origin, &headings)?;

    tracing::info!("Extracted content with {} images and {} headings", images.len(), headings.len());
    Ok(Extraction::Extracted(ExtractedContent { title, html, images }))
}

fn strip_noise(html: &str) -> Result<String, AppError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(".share-buttons", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("iframe", |el| {
                    el.remove();
                    Ok(())
                }),
                element!(".shopify-section", |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| AppError::ProcessingError(format!("failed to strip noise from article: {}", e)))
}

/// Trimmed text of every h1-h6 in document order.
fn heading_texts(html: &str) -> Vec<String> {
    Document::from(html)
        .find(|node: &Node| matches!(node.name(), Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")))
        .map(|node| node.text().trim().to_string())
        .collect()
}

fn rewrite_content(
    html: &str,
    topic: Topic,
    origin: &Url,
    headings: &[String],
) -> Result<(String, Vec<ImageRef>), AppError> {
    let display = topic.display_name();
    let mut images: Vec<ImageRef> = Vec::new();
    let cursor = Cell::new(0usize);

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("img", |el| {
                    let src = el.get_attribute("src").unwrap_or_default();
                    let src = src.trim();
                    if src.is_empty() {
                        return Ok(());
                    }
                    let original_source = match origin.join(src) {
                        Ok(url) => url,
                        Err(e) => {
                            tracing::warn!("Skipping image with unresolvable src {}: {}", src, e);
                            return Ok(());
                        }
                    };

                    let index = images.len();
                    let local_path = topic.image_path(index);
                    el.set_attribute("src", &local_path)?;
                    el.set_attribute("alt", &format!("{} control - image {}", display, index + 1))?;
                    for attribute in RESPONSIVE_ATTRIBUTES {
                        el.remove_attribute(attribute);
                    }
                    el.set_attribute("class", IMAGE_CLASS)?;

                    images.push(ImageRef { original_source, local_path });
                    Ok(())
                }),
                element!("h1", |el| augment_heading(el, 1, display, headings, &cursor)),
                element!("h2", |el| augment_heading(el, 2, display, headings, &cursor)),
                element!("h3", |el| augment_heading(el, 3, display, headings, &cursor)),
                element!("h4", |el| augment_heading(el, 4, display, headings, &cursor)),
                element!("h5", |el| augment_heading(el, 5, display, headings, &cursor)),
                element!("h6", |el| augment_heading(el, 6, display, headings, &cursor)),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| AppError::ProcessingError(format!("failed to rewrite article content: {}", e)))?;

    Ok((output, images))
}

fn augment_heading(
    el: &mut Element<'_, '_>,
    level: u8,
    display: &str,
    headings: &[String],
    cursor: &Cell<usize>,
) -> HandlerResult {
    let position = cursor.get();
    cursor.set(position + 1);

    let Some(text) = headings.get(position) else {
        tracing::debug!("Heading #{} has no parsed text, leaving it untouched", position);
        return Ok(());
    };

    let id = heading_id(text);
    if !id.is_empty() {
        el.set_attribute("id", &id)?;
    }

    match level {
        2 => el.set_inner_content(&format!("{} - {} Control", text, display), ContentType::Text),
        3 => el.set_inner_content(&format!("{} for {} Treatment", text, display), ContentType::Text),
        _ => {}
    }
    Ok(())
}

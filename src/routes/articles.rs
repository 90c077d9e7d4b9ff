use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::article::assemble::ERROR_FRAGMENT;
use crate::topic::Topic;
use crate::AppState;

/// Body of every article endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponse {
    /// Whether the article was produced
    pub success: bool,
    /// Article HTML, or an error fragment on failure
    pub content: String,
    /// Failure description (only when `success` is false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Black Beard Algae article
#[utoipa::path(
    get,
    path = "/api/black-beard-algae-article",
    tag = "Articles",
    responses(
        (status = 200, description = "Rendered article", body = ArticleResponse),
        (status = 500, description = "Content site unreachable", body = ArticleResponse)
    )
)]
pub async fn black_beard_algae_article(State(state): State<AppState>) -> (StatusCode, Json<ArticleResponse>) {
    serve_article(&state, Topic::BlackBeardAlgae).await
}

/// Hair Algae article
#[utoipa::path(
    get,
    path = "/api/hair-algae-article",
    tag = "Articles",
    responses(
        (status = 200, description = "Rendered article", body = ArticleResponse),
        (status = 500, description = "Content site unreachable", body = ArticleResponse)
    )
)]
pub async fn hair_algae_article(State(state): State<AppState>) -> (StatusCode, Json<ArticleResponse>) {
    serve_article(&state, Topic::HairAlgae).await
}

/// Green Water Algae article
#[utoipa::path(
    get,
    path = "/api/green-water-algae-article",
    tag = "Articles",
    responses(
        (status = 200, description = "Rendered article", body = ArticleResponse),
        (status = 500, description = "Content site unreachable", body = ArticleResponse)
    )
)]
pub async fn green_water_algae_article(State(state): State<AppState>) -> (StatusCode, Json<ArticleResponse>) {
    serve_article(&state, Topic::GreenWaterAlgae).await
}

#[tracing::instrument(skip(state))]
async fn serve_article(state: &AppState, topic: Topic) -> (StatusCode, Json<ArticleResponse>) {
    match state.articles.article(topic).await {
        Ok(article) => {
            debug!("Serving {} article ({} warnings)", topic, article.warnings.len());
            (
                StatusCode::OK,
                Json(ArticleResponse {
                    success: true,
                    content: article.html.clone(),
                    error: None,
                }),
            )
        }
        Err(e) => {
            error!("Error scraping {} article: {}", topic, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ArticleResponse {
                    success: false,
                    content: ERROR_FRAGMENT.to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

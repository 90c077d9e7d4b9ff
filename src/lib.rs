pub mod analysis;
pub mod article;
pub mod config;
pub mod error;
pub mod openai;
pub mod routes;
pub mod topic;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use analysis::VisionModel;
use article::fetch::PageFetcher;
use article::images::ImageMaterializer;
use article::rewrite::{ArticleRewriter, PassthroughRewriter};
use article::ArticleService;
use config::Config;
use error::AppError;
use openai::OpenAiClient;
use topic::Topic;

/// Multipart framing allowance on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<ArticleService>,
    pub vision: Arc<dyn VisionModel>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the production services: OpenAI for vision and (optionally) SEO rewriting.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let openai = Arc::new(OpenAiClient::new(&config)?);
        if !openai.has_api_key() {
            tracing::error!("OPENAI_API_KEY environment variable is not set; image analysis requests will fail");
        }

        let rewriter: Arc<dyn ArticleRewriter> = if config.seo_rewrite && openai.has_api_key() {
            openai.clone() as Arc<dyn ArticleRewriter>
        } else {
            tracing::info!("SEO rewriting disabled, articles are served as assembled");
            Arc::new(PassthroughRewriter)
        };

        Self::with_services(config, rewriter, openai)
    }

    /// Builds the state around caller-supplied model backends.
    pub fn with_services(
        config: Config,
        rewriter: Arc<dyn ArticleRewriter>,
        vision: Arc<dyn VisionModel>,
    ) -> Result<Self, AppError> {
        let fetcher = PageFetcher::new(config.http_timeout)?;
        let materializer = ImageMaterializer::new(fetcher.clone(), &config.public_dir);
        let articles = ArticleService::new(fetcher, materializer, rewriter, config.source_origin.clone());

        Ok(Self {
            articles: Arc::new(articles),
            vision,
            config: Arc::new(config),
        })
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Aquarium Analyser API",
        version = "0.1.0",
        description = "Algae treatment articles and photo-based algae and fish health analysis"
    ),
    paths(
        health_check,
        routes::articles::black_beard_algae_article,
        routes::articles::hair_algae_article,
        routes::articles::green_water_algae_article,
        routes::analysis::analyze_algae,
        routes::analysis::analyze_fish
    ),
    components(schemas(
        routes::articles::ArticleResponse,
        analysis::AnalysisRecord,
        analysis::AnalysisResult,
        analysis::AnalysisKind,
        analysis::AlgaeAnalysis,
        analysis::FishHealthAnalysis,
        analysis::SpeciesName,
        Topic
    ))
)]
struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let article_routes = Router::new()
        .route(&Topic::BlackBeardAlgae.route_path(), get(routes::black_beard_algae_article))
        .route(&Topic::HairAlgae.route_path(), get(routes::hair_algae_article))
        .route(&Topic::GreenWaterAlgae.route_path(), get(routes::green_water_algae_article));

    let analysis_routes = Router::new()
        .route("/api/analyze-algae", post(routes::analyze_algae))
        .route("/api/analyze-fish", post(routes::analyze_fish))
        .layer(DefaultBodyLimit::max(routes::analysis::MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES));

    // Only the model-backed routes are rate limited
    let analysis_routes = match state.config.rate_limit_per_minute {
        Some(per_minute) => {
            let governor_conf = GovernorConfigBuilder::default()
                .key_extractor(SmartIpKeyExtractor)
                .period(Duration::from_millis(60_000 / u64::from(per_minute.max(1))))
                .burst_size(per_minute.max(1))
                .finish();
            match governor_conf {
                Some(conf) => analysis_routes.layer(GovernorLayer { config: Arc::new(conf) }),
                None => {
                    tracing::warn!("Invalid rate limit of {} per minute, limiting disabled", per_minute);
                    analysis_routes
                }
            }
        }
        None => analysis_routes,
    };

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health_check))
        .merge(article_routes)
        .merge(analysis_routes)
        .nest_service("/images", ServeDir::new(state.config.images_dir()))
        .merge(docs_router)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::AppError;

pub const DEFAULT_SOURCE_ORIGIN: &str = "https://www.2hraquarist.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Runtime settings, read from the process environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Root of the static tree; downloaded images land in `{public_dir}/images`.
    pub public_dir: PathBuf,
    pub source_origin: Url,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub vision_model: String,
    pub rewrite_model: String,
    pub seo_rewrite: bool,
    pub http_timeout: Duration,
    pub model_timeout: Duration,
    /// Requests per minute per client IP on the analysis routes. `None` disables limiting.
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            public_dir: PathBuf::from("public"),
            source_origin: Url::parse(DEFAULT_SOURCE_ORIGIN).expect("default origin is a valid URL"),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            vision_model: DEFAULT_MODEL.to_string(),
            rewrite_model: DEFAULT_MODEL.to_string(),
            seo_rewrite: true,
            http_timeout: Duration::from_secs(30),
            model_timeout: Duration::from_secs(120),
            rate_limit_per_minute: Some(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env (if present) before reading anything
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let source_origin = match non_empty_var("ARTICLE_SOURCE_ORIGIN") {
            Some(raw) => Url::parse(&raw).map_err(|e| {
                AppError::Configuration(format!("ARTICLE_SOURCE_ORIGIN is not a valid URL ({}): {}", raw, e))
            })?,
            None => defaults.source_origin,
        };

        let rate_limit_per_minute = match parse_var::<u32>("RATE_LIMIT_PER_MINUTE")? {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => defaults.rate_limit_per_minute,
        };

        Ok(Self {
            bind_addr: parse_var("BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            public_dir: non_empty_var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            source_origin,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_base_url: non_empty_var("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            vision_model: non_empty_var("OPENAI_VISION_MODEL").unwrap_or(defaults.vision_model),
            rewrite_model: non_empty_var("OPENAI_REWRITE_MODEL").unwrap_or(defaults.rewrite_model),
            seo_rewrite: parse_bool_var("SEO_REWRITE")?.unwrap_or(defaults.seo_rewrite),
            http_timeout: parse_var::<u64>("HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            model_timeout: parse_var::<u64>("MODEL_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_timeout),
            rate_limit_per_minute,
        })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.public_dir.join("images")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Configuration(format!("{} has an invalid value ({}): {}", name, raw, e))),
        None => Ok(None),
    }
}

fn parse_bool_var(name: &str) -> Result<Option<bool>, AppError> {
    match non_empty_var(name).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(v) => Err(AppError::Configuration(format!("{} must be a boolean, got {}", name, v))),
        None => Ok(None),
    }
}

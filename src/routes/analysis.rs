use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::analysis::{encode_image, AnalysisKind, AnalysisRecord};
use crate::error::AppError;
use crate::AppState;

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

struct ImageUpload {
    mime: String,
    bytes: Vec<u8>,
}

/// Identify algae in an aquarium photo
#[utoipa::path(
    post,
    path = "/api/analyze-algae",
    tag = "Analysis",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` field (JPEG or PNG, max 10 MiB)"),
    responses(
        (status = 200, description = "Validated analysis", body = AnalysisRecord),
        (status = 400, description = "Missing or unsupported image"),
        (status = 413, description = "Image larger than 10 MiB"),
        (status = 422, description = "Model response did not match the algae schema"),
        (status = 500, description = "Model call failed")
    )
)]
pub async fn analyze_algae(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisRecord>, AppError> {
    analyze(&state, AnalysisKind::Algae, multipart).await
}

/// Diagnose visible fish health issues in a photo
#[utoipa::path(
    post,
    path = "/api/analyze-fish",
    tag = "Analysis",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` field (JPEG or PNG, max 10 MiB)"),
    responses(
        (status = 200, description = "Validated analysis", body = AnalysisRecord),
        (status = 400, description = "Missing or unsupported image"),
        (status = 413, description = "Image larger than 10 MiB"),
        (status = 422, description = "Model response did not match the fish health schema"),
        (status = 500, description = "Model call failed")
    )
)]
pub async fn analyze_fish(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisRecord>, AppError> {
    analyze(&state, AnalysisKind::FishHealth, multipart).await
}

#[tracing::instrument(skip(state, multipart))]
async fn analyze(state: &AppState, kind: AnalysisKind, mut multipart: Multipart) -> Result<Json<AnalysisRecord>, AppError> {
    let upload = read_image(&mut multipart).await?;
    info!("Analyzing {} byte {} upload", upload.bytes.len(), upload.mime);

    let encoded = encode_image(&upload.bytes);
    let raw = state
        .vision
        .analyze_image(kind, &upload.mime, &encoded)
        .await
        .map_err(|e| {
            error!("Error analyzing {:?} image: {}", kind, e);
            e
        })?;

    let result = kind.validate(raw).map_err(|errors| {
        error!("Invalid analysis result format: {:?}", errors);
        AppError::InvalidAnalysis(errors)
    })?;

    Ok(Json(AnalysisRecord::new(kind, &upload.mime, &encoded, result)))
}

async fn read_image(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }

        let mime = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(AppError::InvalidRequest("Only JPEG and PNG images are allowed".to_string()));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            break;
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge("Image exceeds the 10 MiB limit".to_string()));
        }

        let mime = if mime == "image/jpg" { "image/jpeg".to_string() } else { mime };
        return Ok(ImageUpload {
            mime,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::InvalidRequest("No image file provided".to_string()))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Image exceeds the 10 MiB limit".to_string())
    } else {
        AppError::InvalidRequest(format!("malformed multipart body: {}", e.body_text()))
    }
}

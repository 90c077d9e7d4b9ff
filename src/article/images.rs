use std::path::{Path, PathBuf};

use futures::future::join_all;

use super::extract::ImageRef;
use super::fetch::PageFetcher;
use super::PipelineWarning;
use crate::error::AppError;

/// Downloads article images into the public tree. Best effort: failures are
/// reported as warnings and never abort the pipeline.
#[derive(Debug, Clone)]
pub struct ImageMaterializer {
    fetcher: PageFetcher,
    public_dir: PathBuf,
}

impl ImageMaterializer {
    pub fn new(fetcher: PageFetcher, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            public_dir: public_dir.into(),
        }
    }

    /// Filesystem location for a `/images/...` local path.
    pub fn file_path(&self, local_path: &str) -> PathBuf {
        self.public_dir.join(local_path.trim_start_matches('/'))
    }

    #[tracing::instrument(skip_all, fields(count = images.len()))]
    pub async fn materialize(&self, images: &[ImageRef]) -> Vec<PipelineWarning> {
        let downloads = images.iter().map(|image| async move {
            match self.download(image).await {
                Ok(path) => {
                    tracing::info!("Image downloaded and saved to {}", path.display());
                    None
                }
                Err(e) => {
                    tracing::debug!("Error downloading image from {}: {}", image.original_source, e);
                    Some(PipelineWarning::ImageDownload {
                        source: image.original_source.to_string(),
                        local_path: image.local_path.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        });

        join_all(downloads).await.into_iter().flatten().collect()
    }

    async fn download(&self, image: &ImageRef) -> Result<PathBuf, AppError> {
        let bytes = self.fetcher.fetch_bytes(&image.original_source).await?;
        let path = self.file_path(&image.local_path);
        write_file(&path, &bytes).await?;
        Ok(path)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::ProcessingError(format!("failed to create {}: {}", dir.display(), e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::ProcessingError(format!("failed to write {}: {}", path.display(), e)))
}

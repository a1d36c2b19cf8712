use std::path::Path;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use crate::error::SetupError;

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into the file at `dest`, creating or truncating it.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), SetupError>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("setup-coursier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SetupError::Download(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), SetupError> {
        tracing::info!("downloading {url}");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SetupError::Download(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::Download(format!("{url} returned HTTP {status}")));
        }

        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message("Downloading coursier");

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SetupError::Download(format!("download stream failed: {e}")))?
        {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;

        pb.finish_with_message("Download complete");
        tracing::debug!("saved {url} to {}", dest.display());
        Ok(())
    }
}

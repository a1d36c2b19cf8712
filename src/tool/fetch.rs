use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::{HostOs, ToolSpec};
use crate::error::SetupError;
use crate::platform::{self, ArchiveKind};

use super::download::Downloader;
use super::unpack;

/// An executable freshly unpacked from a release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBinary {
    pub path: PathBuf,
    pub os: HostOs,
}

pub struct ArchiveFetcher {
    downloader: Box<dyn Downloader>,
    os_identifier: String,
    temp_dir: PathBuf,
}

impl ArchiveFetcher {
    pub fn new(downloader: Box<dyn Downloader>, os_identifier: String, temp_dir: PathBuf) -> Self {
        Self {
            downloader,
            os_identifier,
            temp_dir,
        }
    }

    pub async fn fetch(&self, tool: &ToolSpec) -> Result<FetchedBinary, SetupError> {
        let download = platform::resolve(&self.os_identifier, tool.architecture, &tool.version)?;

        let guid = self.temp_dir.join(Uuid::new_v4().to_string());
        self.downloader.download(&download.url, &guid).await?;

        // The unpacked file is named after the archive minus this extension.
        let archive = unpack::with_extension_appended(&guid, download.kind.extension());
        tokio::fs::rename(&guid, &archive).await?;

        let binary = match download.kind {
            ArchiveKind::Gzip => unpack::gunzip(&archive)?,
            ArchiveKind::Zip => unpack::extract_entry(&archive, &download.zip_entry(), &guid)?,
        };

        // Every archive kind must leave a file behind.
        ensure_binary(&binary)?;
        unpack::make_executable(&binary)?;

        tracing::info!("unpacked {} to {}", download.asset, binary.display());
        Ok(FetchedBinary {
            path: binary,
            os: download.os,
        })
    }
}

fn ensure_binary(path: &Path) -> Result<(), SetupError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SetupError::DownloadMissing(path.to_path_buf()))
    }
}

use std::path::{Path, PathBuf};

use crate::config::ToolSpec;
use crate::error::SetupError;
use crate::workflow::Workflow;

use super::fetch::ArchiveFetcher;

/// Cache slot identity. The requested architecture is deliberately absent:
/// a slot filled for one architecture is reused for any other with the same
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub name: &'a str,
    pub version: &'a str,
}

impl<'a> From<&'a ToolSpec> for CacheKey<'a> {
    fn from(tool: &'a ToolSpec) -> Self {
        Self {
            name: tool.name,
            version: &tool.version,
        }
    }
}

/// Host tool cache laid out as `<root>/<name>/<version>/<host-arch>/`, with a
/// `<host-arch>.complete` marker next to each finished slot.
pub struct ToolCache {
    root: PathBuf,
    host_arch: String,
    fetcher: ArchiveFetcher,
}

impl ToolCache {
    pub fn new(root: PathBuf, host_arch: String, fetcher: ArchiveFetcher) -> Self {
        Self {
            root,
            host_arch,
            fetcher,
        }
    }

    fn slot_dir(&self, key: CacheKey<'_>) -> PathBuf {
        self.root.join(key.name).join(key.version).join(&self.host_arch)
    }

    fn marker(&self, key: CacheKey<'_>) -> PathBuf {
        self.root
            .join(key.name)
            .join(key.version)
            .join(format!("{}.complete", self.host_arch))
    }

    pub fn find(&self, key: CacheKey<'_>) -> Option<PathBuf> {
        let dir = self.slot_dir(key);
        (dir.is_dir() && self.marker(key).is_file()).then_some(dir)
    }

    /// Copy `source` into the slot for `key` as `target_name`, replacing
    /// whatever the slot held, and mark it complete.
    pub fn cache_file(
        &self,
        source: &Path,
        target_name: &str,
        key: CacheKey<'_>,
    ) -> Result<PathBuf, SetupError> {
        let dir = self.slot_dir(key);
        let marker = self.marker(key);

        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        std::fs::copy(source, dir.join(target_name))?;
        std::fs::write(&marker, b"")?;

        tracing::debug!("cached {} {} in {}", key.name, key.version, dir.display());
        Ok(dir)
    }

    /// Return the tool's executable, fetching and caching it on a miss. The
    /// slot directory is added to the workflow search path either way.
    pub async fn acquire(
        &self,
        tool: &ToolSpec,
        workflow: &mut Workflow,
    ) -> Result<PathBuf, SetupError> {
        let key = CacheKey::from(tool);

        let dir = match self.find(key) {
            Some(dir) => {
                tracing::debug!("found {} {} in tool cache", tool.name, tool.version);
                dir
            }
            None => {
                tracing::info!("{} {} not cached, downloading", tool.name, tool.version);
                let fetched = self.fetcher.fetch(tool).await?;
                self.cache_file(&fetched.path, fetched.os.executable_name(), key)?
            }
        };

        workflow.add_path(&dir)?;
        single_executable(&dir)
    }
}

fn single_executable(dir: &Path) -> Result<PathBuf, SetupError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(SetupError::DownloadMissing(dir.to_path_buf()))
}

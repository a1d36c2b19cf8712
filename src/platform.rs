use crate::config::{Architecture, HostOs};
use crate::error::SetupError;

const RELEASES_URL: &str = "https://github.com/coursier/coursier/releases/download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A single gzip-compressed executable.
    Gzip,
    /// A zip archive holding the executable among other entries.
    Zip,
}

impl ArchiveKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zip => "zip",
        }
    }
}

/// Release asset to fetch for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDownload {
    pub os: HostOs,
    pub url: String,
    pub kind: ArchiveKind,
    /// Asset name without the archive extension, e.g. `cs-x86_64-pc-linux`.
    pub asset: String,
}

impl PlatformDownload {
    /// Name of the executable inside a zip asset.
    pub fn zip_entry(&self) -> String {
        format!("{}.exe", self.asset)
    }
}

fn platform_suffix(os: HostOs) -> (&'static str, ArchiveKind) {
    match os {
        HostOs::Linux => ("-pc-linux", ArchiveKind::Gzip),
        HostOs::MacOs => ("-apple-darwin", ArchiveKind::Gzip),
        HostOs::Windows => ("-pc-win32", ArchiveKind::Zip),
    }
}

pub fn resolve(
    os_identifier: &str,
    architecture: Architecture,
    version: &str,
) -> Result<PlatformDownload, SetupError> {
    let os = HostOs::from_identifier(os_identifier)?;
    let (suffix, kind) = platform_suffix(os);
    let asset = format!("cs-{}{suffix}", architecture.as_str());
    let url = format!("{RELEASES_URL}/v{version}/{asset}.{}", kind.extension());

    tracing::debug!("resolved {os:?} to {url}");

    Ok(PlatformDownload {
        os,
        url,
        kind,
        asset,
    })
}

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::SetupError;

pub const TOOL_NAME: &str = "cs";
pub const DEFAULT_VERSION: &str = "2.1.0-M7-39-gb8f3d7532";

/// Accepted values of the `architecture` input. The first one is the default.
///
/// `aarch6` is the literal spelling the action has always accepted. It does not
/// match the `aarch64` release assets, but changing it would change which
/// inputs are rejected, so it stays as is.
pub const VALID_ARCHITECTURES: &[&str] = &["x86_64", "aarch6"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    /// Accepts the runner's `RUNNER_OS` values as well as the
    /// `std::env::consts::OS` and Node `process.platform` spellings.
    pub fn from_identifier(id: &str) -> Result<Self, SetupError> {
        match id.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" | "win32" => Ok(Self::Windows),
            _ => Err(SetupError::UnknownPlatform(id.to_string())),
        }
    }

    pub fn executable_name(self) -> &'static str {
        match self {
            Self::Windows => "cs.exe",
            Self::Linux | Self::MacOs => "cs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture(&'static str);

impl Architecture {
    pub fn parse(value: &str) -> Result<Self, SetupError> {
        VALID_ARCHITECTURES
            .iter()
            .copied()
            .find(|valid| *valid == value)
            .map(Self)
            .ok_or(SetupError::InvalidArchitecture {
                valid: VALID_ARCHITECTURES,
            })
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self(VALID_ARCHITECTURES[0])
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The tool being installed, fixed once the architecture input is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub version: String,
    pub architecture: Architecture,
}

/// Action inputs with defaults applied. Empty inputs count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub version: String,
    pub architecture: String,
    pub jvm: Option<String>,
    pub apps: Vec<String>,
}

impl SetupConfig {
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            version: non_empty(cli.version).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            architecture: non_empty(cli.architecture)
                .unwrap_or_else(|| Architecture::default().to_string()),
            jvm: non_empty(cli.jvm),
            apps: cli
                .apps
                .as_deref()
                .map(|apps| apps.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Snapshot of the runner environment, taken once at startup.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    /// Raw OS identifier, resolved to a [`HostOs`] only when a download is needed.
    pub os: String,
    pub host_arch: String,
    pub temp_dir: PathBuf,
    pub tool_cache_dir: PathBuf,
    pub home_dir: PathBuf,
    pub java_home: Option<String>,
    pub path: Option<OsString>,
    pub github_path: Option<PathBuf>,
    pub github_env: Option<PathBuf>,
    pub github_output: Option<PathBuf>,
}

impl RunnerContext {
    pub fn from_env() -> Result<Self, SetupError> {
        let home_dir = dirs::home_dir().ok_or(SetupError::NoHomeDir)?;

        let os = std::env::var("RUNNER_OS")
            .ok()
            .filter(|os| !os.is_empty())
            .unwrap_or_else(|| std::env::consts::OS.to_string());

        let tool_cache_dir = env_path("RUNNER_TOOL_CACHE")
            .unwrap_or_else(|| home_dir.join(".setup-coursier").join("tool-cache"));

        Ok(Self {
            os,
            host_arch: runner_arch(std::env::consts::ARCH).to_string(),
            temp_dir: env_path("RUNNER_TEMP").unwrap_or_else(std::env::temp_dir),
            tool_cache_dir,
            home_dir,
            java_home: std::env::var("JAVA_HOME").ok().filter(|h| !h.is_empty()),
            path: std::env::var_os("PATH"),
            github_path: env_path("GITHUB_PATH"),
            github_env: env_path("GITHUB_ENV"),
            github_output: env_path("GITHUB_OUTPUT"),
        })
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Architecture names used by the hosted tool cache layout.
fn runner_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    }
}

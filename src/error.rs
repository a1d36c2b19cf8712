use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid architecture specified. Valid options are: {}", .valid.join(", "))]
    InvalidArchitecture { valid: &'static [&'static str] },

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Platform dispatch finished without leaving a binary behind.
    #[error("Couldn't download coursier (no binary at {})", .0.display())]
    DownloadMissing(PathBuf),

    #[error("download failed: {0}")]
    Download(String),

    #[error("failed to unpack {}: {message}", .archive.display())]
    Extract { archive: PathBuf, message: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `stderr` holds the last lines the command wrote there, possibly empty.
    #[error("`{command}` failed with {status}{}", stderr_suffix(.stderr))]
    Subprocess {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("cannot determine home directory")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

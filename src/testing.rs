//! Fakes and fixtures shared by unit tests.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::RunnerContext;
use crate::error::SetupError;
use crate::exec::CommandRunner;
use crate::tool::Downloader;

pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Runner context rooted in `root`, with file commands enabled.
pub fn runner_context(root: &Path, os: &str) -> RunnerContext {
    let github = root.join("github");
    std::fs::create_dir_all(&github).unwrap();
    RunnerContext {
        os: os.to_string(),
        host_arch: "x64".into(),
        temp_dir: root.join("temp"),
        tool_cache_dir: root.join("toolcache"),
        home_dir: root.join("home"),
        java_home: None,
        path: None,
        github_path: Some(github.join("path")),
        github_env: Some(github.join("env")),
        github_output: Some(github.join("output")),
    }
}

/// Serves a release asset built from the requested URL and records every URL.
#[derive(Clone, Default)]
pub struct FakeDownloader {
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeDownloader {
    pub const BINARY: &'static [u8] = b"#!/bin/sh\necho coursier\n";

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), SetupError> {
        self.urls.lock().unwrap().push(url.to_string());

        let asset = url.rsplit('/').next().unwrap_or_default();
        let body = match asset.strip_suffix(".zip") {
            Some(stem) => zip_bytes(&[
                ("README", b"coursier".as_slice()),
                (format!("{stem}.exe").as_str(), Self::BINARY),
            ]),
            None => gzip_bytes(Self::BINARY),
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, body)?;
        Ok(())
    }
}

/// Records invocations. `java-home` answers with a fixed path; a command whose
/// first argument equals `fail_on` exits non-zero.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    java_home: String,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn with_java_home(java_home: &str) -> Self {
        Self {
            java_home: java_home.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_on(first_arg: &str) -> Self {
        Self {
            fail_on: Some(first_arg.to_string()),
            ..Self::with_java_home("/opt/jvm/17")
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn args(&self) -> Vec<Vec<String>> {
        self.calls().into_iter().map(|(_, args)| args).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _env: &[(OsString, OsString)],
    ) -> Result<String, SetupError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));

        let first = args.first().map(String::as_str);
        if first.is_some() && first == self.fail_on.as_deref() {
            return Err(SetupError::Subprocess {
                command: format!("{} {}", program.display(), args.join(" ")),
                status: "exit status: 1".into(),
                stderr: format!("{} failed", args.join(" ")),
            });
        }
        match first {
            Some("java-home") => Ok(self.java_home.clone()),
            _ => Ok(String::new()),
        }
    }
}

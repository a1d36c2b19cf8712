use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::SetupError;

/// Lines of stderr kept for the error of a failed command.
const STDERR_TAIL_LINES: usize = 20;

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion and return its trimmed stdout.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &[(OsString, OsString)],
    ) -> Result<String, SetupError>;
}

/// Spawns real processes. Both streams are echoed to the log line by line;
/// stdout is returned, the tail of stderr ends up in the error on failure.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &[(OsString, OsString)],
    ) -> Result<String, SetupError> {
        let command_line = display_command(program, args);
        tracing::info!("[command]{command_line}");

        let mut child = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SetupError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let (stdout, stderr) = tokio::join!(
            read_lines(child.stdout.take(), Stream::Stdout),
            read_lines(child.stderr.take(), Stream::Stderr),
        );
        // Wait before looking at read errors so the child is always reaped.
        let status = child.wait().await?;
        let stdout = stdout?;
        let stderr = stderr?;

        if !status.success() {
            return Err(SetupError::Subprocess {
                command: command_line,
                status: status.to_string(),
                stderr: tail(&stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(stdout.trim().to_string())
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read a child stream to the end, decoding each line lossily.
async fn read_lines<R>(reader: Option<R>, stream: Stream) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut collected = String::new();
    let Some(reader) = reader else {
        return Ok(collected);
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        match stream {
            Stream::Stdout => tracing::info!("{line}"),
            Stream::Stderr => tracing::warn!("{line}"),
        }
        collected.push_str(line);
        collected.push('\n');
    }
    Ok(collected)
}

fn tail(text: &str, lines: usize) -> String {
    let mut kept: VecDeque<&str> = VecDeque::with_capacity(lines);
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if kept.len() == lines {
            kept.pop_front();
        }
        kept.push_back(line);
    }
    kept.into_iter().collect::<Vec<_>>().join("\n")
}

fn display_command(program: &Path, args: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

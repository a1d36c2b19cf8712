//! Runner side of the action: search path, exported variables, outputs and
//! log groups, written as GitHub Actions workflow and file commands.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::RunnerContext;
use crate::error::SetupError;

pub struct Workflow {
    github_path: Option<PathBuf>,
    github_env: Option<PathBuf>,
    github_output: Option<PathBuf>,
    base_path: Option<OsString>,
    /// In the order they were added; later entries shadow earlier ones.
    search_path: Vec<PathBuf>,
    env: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
    /// Workflow commands printed so far, in order.
    #[cfg_attr(not(test), allow(dead_code))]
    commands: Vec<String>,
}

impl Workflow {
    pub fn from_context(context: &RunnerContext) -> Self {
        Self {
            github_path: context.github_path.clone(),
            github_env: context.github_env.clone(),
            github_output: context.github_output.clone(),
            base_path: context.path.clone(),
            search_path: Vec::new(),
            env: BTreeMap::new(),
            outputs: BTreeMap::new(),
            commands: Vec::new(),
        }
    }

    /// Prepend `dir` to the search path of this process's children and of
    /// later steps. Adding a directory twice is a no-op.
    pub fn add_path(&mut self, dir: &Path) -> Result<(), SetupError> {
        if self.search_path.iter().any(|p| p == dir) {
            return Ok(());
        }
        match &self.github_path {
            Some(file) => append(file, &format!("{}\n", dir.display()))?,
            None => tracing::warn!("GITHUB_PATH is not set, {} only added for this run", dir.display()),
        }
        self.search_path.push(dir.to_path_buf());
        Ok(())
    }

    pub fn export_variable(&mut self, name: &str, value: &str) -> Result<(), SetupError> {
        match &self.github_env {
            Some(file) => append(file, &key_value_command(name, value))?,
            None => tracing::warn!("GITHUB_ENV is not set, {name} only exported for this run"),
        }
        self.env.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_output(&mut self, name: &str, value: &str) -> Result<(), SetupError> {
        match &self.github_output {
            Some(file) => append(file, &key_value_command(name, value))?,
            None => tracing::warn!("GITHUB_OUTPUT is not set, output {name}={value} dropped"),
        }
        self.outputs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn start_group(&mut self, name: &str) {
        self.emit(format!("::group::{}", escape_data(name)));
    }

    pub fn end_group(&mut self) {
        self.emit("::endgroup::".to_string());
    }

    fn emit(&mut self, line: String) {
        command(&line);
        self.commands.push(line);
    }

    #[cfg(test)]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    #[cfg(test)]
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    #[cfg(test)]
    pub fn exported(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    #[cfg(test)]
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    /// Variables to set on child processes: everything exported so far plus
    /// `PATH` with the added directories in front, most recent first.
    pub fn child_env(&self) -> Result<Vec<(OsString, OsString)>, SetupError> {
        let mut env: Vec<(OsString, OsString)> = self
            .env
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect();

        if !self.search_path.is_empty() {
            let base = self
                .base_path
                .as_deref()
                .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
                .unwrap_or_default();
            let path = std::env::join_paths(self.search_path.iter().rev().cloned().chain(base))
                .map_err(|e| SetupError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;
            env.push((OsString::from("PATH"), path));
        }
        Ok(env)
    }
}

/// Report the run as failed on the runner's error channel.
pub fn report_failure(message: &str) {
    command(&format!("::error::{}", escape_data(message)));
}

fn command(line: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
        tracing::warn!("failed to write workflow command `{line}`: {err}");
    }
}

fn append(file: &Path, content: &str) -> Result<(), SetupError> {
    let mut f = OpenOptions::new().create(true).append(true).open(file)?;
    f.write_all(content.as_bytes())?;
    Ok(())
}

/// Heredoc-style entry understood by `GITHUB_ENV` and `GITHUB_OUTPUT`.
fn key_value_command(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::runner_context;
    use tempfile::tempdir;

    #[test]
    fn add_path_appends_to_file_once() {
        let dir = tempdir().unwrap();
        let context = runner_context(dir.path(), "linux");
        let mut workflow = Workflow::from_context(&context);

        workflow.add_path(Path::new("/opt/cs")).unwrap();
        workflow.add_path(Path::new("/opt/jvm/bin")).unwrap();
        workflow.add_path(Path::new("/opt/cs")).unwrap();

        let written = std::fs::read_to_string(context.github_path.unwrap()).unwrap();
        assert_eq!(written, "/opt/cs\n/opt/jvm/bin\n");
        assert_eq!(
            workflow.search_path(),
            &[PathBuf::from("/opt/cs"), PathBuf::from("/opt/jvm/bin")]
        );
    }

    #[test]
    fn export_variable_writes_delimited_block() {
        let dir = tempdir().unwrap();
        let context = runner_context(dir.path(), "linux");
        let mut workflow = Workflow::from_context(&context);

        workflow.export_variable("JAVA_HOME", "/opt/jvm").unwrap();

        let written = std::fs::read_to_string(context.github_env.unwrap()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        let delimiter = lines[0].strip_prefix("JAVA_HOME<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines[1], "/opt/jvm");
        assert_eq!(lines[2], delimiter);
        assert_eq!(workflow.exported("JAVA_HOME"), Some("/opt/jvm"));
    }

    #[test]
    fn set_output_writes_output_file() {
        let dir = tempdir().unwrap();
        let context = runner_context(dir.path(), "linux");
        let mut workflow = Workflow::from_context(&context);

        workflow.set_output("cs-version", "2.1.0").unwrap();

        let written = std::fs::read_to_string(context.github_output.unwrap()).unwrap();
        assert!(written.starts_with("cs-version<<ghadelimiter_"));
        assert!(written.contains("\n2.1.0\n"));
        assert_eq!(workflow.output("cs-version"), Some("2.1.0"));
    }

    #[test]
    fn works_without_file_commands() {
        let dir = tempdir().unwrap();
        let mut context = runner_context(dir.path(), "linux");
        context.github_path = None;
        context.github_env = None;
        context.github_output = None;
        let mut workflow = Workflow::from_context(&context);

        workflow.add_path(Path::new("/opt/cs")).unwrap();
        workflow.export_variable("COURSIER_BIN_DIR", "/home/u/cs/bin").unwrap();
        workflow.set_output("cs-version", "2.1.0").unwrap();

        assert_eq!(workflow.search_path().len(), 1);
        assert_eq!(workflow.exported("COURSIER_BIN_DIR"), Some("/home/u/cs/bin"));
        assert_eq!(workflow.output("cs-version"), Some("2.1.0"));
    }

    #[test]
    fn child_path_puts_latest_directory_first() {
        let dir = tempdir().unwrap();
        let mut context = runner_context(dir.path(), "linux");
        context.path = Some(std::env::join_paths(["/usr/bin", "/bin"]).unwrap());
        let mut workflow = Workflow::from_context(&context);

        workflow.add_path(Path::new("/tool")).unwrap();
        workflow.add_path(Path::new("/jvm/bin")).unwrap();
        workflow.export_variable("JAVA_HOME", "/jvm").unwrap();

        let env = workflow.child_env().unwrap();
        let path = env
            .iter()
            .find(|(k, _)| k == "PATH")
            .map(|(_, v)| std::env::split_paths(v).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(
            path,
            vec![
                PathBuf::from("/jvm/bin"),
                PathBuf::from("/tool"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
            ]
        );
        assert!(env.iter().any(|(k, v)| k == "JAVA_HOME" && v == "/jvm"));
    }

    #[test]
    fn groups_are_recorded_in_order() {
        let dir = tempdir().unwrap();
        let context = runner_context(dir.path(), "linux");
        let mut workflow = Workflow::from_context(&context);

        workflow.start_group("Install 50%\nnow");
        workflow.end_group();

        assert_eq!(
            workflow.commands(),
            &["::group::Install 50%25%0Anow".to_string(), "::endgroup::".to_string()]
        );
    }

    #[test]
    fn escapes_command_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
    }
}

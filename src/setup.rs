use std::path::{Path, PathBuf};

use crate::config::{Architecture, RunnerContext, SetupConfig, ToolSpec, TOOL_NAME};
use crate::error::SetupError;
use crate::exec::CommandRunner;
use crate::tool::{ArchiveFetcher, Downloader, ToolCache};
use crate::workflow::Workflow;

/// The install sequence: validate, install Coursier, install a JVM, install
/// apps. The first error stops the sequence; finished phases are kept.
pub struct Setup {
    config: SetupConfig,
    java_home: Option<String>,
    home_dir: PathBuf,
    cache: ToolCache,
    runner: Box<dyn CommandRunner>,
    workflow: Workflow,
}

impl Setup {
    pub fn new(
        config: SetupConfig,
        context: &RunnerContext,
        downloader: Box<dyn Downloader>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        let fetcher = ArchiveFetcher::new(downloader, context.os.clone(), context.temp_dir.clone());
        let cache = ToolCache::new(
            context.tool_cache_dir.clone(),
            context.host_arch.clone(),
            fetcher,
        );

        Self {
            config,
            java_home: context.java_home.clone(),
            home_dir: context.home_dir.clone(),
            cache,
            runner,
            workflow: Workflow::from_context(context),
        }
    }

    #[cfg(test)]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub async fn run(&mut self) -> Result<(), SetupError> {
        let architecture = Architecture::parse(&self.config.architecture)?;
        let tool = ToolSpec {
            name: TOOL_NAME,
            version: self.config.version.clone(),
            architecture,
        };

        self.workflow.start_group("Install Coursier");
        let result = self.install_coursier(&tool).await;
        self.workflow.end_group();
        result?;

        self.workflow.start_group("Install JVM");
        let result = self.install_jvm(&tool).await;
        self.workflow.end_group();
        result?;

        self.workflow.start_group("Install Apps");
        let result = self.install_apps(&tool).await;
        self.workflow.end_group();
        result
    }

    async fn install_coursier(&mut self, tool: &ToolSpec) -> Result<(), SetupError> {
        self.cs(tool, vec!["--help".into()]).await?;
        self.workflow.set_output("cs-version", &tool.version)
    }

    async fn install_jvm(&mut self, tool: &ToolSpec) -> Result<(), SetupError> {
        if self.config.jvm.is_none() {
            if let Some(java_home) = &self.java_home {
                tracing::info!("skipping, JVM is already installed in {java_home}");
                return Ok(());
            }
        }

        let jvm_args: Vec<String> = match &self.config.jvm {
            Some(jvm) => vec!["--jvm".into(), jvm.clone()],
            None => Vec::new(),
        };

        let mut java = vec!["java".to_string()];
        java.extend(jvm_args.iter().cloned());
        java.push("-version".into());
        self.cs(tool, java).await?;

        let mut java_home_args = vec!["java-home".to_string()];
        java_home_args.extend(jvm_args);
        let java_home = self.cs(tool, java_home_args).await?;

        self.workflow.export_variable("JAVA_HOME", &java_home)?;
        self.workflow.add_path(&Path::new(&java_home).join("bin"))
    }

    async fn install_apps(&mut self, tool: &ToolSpec) -> Result<(), SetupError> {
        if self.config.apps.is_empty() {
            return Ok(());
        }

        let bin_dir = self.home_dir.join("cs").join("bin");
        self.workflow
            .export_variable("COURSIER_BIN_DIR", &bin_dir.to_string_lossy())?;
        self.workflow.add_path(&bin_dir)?;

        let mut args = vec!["install".to_string(), "--contrib".to_string()];
        args.extend(self.config.apps.iter().cloned());
        self.cs(tool, args).await?;
        Ok(())
    }

    /// Run Coursier, acquiring it first if this is the first call.
    async fn cs(&mut self, tool: &ToolSpec, args: Vec<String>) -> Result<String, SetupError> {
        let program = self.cache.acquire(tool, &mut self.workflow).await?;
        let env = self.workflow.child_env()?;
        self.runner.run(&program, &args, &env).await
    }
}

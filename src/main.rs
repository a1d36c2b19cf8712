mod cli;
mod config;
mod error;
mod exec;
mod platform;
mod setup;
#[cfg(test)]
mod testing;
mod tool;
mod workflow;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use cli::Cli;
use config::{RunnerContext, SetupConfig};
use exec::ProcessRunner;
use setup::Setup;
use tool::HttpDownloader;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .without_time()
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            workflow::report_failure(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = SetupConfig::from_cli(cli);
    let context = RunnerContext::from_env().context("failed to read runner environment")?;

    tracing::debug!("inputs: {config:?}");
    tracing::debug!("tool cache: {}", context.tool_cache_dir.display());

    let downloader = HttpDownloader::new()?;
    let mut setup = Setup::new(config, &context, Box::new(downloader), Box::new(ProcessRunner));
    setup.run().await?;

    Ok(())
}

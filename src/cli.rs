use clap::Parser;

/// Install Coursier, a JVM and Coursier-managed applications on a CI runner.
///
/// Every option falls back to the matching `INPUT_*` variable set by the runner.
#[derive(Debug, Parser)]
#[command(name = "setup-coursier", about)]
pub struct Cli {
    /// Coursier release to install
    #[arg(long, env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Architecture of the Coursier binary (x86_64, aarch6)
    #[arg(long, env = "INPUT_ARCHITECTURE")]
    pub architecture: Option<String>,

    /// JVM to install, passed verbatim to `cs java --jvm`
    #[arg(long, env = "INPUT_JVM")]
    pub jvm: Option<String>,

    /// Whitespace-separated applications to install with `cs install`
    #[arg(long, env = "INPUT_APPS")]
    pub apps: Option<String>,
}

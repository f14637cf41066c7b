use cachectl_config::ConfigLoader;
use cachectl_core::BackendKind;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod execute;
mod formatters;

use commands::Commands;

#[derive(Parser)]
#[command(name = "cachectl")]
#[command(about = "Inspect and modify on-disk caches through cachetool", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the cachetool executable (defaults to $CACHETOOL_PATH, then a bundled copy, then $PATH)
    #[arg(long, global = true, value_name = "PATH")]
    cachetool: Option<PathBuf>,

    /// Cache backend (simple or blockfile)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Do not log cachetool invocations
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Kill cachetool after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.cachetool {
            loader = loader.executable(path.clone());
        }
        if let Some(backend) = self.backend {
            loader = loader.backend(backend);
        }
        if self.quiet {
            loader = loader.quiet(true);
        }
        if let Some(secs) = self.timeout {
            loader = loader.timeout(Duration::from_secs(secs));
        }
        loader
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = cachectl_utils::init(cli.verbose) {
        eprintln!("cachectl: failed to initialise logging: {e}");
    }

    let config = cli.loader().load()?;
    cli.command.execute(&config).await
}

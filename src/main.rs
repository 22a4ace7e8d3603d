use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cosmodrome::cli::{run_init, Collaborators, ReleaseOrchestrator};
use cosmodrome::config::DEFAULT_CONFIG_PATH;
use cosmodrome::error::exit_codes;
use cosmodrome::git::Git2Repository;
use cosmodrome::process::SystemRunner;
use cosmodrome::publish::GitHubPublisher;
use cosmodrome::ui::{ConsoleReporter, DialoguerPrompter, Reporter};
use cosmodrome::CosmodromeError;

#[derive(Parser)]
#[command(
    name = "cosmodrome",
    version,
    about = "Bump the project version, tag it and publish the release"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Only print warnings and errors")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut a new release of the current project
    Release {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, help = "Release configuration file")]
        config: PathBuf,
    },
    /// Scaffold the release configuration file
    Init {
        #[arg(short, long, help = "Overwrite an existing configuration")]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let reporter = if cli.quiet {
        ConsoleReporter::quiet()
    } else {
        ConsoleReporter::new()
    };

    let code = match execute(cli.command, &reporter).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            reporter.error(&format!("{:#}", err));
            match err.downcast_ref::<CosmodromeError>() {
                Some(e) => {
                    tracing::debug!(validation = e.is_validation(), "run aborted");
                    e.exit_code()
                }
                None => exit_codes::ERROR,
            }
        }
    };

    std::process::exit(code);
}

/// Console logging controlled by RUST_LOG (default: warn)
fn init_tracing() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();
}

async fn execute(command: Command, reporter: &ConsoleReporter) -> Result<()> {
    let root = std::env::current_dir().context("cannot determine the working directory")?;

    match command {
        Command::Init { force } => {
            run_init(&root, force, reporter)?;
        }
        Command::Release { config } => {
            let repository = Git2Repository::open(&root)?;
            let publisher = GitHubPublisher::for_root(&root)?;
            let deps = Collaborators {
                repository: &repository,
                runner: &SystemRunner,
                prompter: &DialoguerPrompter,
                reporter,
                publisher: &publisher,
            };

            let mut orchestrator = ReleaseOrchestrator::new(&root, &config, deps);
            if let Err(err) = orchestrator.run().await {
                let step = orchestrator.current_step();
                return Err(err).with_context(|| format!("release failed during {}", step));
            }
        }
    }

    Ok(())
}

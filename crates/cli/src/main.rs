mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use commands::run::RunOptions;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "preview-sweep")]
#[command(version, about = "Tear down preview deployments for a closed branch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Delete the GitHub environment and Cloudflare Pages deployments for a ref
    ///
    /// Reads REF_SLUG, GITHUB_REPOSITORY, GH_REPO_TOKEN, CF_ACCOUNT_ID,
    /// CF_PROJECT_NAME and CF_API_TOKEN from the environment.
    Run {
        /// TOML file with defaults (environment variables take precedence)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of deployment list pages to fetch
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,

        /// Per-request timeout in seconds (no timeout by default)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Run {
            config,
            dry_run,
            max_pages,
            timeout_secs,
        } => {
            commands::run::run(RunOptions {
                config,
                dry_run,
                max_pages,
                timeout_secs,
            })
            .await
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "preview-sweep", &mut io::stdout());
            Ok(())
        }
    }
}

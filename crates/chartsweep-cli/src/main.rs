//! chartsweep CLI - clean up Helm chart releases published to GitHub

use std::path::PathBuf;
use std::process::ExitCode;

use chartsweep_core::DEFAULT_VERSION_PATTERN;
use chartsweep_repo::{
    DEFAULT_API_URL, DEFAULT_BASE_BRANCH, DEFAULT_CHART_DIR, DEFAULT_PAGES_BRANCH,
    DeleteAllOptions,
};
use clap::{Args, Parser, Subcommand};

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use commands::{ChangedArgs, GlobalArgs};
use logging::LogLevel;

#[derive(Parser)]
#[command(name = "chartsweep")]
#[command(version)]
#[command(about = "Delete Helm chart releases, tags and index entries on GitHub", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Repository working directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    workdir: PathBuf,

    /// GitHub REST API URL
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every release of a repository
    DeleteAll {
        /// GitHub repository (owner/repo)
        #[arg(short, long, env = "GITHUB_REPOSITORY")]
        repository: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// Also delete the releases' tags
        #[arg(short = 't', long)]
        with_tags: bool,

        /// Also remove every entry from the chart index
        #[arg(short = 'i', long)]
        clean_index: bool,

        /// Branch holding index.yaml
        #[arg(short, long, default_value = DEFAULT_PAGES_BRANCH)]
        pages_branch: String,
    },

    /// Delete releases, tags and index entries of charts changed on this branch
    DeleteRelease {
        /// GitHub repository (owner/repo)
        #[arg(short, long, env = "GITHUB_REPOSITORY")]
        repository: String,

        #[command(flatten)]
        changed: ChangedOpts,
    },

    /// Same as delete-release with owner and repo given separately
    Cleanup {
        /// Repository owner
        #[arg(short, long)]
        owner: String,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        #[command(flatten)]
        changed: ChangedOpts,

        /// Remove every entry from the chart index instead, keeping releases
        /// (the version pattern is ignored)
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
struct ChangedOpts {
    /// Directory containing the charts
    #[arg(short = 'd', long, default_value = DEFAULT_CHART_DIR)]
    chart_dir: String,

    /// Branch holding index.yaml
    #[arg(short, long, default_value = DEFAULT_PAGES_BRANCH)]
    pages_branch: String,

    /// Branch changes are compared against
    #[arg(short, long, default_value = DEFAULT_BASE_BRANCH)]
    base_branch: String,

    /// Regular expression a chart version must match to be deleted
    #[arg(short, long, default_value = DEFAULT_VERSION_PATTERN)]
    version_pattern: String,
}

impl From<ChangedOpts> for ChangedArgs {
    fn from(opts: ChangedOpts) -> Self {
        Self {
            chart_dir: opts.chart_dir,
            base_branch: opts.base_branch,
            pages_branch: opts.pages_branch,
            version_pattern: opts.version_pattern,
        }
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let global = GlobalArgs {
        workdir: cli.workdir,
        api_url: cli.api_url,
    };

    match cli.command {
        Commands::DeleteAll {
            repository,
            force,
            with_tags,
            clean_index,
            pages_branch,
        } => {
            let options = DeleteAllOptions {
                force,
                with_tags,
                clean_index,
            };
            commands::delete_all::run(&global, &repository, options, &pages_branch).await
        }

        Commands::DeleteRelease {
            repository,
            changed,
        } => commands::delete_release::run(&global, &repository, &changed.into()).await,

        Commands::Cleanup {
            owner,
            repo,
            changed,
            all,
        } => commands::cleanup::run(&global, &owner, &repo, &changed.into(), all).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code as u8)
        }
    }
}

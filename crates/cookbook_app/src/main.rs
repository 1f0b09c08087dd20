use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cookbook_app::{api, config, logging, summary};
use cookbook_engine::{CatalogStore, EngineSettings, Orchestrator, PageFixer, RunOptions};
use cookbook_logging::{cookbook_error, cookbook_warn};

/// Scrapes n8n and Zapier templates into a local catalog.
#[derive(Debug, Parser)]
#[command(name = "cookbook", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Also write logs to this file.
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = logging::DEFAULT_LOG_FILE)]
    log_file: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape, merge and persist, then generate tutorials and metadata (default).
    Run(RunArgs),
    /// Serve the catalog over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Remove vote buttons and draft warnings from generated HTML pages.
    FixPages { dir: PathBuf },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Stop once the catalog is saved.
    #[arg(long)]
    scrape_only: bool,
    /// Skip tutorial generation.
    #[arg(long)]
    no_tutorials: bool,
    #[arg(long, default_value_t = 10)]
    n8n_limit: usize,
    #[arg(long, default_value_t = 10)]
    zapier_limit: usize,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        RunOptions {
            n8n_limit: args.n8n_limit,
            zapier_limit: args.zapier_limit,
            scrape_only: args.scrape_only,
            tutorials: !args.no_tutorials,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            cookbook_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command.unwrap_or(Command::Run(cli.run)) {
        Command::Run(args) => {
            let settings = config::from_env().context("invalid configuration")?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run(settings, args.into()))
        }
        Command::Serve { bind } => {
            let settings = config::from_env().context("invalid configuration")?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(api::serve(bind, CatalogStore::new(settings.output_dir)))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::FixPages { dir } => {
            let report = PageFixer::new()
                .fix_dir(&dir)
                .with_context(|| format!("cannot fix pages in {}", dir.display()))?;
            print!("{}", summary::render_fix(&report));
            Ok(if report.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run(settings: EngineSettings, options: RunOptions) -> anyhow::Result<ExitCode> {
    let orchestrator = Orchestrator::from_settings(&settings)?;
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cookbook_warn!("interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });

    let report = match orchestrator.run(&options).await {
        Ok(report) => report,
        Err(failure) => {
            print!("{}", summary::render_run(&failure.summary));
            return Err(failure.error.into());
        }
    };
    print!("{}", summary::render_run(&report));
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;

use ci_dispatch::commands::{self, Context};
use ci_dispatch::config::loader;
use ci_dispatch::inputs::parse_args;
use ci_dispatch::outputs::OutputWriter;
use ci_dispatch::services::RemoteServices;

#[derive(Parser)]
#[command(
    name = "ci-dispatch",
    version,
    about = "Run Jira, GitHub and Slack automation steps from CI"
)]
struct Cli {
    /// Command group, e.g. `jira`.
    #[arg(long, env = "INPUT_COMMAND", default_value = "")]
    command: String,

    /// Subcommand within the group, e.g. `update-status`.
    #[arg(long, env = "INPUT_SUBCOMMAND", default_value = "")]
    subcommand: String,

    /// Handler arguments as a JSON object.
    #[arg(long, env = "INPUT_ARGS", default_value = "")]
    args: String,

    /// Path to config file.
    #[arg(short, long, env = "INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug || runner_debug());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{e:?}");
            // Workflow command understood by the runner's log annotations.
            println!("::error::{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // rustls 0.23 no longer auto-installs a provider.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("crypto provider already installed");
    }

    let config = loader::load_config(cli.config.as_deref())?;
    let args = parse_args(&cli.args)?;
    let services = RemoteServices::new(&config);
    let mut outputs = OutputWriter::from_env();

    tracing::info!("running {} {}", cli.command, cli.subcommand);

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async {
        let mut ctx = Context {
            services: &services,
            config: &config,
            outputs: &mut outputs,
        };
        commands::dispatch(&mut ctx, &cli.command, &cli.subcommand, &args).await
    })
}

fn runner_debug() -> bool {
    std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1")
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

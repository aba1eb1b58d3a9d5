#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;
mod session;

use clap::{CommandFactory, Parser, Subcommand};
use context::{Context, find_journal_root};
use ease_core::config;
use ease_core::error::ErrorCode;
use output::{CliError, OutputMode, fail, report_failure};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "ease",
    author,
    version,
    about = "ease: capture worries, challenge them, let them go",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Session token for the web app (overrides EASE_SESSION and config).
    #[arg(long, global = true, value_name = "TOKEN")]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a journal",
        long_about = "Create a .ease journal in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a journal here\n    ease init\n\n    # Emit machine-readable output\n    ease init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Worries",
        subcommand,
        about = "Capture and manage worries",
        after_help = "EXAMPLES:\n    # Capture a worry\n    ease worry add \"Interview\" -d \"I might fail\" -i 7\n\n    # List active worries\n    ease worry list"
    )]
    Worry(cmd::worry::WorryCommand),

    #[command(
        next_help_heading = "Challenges",
        subcommand,
        about = "Challenge a worry step by step",
        long_about = "Walk a worry through six steps: evidence for, evidence against, probability, thinking patterns, helpfulness and a balanced thought.",
        after_help = "EXAMPLES:\n    # Start, answer, move on\n    ease challenge start <worry-id>\n    ease challenge evidence add \"I have prepared\"\n    ease challenge next\n\n    # Where am I?\n    ease challenge status"
    )]
    Challenge(cmd::challenge::ChallengeCommand),

    #[command(
        next_help_heading = "Challenges",
        about = "Reference cards for thinking patterns",
        after_help = "EXAMPLES:\n    # All patterns\n    ease distortions\n\n    # One pattern\n    ease distortions catastrophizing"
    )]
    Distortions(cmd::distortions::DistortionsArgs),

    #[command(
        next_help_heading = "Insights",
        about = "Show progress and challenge statistics",
        after_help = "EXAMPLES:\n    # Summary\n    ease stats\n\n    # Emit machine-readable output\n    ease stats --json"
    )]
    Stats,

    #[command(
        next_help_heading = "Setup",
        subcommand,
        about = "View and change settings"
    )]
    Settings(cmd::settings::SettingsCommand),

    #[command(
        next_help_heading = "Setup",
        subcommand,
        about = "Manage the web app account"
    )]
    Account(cmd::account::AccountCommand),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    ease completions bash > ~/.local/share/bash-completion/completions/ease"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EASE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ease=debug,ease_core=debug,info"
        } else {
            "ease=info,ease_core=info,warn"
        })
    });

    let format = env::var("EASE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let mut output = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    match run(&cli, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(output, &err);
            ExitCode::FAILURE
        }
    }
}

/// Resolve config into `output`, then dispatch the command.
fn run(cli: &Cli, output: &mut OutputMode) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;

    let root = find_journal_root(&cwd).unwrap_or_else(|| cwd.clone());
    let config = match config::resolve_config(&root, cli.json) {
        Ok(config) => config,
        Err(err) => {
            return Err(fail(
                *output,
                &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
            ));
        }
    };
    *output = OutputMode::from_resolved(&config.resolved_output);
    let output = *output;
    tracing::debug!(root = %root.display(), ?output, "config resolved");

    let session = cli.session.as_deref();
    let journal_cwd = cwd.clone();
    let context = move || Context::new(journal_cwd, output, config, session);
    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &cwd),
        Commands::Worry(command) => cmd::worry::run(command, &context()),
        Commands::Challenge(command) => cmd::challenge::run(command, &context()),
        Commands::Distortions(args) => cmd::distortions::run_distortions(args, output),
        Commands::Stats => cmd::stats::run_stats(&context()),
        Commands::Settings(command) => cmd::settings::run(command, &context()),
        Commands::Account(command) => cmd::account::run(command, &context()),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

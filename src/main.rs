use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repowiki::cli::commands::{self, generate::GenerateOptions};

#[derive(Parser)]
#[command(name = "repowiki")]
#[command(
    version,
    about = "Generate topic-structured documentation for a repository with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (skips global/project layers)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a repository and generate its documentation
    Generate {
        #[arg(help = "Git URL or local directory")]
        source: String,
        #[arg(long, short, help = "Branch to clone")]
        branch: Option<String>,
        #[arg(long, short, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (claude-code, openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Concurrent synthesis calls")]
        concurrency: Option<usize>,
        #[arg(long, help = "Per-call timeout in seconds")]
        timeout: Option<u64>,
        #[arg(long = "no-refine", help = "Use the heuristic plan as is")]
        no_refine: bool,
        #[arg(long = "no-overview", help = "Skip the system overview page")]
        no_overview: bool,
        #[arg(long, help = "Print the run report as JSON")]
        json: bool,
    },

    /// Index a directory and show topic candidates (no LLM calls)
    Scan {
        #[arg(help = "Directory to scan (default: current directory)")]
        path: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        #[arg(long, help = "Print as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mrepowiki encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "repowiki=debug,info"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Generate {
            source,
            branch,
            output,
            provider,
            model,
            concurrency,
            timeout,
            no_refine,
            no_overview,
            json,
        } => {
            commands::generate::run(
                GenerateOptions {
                    source,
                    branch,
                    output,
                    provider,
                    model,
                    concurrency,
                    timeout_secs: timeout,
                    no_refine,
                    no_overview,
                    json,
                },
                config_path,
                cli.quiet,
            )?;
        }
        Commands::Scan { path, format } => {
            commands::scan::run(path, &format, config_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::config::show(json, config_path)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}

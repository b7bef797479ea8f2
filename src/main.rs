//! binfetch CLI entry point

use binfetch::cli::{Cli, Commands};
use binfetch::config::ConfigManager;
use binfetch::error::FetchResult;
use binfetch::ui::UiContext;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> FetchResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load()?;

    init_logging(cli.verbose, &config.general.log_format);
    let ctx = UiContext::detect().with_quiet(cli.quiet);

    match cli.command {
        Commands::Fetch(args) => binfetch::cli::commands::fetch(args, &config, &ctx),
        Commands::Key(args) => binfetch::cli::commands::key(args, &config),
        Commands::Cache(args) => binfetch::cli::commands::cache(args, &config),
        Commands::Config(args) => binfetch::cli::commands::config(args, &config, &manager, &ctx),
    }
}

// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("binfetch=warn"),
        1 => EnvFilter::new("binfetch=info"),
        _ => EnvFilter::new("binfetch=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

//! Cache command - inspect downloaded binaries

use crate::cache::{self, CachedBuild};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::FetchResult;
use console::style;
use std::path::Path;

/// Execute the cache command
pub fn execute(args: CacheArgs, config: &Config) -> FetchResult<()> {
    let cwd = super::current_dir()?;

    match args.action {
        CacheAction::List { format, checkout } => {
            let root = cache::resolve_root(config, checkout.as_deref(), &cwd)?;
            list_builds(&root, format)
        }
        CacheAction::Dir { checkout } => {
            let root = cache::resolve_root(config, checkout.as_deref(), &cwd)?;
            println!("{}", root.display());
            Ok(())
        }
    }
}

fn list_builds(root: &Path, format: OutputFormat) -> FetchResult<()> {
    let builds = cache::list_cached(root)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&builds)?);
        }
        OutputFormat::Plain => {
            for build in &builds {
                println!("{}", build.path.display());
            }
        }
        OutputFormat::Table if builds.is_empty() => {
            println!("No downloaded binaries in {}", root.display());
        }
        OutputFormat::Table => print_build_table(&builds),
    }

    Ok(())
}

fn print_build_table(builds: &[CachedBuild]) {
    println!("{:<40} {:<12} {:<20}", "KEY", "REVISION", "DOWNLOADED");
    println!("{}", "-".repeat(72));

    for build in builds {
        let downloaded = build
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:<12} {:<20}",
            build.key,
            style(&build.revision).green(),
            downloaded
        );
    }

    println!();
    println!("Total: {} build(s)", builds.len());
}

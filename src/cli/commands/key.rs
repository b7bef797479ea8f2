//! Key command - print the cache key for a build target

use crate::cli::args::TargetArgs;
use crate::config::Config;
use crate::error::FetchResult;
use crate::fetcher::{BuildTarget, SystemPlatform};

/// Execute the key command
pub fn execute(args: TargetArgs, config: &Config) -> FetchResult<()> {
    let platform = SystemPlatform::from_config(&config.platform);
    let target = BuildTarget::new(
        &args.port,
        &args.architecture,
        &args.configuration,
        &platform,
    )?;

    println!("{}", target.cache_key());
    Ok(())
}

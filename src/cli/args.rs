//! CLI argument definitions using clap derive

use crate::fetcher::LatestDownloadSource;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// binfetch - fetch prebuilt layout test binaries
///
/// Downloads LayoutTestHelper and WebKitTestRunner builds from the revision
/// index and caches them under WebKitBuild/downloaded_binaries.
#[derive(Parser, Debug)]
#[command(name = "binfetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BINFETCH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download (or reuse) build binaries and print their directory
    Fetch(FetchArgs),

    /// Print the cache key for a build target
    Key(TargetArgs),

    /// Inspect downloaded binaries
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Build target selection shared by several commands
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Port name (mac, ios-simulator)
    pub port: String,

    /// Architecture (e.g. x86_64, arm64)
    pub architecture: String,

    /// Build configuration (release, debug)
    pub configuration: String,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Revision to fetch (defaults to the newest in the index)
    #[arg(short, long)]
    pub revision: Option<String>,

    /// Field of the newest index item to download when no revision is given
    #[arg(long, value_enum)]
    pub latest_source: Option<LatestSourceArg>,

    /// Checkout root (discovered from the current directory by default)
    #[arg(long)]
    pub checkout: Option<PathBuf>,
}

/// CLI spelling of `LatestDownloadSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LatestSourceArg {
    /// Download the revision identifier itself (legacy behavior)
    Revision,
    /// Download the item's s3_url
    S3Url,
}

impl From<LatestSourceArg> for LatestDownloadSource {
    fn from(arg: LatestSourceArg) -> Self {
        match arg {
            LatestSourceArg::Revision => Self::Revision,
            LatestSourceArg::S3Url => Self::S3Url,
        }
    }
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one path per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List downloaded builds
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Checkout root (discovered from the current directory by default)
        #[arg(long)]
        checkout: Option<PathBuf>,
    },
    /// Print the downloaded binaries directory
    Dir {
        /// Checkout root (discovered from the current directory by default)
        #[arg(long)]
        checkout: Option<PathBuf>,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., index.latest_download_source)
        key: String,
        /// Value to set
        value: String,
    },
}

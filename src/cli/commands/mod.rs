//! CLI command implementations

pub mod cache;
pub mod config;
pub mod fetch;
pub mod key;

pub use cache::execute as cache;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use key::execute as key;

use crate::error::{FetchError, FetchResult};
use std::path::PathBuf;

fn current_dir() -> FetchResult<PathBuf> {
    std::env::current_dir().map_err(|e| FetchError::io("getting current directory", e))
}

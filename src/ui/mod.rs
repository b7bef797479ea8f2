//! UI module for CLI progress and status output
//!
//! Uses `cliclack` for status lines and spinners and `indicatif` for the
//! download bar, with plain stderr output in CI/non-interactive
//! environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use binfetch::ui::{FetchProgress, UiContext};
//! use std::rc::Rc;
//!
//! let progress = Rc::new(FetchProgress::new(&UiContext::detect()));
//! let observer = Rc::clone(&progress);
//! let fetcher = fetcher.with_observer(move |event| observer.on_event(event));
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{step_info, step_ok_detail, step_warn_hint};
pub use progress::{FetchProgress, TaskSpinner};

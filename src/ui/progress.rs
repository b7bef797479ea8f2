//! Progress indicators with CI fallback

use super::context::UiContext;
use super::output;
use crate::fetcher::FetchEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    ctx: UiContext,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            ctx: ctx.clone(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.ctx.is_quiet() {
            return;
        }
        if self.ctx.use_fancy_output() {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            eprintln!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if !self.ctx.is_quiet() {
            eprintln!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if !self.ctx.is_quiet() {
            eprintln!("{} {}", style("[FAIL]").red(), message);
        }
    }

    pub fn is_running(&self) -> bool {
        self.spinner.is_some()
    }
}

/// Renders `FetchEvent`s: a spinner while the index is queried and a byte
/// progress bar while the archive downloads.
pub struct FetchProgress {
    ctx: UiContext,
    spinner: RefCell<TaskSpinner>,
    bar: RefCell<Option<ProgressBar>>,
}

impl FetchProgress {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            ctx: ctx.clone(),
            spinner: RefCell::new(TaskSpinner::new(ctx)),
            bar: RefCell::new(None),
        }
    }

    /// Update the display for one event
    pub fn on_event(&self, event: &FetchEvent) {
        match event {
            FetchEvent::QueryingIndex { url } => {
                self.spinner
                    .borrow_mut()
                    .start(&format!("Querying revision index {}", url));
            }
            FetchEvent::RevisionSelected { revision, .. } => {
                self.spinner
                    .borrow_mut()
                    .stop(&format!("Selected revision {}", revision));
            }
            FetchEvent::CacheHit { path } => {
                output::step_ok_detail(&self.ctx, "Already downloaded", &path.display().to_string());
            }
            FetchEvent::DownloadStarted { url, total_bytes } => {
                self.start_download(url, *total_bytes);
            }
            FetchEvent::DownloadProgress { bytes } => {
                if let Some(bar) = self.bar.borrow().as_ref() {
                    bar.set_position(*bytes);
                }
            }
            FetchEvent::Extracting { .. } => {
                self.finish();
                output::step_info(&self.ctx, "Extracting archive");
            }
            FetchEvent::Ready { path } => {
                output::step_ok_detail(&self.ctx, "Binaries ready", &path.display().to_string());
            }
        }
    }

    /// Clear any active indicator, marking an interrupted index query as failed
    pub fn abandon(&self) {
        let mut spinner = self.spinner.borrow_mut();
        if spinner.is_running() {
            spinner.stop_error("Fetch failed");
        }
        drop(spinner);
        self.finish();
    }

    fn start_download(&self, url: &str, total_bytes: Option<u64>) {
        if !self.ctx.use_fancy_output() {
            if !self.ctx.is_quiet() {
                eprintln!("Downloading {}...", url);
            }
            return;
        }

        let bar = match total_bytes {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("  {spinner:.blue} Downloading  {bar:30.blue/dim} {bytes}/{total_bytes} {bytes_per_sec:.dim}  {eta:.dim}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("━╸─"),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("  {spinner:.blue} Downloading  {bytes} {bytes_per_sec:.dim}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        *self.bar.borrow_mut() = Some(bar);
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

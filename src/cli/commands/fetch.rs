//! Fetch command - download or reuse build binaries

use crate::cache;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::FetchResult;
use crate::fetcher::{
    BinaryFetcher, FetchSettings, Host, LatestDownloadSource, Port, RevisionSelector,
};
use crate::ui::{self, FetchProgress, UiContext};
use std::rc::Rc;
use tracing::debug;

/// Execute the fetch command, printing the binaries directory on success
pub fn execute(args: FetchArgs, config: &Config, ctx: &UiContext) -> FetchResult<()> {
    // Report an unsupported port before looking for a checkout
    let port: Port = args.target.port.parse()?;

    let cwd = super::current_dir()?;
    let root = cache::resolve_root(config, args.checkout.as_deref(), &cwd)?;
    debug!("Downloaded binaries root: {}", root.display());

    let mut settings = FetchSettings::from(&config.index);
    if let Some(source) = args.latest_source {
        settings.latest_download_source = source.into();
    }
    let latest_source = settings.latest_download_source;

    let fetcher = BinaryFetcher::new(
        Host::from_config(config, root),
        port.name(),
        &args.target.architecture,
        &args.target.configuration,
        args.revision,
    )?
    .with_settings(settings);

    if fetcher.selector() == &RevisionSelector::Latest
        && latest_source == LatestDownloadSource::Revision
    {
        ui::step_warn_hint(
            ctx,
            "Latest revision is downloaded from its revision identifier",
            "Pass --latest-source s3-url to download the published archive URL",
        );
    }

    let progress = Rc::new(FetchProgress::new(ctx));
    let observer = Rc::clone(&progress);
    let fetcher = fetcher.with_observer(move |event| observer.on_event(event));

    match fetcher.get_path() {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Err(e)
        }
    }
}

//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{FetchError, FetchResult};
use crate::fetcher::platform::parse_ios_version;
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: [&str; 8] = [
    "general.log_format",
    "index.api_base",
    "index.latest_download_source",
    "http.timeout_secs",
    "http.user_agent",
    "platform.os_version_name",
    "platform.ios_version",
    "cache.root",
];

/// Execute the config command
pub fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    ctx: &UiContext,
) -> FetchResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force, ctx)?,
        Some(ConfigAction::Set { key, value }) => {
            let mut updated = config.clone();
            set_value(&mut updated, &key, &value)?;
            manager.save(&updated)?;
            ui::step_ok_detail(
                ctx,
                &format!("Set {} = {}", key, value),
                &manager.path().display().to_string(),
            );
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> FetchResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_config(manager: &ConfigManager, force: bool, ctx: &UiContext) -> FetchResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default())?;
    ui::step_ok_detail(ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Apply a dot-separated key to `config`, validating the value
fn set_value(config: &mut Config, key: &str, value: &str) -> FetchResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => {
            config.general.log_format = match value {
                "text" | "json" => value.to_string(),
                other => {
                    return Err(FetchError::User(format!(
                        "Invalid log format: {}. Use text or json",
                        other
                    )))
                }
            }
        }
        ["index", "api_base"] => config.index.api_base = value.to_string(),
        ["index", "latest_download_source"] => {
            config.index.latest_download_source = value.parse()?
        }
        ["http", "timeout_secs"] => {
            config.http.timeout_secs = value
                .parse()
                .map_err(|_| FetchError::User(format!("Invalid number: {}", value)))?
        }
        ["http", "user_agent"] => config.http.user_agent = value.to_string(),
        ["platform", "os_version_name"] => {
            config.platform.os_version_name = optional(value).map(str::to_string)
        }
        ["platform", "ios_version"] => {
            parse_ios_version(value)?;
            config.platform.ios_version = value.to_string();
        }
        ["cache", "root"] => config.cache.root = optional(value).map(PathBuf::from),
        _ => {
            return Err(FetchError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

// An empty value clears an optional setting
fn optional(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

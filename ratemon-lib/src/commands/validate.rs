use super::Host;
use super::common::{LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use humantime_serde::re::humantime::format_duration;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `ratemon.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Loads the configuration and checks that a monitor can be seeded from it
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, parsed, or fails validation
fn validate_config_inner(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Config> {
    let config = Config::load(base_dir, config_path)?;

    // Seeding catches boundaries that overflow the representable time range
    let _ = config.seed_buckets(config.start_or(chrono::Utc::now()))?;

    Ok(config)
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    init_logging(args.log_level);

    let base_dir = Utf8PathBuf::from(".");
    let config_path = args.config.as_ref();

    match validate_config_inner(&base_dir, config_path) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using {DEFAULT_SOURCE}");
            }

            let span = config.span()?;
            let _ = writeln!(
                host.output(),
                "{} bucket(s) of {} covering {}, rotated every {} by {}",
                config.buckets.len(),
                format_duration(config.bucket_width),
                format_duration(span.to_std()?),
                format_duration(config.rotation_interval),
                format_duration(config.rotation_period),
            );
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

const DEFAULT_SOURCE: &str = "ratemon.toml from the working directory, or the default configuration if absent";

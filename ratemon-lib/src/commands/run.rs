//! Command dispatch logic for ratemon

use super::{InitArgs, ReplayArgs, ValidateArgs, WatchArgs, init_config, replay_samples, validate_config, watch_input};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "ratemon", author, version, long_about = None, display_name = "ratemon")]
#[command(about = "Watch event throughput against time-of-day thresholds")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: RatemonSubcommand,
}

#[derive(Subcommand, Debug)]
enum RatemonSubcommand {
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Replay recorded samples from a CSV file and report notifications
    Replay(Box<ReplayArgs>),
    /// Record samples read from standard input while rotating the window on a timer
    Watch(WatchArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    match &cli.command {
        RatemonSubcommand::Init(init_args) => init_config(host, init_args),
        RatemonSubcommand::Validate(validate_args) => validate_config(host, validate_args),
        RatemonSubcommand::Replay(replay_args) => replay_samples(host, replay_args),
        RatemonSubcommand::Watch(watch_args) => watch_input(host, watch_args).await,
    }
}

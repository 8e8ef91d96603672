//! Argument types, logging setup and output formatting shared between commands.

use super::config::Config;
use crate::Result;
use crate::monitor::{Channel, Notification, ThroughputMonitor};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use owo_colors::OwoColorize;
use std::sync::{Arc, Mutex};

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    #[must_use]
    pub fn use_colors(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                use std::io::{IsTerminal, stdout};
                stdout().is_terminal()
            }
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// How notifications are written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per notification
    Text,

    /// One JSON object per line
    Json,
}

/// Common arguments shared between the monitoring commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file (default is `ratemon.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

impl CommonArgs {
    /// Initialize logging and load the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded
    pub fn prepare(&self) -> Result<Config> {
        init_logging(self.log_level);
        Config::load(Utf8Path::new("."), self.config.as_ref())
    }
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when commands run more than once in a process.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Subscribe to both channels, collecting notifications for the caller to drain.
pub fn collect_notifications(monitor: &ThroughputMonitor) -> Arc<Mutex<Vec<Notification>>> {
    let collected = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&collected);
    monitor.on_upper_exceeded(move |n: &Notification| sink.lock().expect("lock poisoned").push(*n));

    let sink = Arc::clone(&collected);
    monitor.on_lower_not_met(move |n: &Notification| sink.lock().expect("lock poisoned").push(*n));

    collected
}

/// Running counts of what a command has seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Tally {
    pub recorded: u64,
    pub rejected: u64,
    pub upper_exceeded: u64,
    pub lower_not_met: u64,
}

impl Tally {
    pub fn count(&mut self, notification: &Notification) {
        match notification.channel {
            Channel::UpperExceeded => self.upper_exceeded += 1,
            Channel::LowerNotMet => self.lower_not_met += 1,
        }
    }

    #[must_use]
    pub const fn notifications(&self) -> u64 {
        self.upper_exceeded + self.lower_not_met
    }
}

/// Render a notification as a single output line.
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_notification(notification: &Notification, format: OutputFormat, use_colors: bool) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string(notification)?);
    }

    let channel = match (notification.channel, use_colors) {
        (Channel::UpperExceeded, true) => notification.channel.name().red().bold().to_string(),
        (Channel::LowerNotMet, true) => notification.channel.name().yellow().bold().to_string(),
        (_, false) => notification.channel.name().to_string(),
    };

    let detail = notification.bucket.map_or_else(
        || "no bucket covers the current time".to_string(),
        |bucket| {
            format!(
                "total {} in ({}, {}], expected {}..={}",
                bucket.total, bucket.from, bucket.to, bucket.lower_boundary, bucket.upper_boundary
            )
        },
    );

    Ok(format!("{}  {channel}: {detail}", notification.now))
}

/// Render the end-of-run summary.
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_summary(tally: &Tally, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string(tally)?);
    }

    Ok(format!(
        "{} sample(s) recorded, {} outside the window; {} upper boundary and {} lower boundary notification(s)",
        tally.recorded, tally.rejected, tally.upper_exceeded, tally.lower_not_met
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::BucketStatus;
    use chrono::{TimeZone, Utc};

    fn notification(channel: Channel, with_bucket: bool) -> Notification {
        Notification {
            channel,
            now: Utc.with_ymd_and_hms(2018, 1, 18, 12, 10, 0).unwrap(),
            bucket: with_bucket.then(|| BucketStatus {
                from: Utc.with_ymd_and_hms(2018, 1, 18, 12, 0, 0).unwrap(),
                to: Utc.with_ymd_and_hms(2018, 1, 18, 12, 30, 0).unwrap(),
                total: 1,
                lower_boundary: 260,
                upper_boundary: 1082,
            }),
        }
    }

    #[test]
    fn test_format_text_with_bucket() {
        let line = format_notification(&notification(Channel::LowerNotMet, true), OutputFormat::Text, false).unwrap();
        assert_eq!(
            line,
            "2018-01-18 12:10:00 UTC  lower boundary not met: total 1 in (2018-01-18 12:00:00 UTC, 2018-01-18 12:30:00 UTC], expected 260..=1082"
        );
    }

    #[test]
    fn test_format_text_without_bucket() {
        let line = format_notification(&notification(Channel::LowerNotMet, false), OutputFormat::Text, false).unwrap();
        assert!(line.ends_with("lower boundary not met: no bucket covers the current time"), "{line}");
    }

    #[test]
    fn test_format_text_with_colors_keeps_channel_name() {
        let line = format_notification(&notification(Channel::UpperExceeded, true), OutputFormat::Text, true).unwrap();
        assert!(line.contains("upper boundary exceeded"), "{line}");
        assert!(line.contains('\u{1b}'), "{line}");
    }

    #[test]
    fn test_format_json() {
        let line = format_notification(&notification(Channel::UpperExceeded, true), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["channel"], "upper_exceeded");
        assert_eq!(value["bucket"]["total"], 1);
        assert_eq!(value["bucket"]["upper_boundary"], 1082);
    }

    #[test]
    fn test_tally_counts_channels() {
        let mut tally = Tally::default();
        tally.count(&notification(Channel::UpperExceeded, true));
        tally.count(&notification(Channel::LowerNotMet, true));
        tally.count(&notification(Channel::LowerNotMet, false));
        assert_eq!(tally.upper_exceeded, 1);
        assert_eq!(tally.lower_not_met, 2);
        assert_eq!(tally.notifications(), 3);
    }

    #[test]
    fn test_format_summary_text() {
        let tally = Tally {
            recorded: 3,
            rejected: 1,
            upper_exceeded: 1,
            lower_not_met: 2,
        };
        assert_eq!(
            format_summary(&tally, OutputFormat::Text).unwrap(),
            "3 sample(s) recorded, 1 outside the window; 1 upper boundary and 2 lower boundary notification(s)"
        );
    }

    #[test]
    fn test_format_summary_json() {
        let tally = Tally {
            recorded: 3,
            ..Tally::default()
        };
        let value: serde_json::Value = serde_json::from_str(&format_summary(&tally, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(value["recorded"], 3);
        assert_eq!(value["rejected"], 0);
    }
}

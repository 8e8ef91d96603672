//! Command-line interface and orchestration for ratemon
//!
//! This module wires the [`monitor`](crate::monitor) core to configuration files,
//! sample sources and terminal output.
//!
//! # Commands
//!
//! - **init**: Generate a default configuration file with the standard
//!   half-hourly schedule
//! - **validate**: Check that a configuration file parses and can seed a monitor
//! - **replay**: Record samples from a CSV file with "now" following the sample
//!   timestamps (or pinned with `--now`), printing notifications as they fire
//! - **watch**: Record amounts read from standard input against the system clock
//!   while a [`Rotator`](crate::monitor::Rotator) slides the window forward
//!
//! Configuration is a TOML file listing per-bucket thresholds along with the
//! bucket width and rotation settings.

mod common;
mod config;
mod host;
mod init;
mod replay;
mod run;
mod validate;
mod watch;

pub use common::{ColorMode, LogLevel, OutputFormat};
pub use config::{Config, Thresholds};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use replay::{ReplayArgs, replay_samples};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
pub use watch::{WatchArgs, watch_input};

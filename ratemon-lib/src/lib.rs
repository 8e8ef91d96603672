#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for ratemon
//!
//! Watches the rate of events or requests against per-time-of-day thresholds.
//!
//! # Module Organization
//!
//! - [`monitor`]: The embeddable monitor, its buckets, clocks and notifications
//! - `commands`: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod monitor;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};

use crate::Result;
use crate::monitor::{Bucket, Clock, DEFAULT_ROTATION_INTERVAL, DEFAULT_ROTATION_PERIOD, ThroughputMonitor};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::sync::Arc;

const LOG_TARGET: &str = "    config";

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ratemon.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Distance a bucket is moved forward when rotated out of the window
    #[serde(default = "default_rotation_period", with = "humantime_serde")]
    pub rotation_period: Duration,

    /// How often the oldest bucket is rotated out
    #[serde(default = "default_rotation_interval", with = "humantime_serde")]
    pub rotation_interval: Duration,

    /// Width of every bucket
    #[serde(default = "default_bucket_width", with = "humantime_serde")]
    pub bucket_width: Duration,

    /// Start of the first bucket; midnight UTC of the relevant day when absent
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// Thresholds per bucket, in window order
    pub buckets: Vec<Thresholds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub lower: u32,
    pub upper: u32,
}

const fn default_rotation_period() -> Duration {
    Duration::from_secs(DEFAULT_ROTATION_PERIOD.num_seconds().unsigned_abs())
}

const fn default_rotation_interval() -> Duration {
    DEFAULT_ROTATION_INTERVAL
}

const fn default_bucket_width() -> Duration {
    Duration::from_mins(30)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `ratemon.toml` in `base_dir` is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading ratemon configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "No '{path}' found, using the default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading ratemon configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!(target: LOG_TARGET, "Loaded {} bucket(s) from '{final_path}'", config.buckets.len());
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// Inverted thresholds are accepted with a warning; the monitor tolerates them.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no buckets or a duration is zero or too large
    pub fn validate(&self) -> Result<()> {
        if self.buckets.is_empty() {
            return Err(app_err!("at least one bucket must be configured"));
        }

        for (name, value) in [
            ("rotation_period", self.rotation_period),
            ("rotation_interval", self.rotation_interval),
            ("bucket_width", self.bucket_width),
        ] {
            if value.is_zero() {
                return Err(app_err!("{name} must be greater than zero"));
            }
        }

        let _ = self.rotation_period_delta()?;
        let _ = self.span()?;
        let _ = self.seed_buckets(self.start_or(Utc::now()))?;

        for (index, thresholds) in self.buckets.iter().enumerate() {
            if thresholds.lower > thresholds.upper {
                log::warn!(
                    target: LOG_TARGET,
                    "Bucket {index} has lower boundary {} above upper boundary {}",
                    thresholds.lower,
                    thresholds.upper
                );
            }
        }

        Ok(())
    }

    /// The rotation period as a `TimeDelta`.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not fit a `TimeDelta`
    pub fn rotation_period_delta(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.rotation_period).into_app_err("rotation_period is too large")
    }

    /// Total time covered by all buckets.
    ///
    /// # Errors
    ///
    /// Returns an error if the span does not fit a `TimeDelta`
    pub fn span(&self) -> Result<TimeDelta> {
        let width = TimeDelta::from_std(self.bucket_width).into_app_err("bucket_width is too large")?;
        let count = i32::try_from(self.buckets.len()).into_app_err("too many buckets")?;
        width.checked_mul(count).ok_or_else(|| app_err!("bucket span is too large"))
    }

    /// The configured start, or the midnight UTC that opens the day owning `fallback`.
    ///
    /// Buckets exclude their `from`, so an instant exactly at midnight belongs to
    /// the day before it and the window starts at the previous midnight.
    #[must_use]
    pub fn start_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.start.unwrap_or_else(|| {
            let midnight = fallback.date_naive().and_time(NaiveTime::MIN).and_utc();
            if midnight == fallback {
                midnight.checked_sub_signed(TimeDelta::days(1)).unwrap_or(midnight)
            } else {
                midnight
            }
        })
    }

    /// Build the contiguous bucket list, the first bucket starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket boundary is out of range, either as seeded
    /// or once the last bucket's successor is moved forward by the rotation period
    pub fn seed_buckets(&self, start: DateTime<Utc>) -> Result<Vec<Bucket>> {
        let width = TimeDelta::from_std(self.bucket_width).into_app_err("bucket_width is too large")?;
        let period = self.rotation_period_delta()?;

        let mut from = start;
        let buckets = self
            .buckets
            .iter()
            .map(|thresholds| -> Result<Bucket> {
                let to = from
                    .checked_add_signed(width)
                    .ok_or_else(|| app_err!("bucket boundary after {from} is out of range"))?;
                let bucket = Bucket::new(from, to, thresholds.lower, thresholds.upper);
                from = to;
                Ok(bucket)
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(last) = buckets.last()
            && last.shifted(period).is_none()
        {
            return Err(app_err!("rotation_period moves the bucket ending at {} out of range", last.to()));
        }

        Ok(buckets)
    }

    /// Build a monitor seeded from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the buckets or rotation period cannot be represented
    pub fn build_monitor(&self, start: DateTime<Utc>, clock: Arc<dyn Clock>) -> Result<ThroughputMonitor> {
        let buckets = self.seed_buckets(start)?;
        Ok(ThroughputMonitor::new(buckets, clock).with_rotation_period(self.rotation_period_delta()?))
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

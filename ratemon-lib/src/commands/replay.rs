//! Feed recorded samples through a monitor and report the notifications they raise.

use super::Host;
use super::common::{CommonArgs, OutputFormat, Tally, collect_notifications, format_notification, format_summary};
use crate::Result;
use crate::monitor::{Clock, ManualClock};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use ohno::{IntoAppError, bail};
use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "    replay";

#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// CSV file with `timestamp,amount` rows (RFC 3339 timestamps)
    #[arg(value_name = "SAMPLES")]
    pub samples: Utf8PathBuf,

    /// Pin the current time instead of following each sample's timestamp
    #[arg(long, value_name = "RFC3339")]
    pub now: Option<DateTime<Utc>>,

    /// Output format for notifications and the summary
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status code 1 if any notification fired
    #[arg(long)]
    pub error_if_alert: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    timestamp: DateTime<Utc>,
    amount: u32,
}

fn read_samples(path: &Utf8PathBuf) -> Result<Vec<SampleRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .into_app_err_with(|| format!("opening samples file '{path}'"))?;

    reader
        .deserialize()
        .collect::<core::result::Result<Vec<SampleRow>, _>>()
        .into_app_err_with(|| format!("reading samples from '{path}'"))
}

pub fn replay_samples<H: Host>(host: &mut H, args: &ReplayArgs) -> Result<()> {
    let config = args.common.prepare()?;
    let rows = read_samples(&args.samples)?;

    let Some(first) = rows.first() else {
        let _ = writeln!(host.error(), "No samples found in '{}'", args.samples);
        return Ok(());
    };

    let clock = Arc::new(ManualClock::new(args.now.unwrap_or(first.timestamp)));
    let start = config.start_or(first.timestamp);
    let monitor = config.build_monitor(start, Arc::clone(&clock) as Arc<dyn Clock>)?;
    let notifications = collect_notifications(&monitor);

    log::info!(target: LOG_TARGET, "Replaying {} sample(s) from '{}' against a window starting {start}", rows.len(), args.samples);

    let use_colors = args.common.color.use_colors();
    let mut tally = Tally::default();

    for row in &rows {
        if args.now.is_none() {
            clock.set(row.timestamp);
        }

        match monitor.record(row.amount, row.timestamp) {
            Ok(_) => tally.recorded += 1,
            Err(e) => {
                tally.rejected += 1;
                log::debug!(target: LOG_TARGET, "Dropping sample of {}: {e}", row.amount);
                let _ = writeln!(host.error(), "Skipping sample of {}: {e}", row.amount);
            }
        }

        let fired: Vec<_> = notifications.lock().expect("lock poisoned").drain(..).collect();
        for notification in &fired {
            tally.count(notification);
            let _ = writeln!(host.output(), "{}", format_notification(notification, args.format, use_colors)?);
        }
    }

    let _ = writeln!(host.output(), "{}", format_summary(&tally, args.format)?);

    if args.error_if_alert && tally.notifications() > 0 {
        bail!("{} notification(s) fired during replay", tally.notifications());
    }

    Ok(())
}

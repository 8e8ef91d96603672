//! Live monitoring: record amounts read line by line while the window rotates on a timer.

use super::Host;
use super::common::{CommonArgs, OutputFormat, Tally, collect_notifications, format_notification, format_summary};
use crate::Result;
use crate::monitor::{Clock, Rotator, SystemClock};
use chrono::{DateTime, Utc};
use clap::Parser;
use ohno::{IntoAppError, app_err};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

const LOG_TARGET: &str = "     watch";

const NUM_LINE_BUFFERS: usize = 64;

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Output format for notifications and the summary
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Parse one input line: either `AMOUNT` (observed now) or `RFC3339 AMOUNT`.
///
/// Returns `None` for blank lines and `#` comments.
fn parse_line(line: &str, now: DateTime<Utc>) -> Option<Result<(u32, DateTime<Utc>)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut parts = line.split_whitespace();
    let parsed = match (parts.next(), parts.next(), parts.next()) {
        (Some(amount), None, None) => parse_amount(amount).map(|amount| (amount, now)),
        (Some(timestamp), Some(amount), None) => timestamp
            .parse::<DateTime<Utc>>()
            .into_app_err_with(|| format!("invalid timestamp '{timestamp}'"))
            .and_then(|timestamp| Ok((parse_amount(amount)?, timestamp))),
        _ => Err(app_err!("expected 'AMOUNT' or 'TIMESTAMP AMOUNT', got '{line}'")),
    };

    Some(parsed)
}

fn parse_amount(text: &str) -> Result<u32> {
    text.parse::<u32>().into_app_err_with(|| format!("invalid amount '{text}'"))
}

/// Reads samples from the host's input until it ends.
///
/// Input is read on a blocking thread and handed over line by line, so the
/// rotation task keeps running while the input is idle.
pub async fn watch_input<H: Host>(host: &mut H, args: &WatchArgs) -> Result<()> {
    let config = args.common.prepare()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let start = config.start_or(clock.now());
    let monitor = Arc::new(config.build_monitor(start, Arc::clone(&clock))?);
    let notifications = collect_notifications(&monitor);
    let rotator = Rotator::spawn(Arc::clone(&monitor), config.rotation_interval);

    log::info!(target: LOG_TARGET, "Watching {} bucket(s) starting {start}", monitor.len());

    let (tx, mut rx) = mpsc::channel::<std::io::Result<String>>(NUM_LINE_BUFFERS);
    let input = host.input();
    let reader = tokio::task::spawn_blocking(move || {
        for line in input.lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    let use_colors = args.common.color.use_colors();
    let mut tally = Tally::default();

    while let Some(line) = rx.recv().await {
        let line = line.into_app_err("reading input")?;

        let (amount, timestamp) = match parse_line(&line, clock.now()) {
            None => continue,
            Some(Ok(sample)) => sample,
            Some(Err(e)) => {
                let _ = writeln!(host.error(), "Ignoring input: {e}");
                continue;
            }
        };

        match monitor.record(amount, timestamp) {
            Ok(_) => tally.recorded += 1,
            Err(e) => {
                tally.rejected += 1;
                let _ = writeln!(host.error(), "Skipping sample of {amount}: {e}");
            }
        }

        let fired: Vec<_> = notifications.lock().expect("lock poisoned").drain(..).collect();
        for notification in &fired {
            tally.count(notification);
            let _ = writeln!(host.output(), "{}", format_notification(notification, args.format, use_colors)?);
        }
    }

    reader.await.into_app_err("input reader task failed")?;

    log::info!(target: LOG_TARGET, "Input ended after {} rotation(s)", rotator.rotations());
    rotator.stop();

    let _ = writeln!(host.output(), "{}", format_summary(&tally, args.format)?);
    Ok(())
}

//! Watch event throughput against time-of-day thresholds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use ratemon_lib::{Host, run};
use std::io::{BufRead, BufReader, Write};
use std::io::{stderr, stdin, stdout};

/// Default host wired to the process's standard streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn input(&mut self) -> Box<dyn BufRead + Send> {
        Box::new(BufReader::new(stdin()))
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}

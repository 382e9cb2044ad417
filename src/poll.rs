/// Fetch, parse, diff and emit on a fixed interval
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, warn};

use crate::alias::AliasTable;
use crate::constants::OUTPUT_CAPACITY;
use crate::delta::compute_metrics;
use crate::output::{build_lines, write_lines};
use crate::report::{EntitySnapshot, ReportParser};
use crate::transport::{FetchError, StatsSource};
use crate::Metric;

/// Why a cycle produced no output
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write metrics: {0}")]
    Write(#[from] io::Error),
}

/// Owns all state carried between cycles: cached header keys, the previous
/// snapshot and the output buffers. Cycles never overlap.
pub struct Poller<S, W> {
    source: S,
    writer: W,
    aliases: AliasTable,
    parser: ReportParser,
    previous: Option<EntitySnapshot>,
    metrics: Vec<Metric>,
    lines: String,
}

impl<S: StatsSource, W: Write> Poller<S, W> {
    pub fn new(source: S, writer: W, aliases: AliasTable) -> Self {
        Poller {
            source,
            writer,
            aliases,
            parser: ReportParser::new(),
            previous: None,
            metrics: Vec::with_capacity(64),
            lines: String::with_capacity(OUTPUT_CAPACITY),
        }
    }

    /// Run one cycle. Returns the number of metric lines written.
    ///
    /// A failed fetch writes nothing and keeps the previous snapshot, so the
    /// next successful cycle diffs against the last good report.
    pub fn poll_once(&mut self) -> Result<usize, CycleError> {
        let body = self.source.fetch()?;
        let current = self.parser.parse(&body, &self.aliases);

        self.metrics.clear();
        if self.aliases.is_active() {
            for entry in self.aliases.entries() {
                let Some(record) = current.get(&entry.raw) else {
                    warn!("proxy {} not found in HAProxy statistics", entry.raw);
                    continue;
                };
                let prev = self.previous.as_ref().and_then(|p| p.get(&entry.raw));
                compute_metrics(&entry.display, record, prev, &mut self.metrics);
            }
        } else {
            for name in current.names() {
                if let Some(record) = current.get(name) {
                    let prev = self.previous.as_ref().and_then(|p| p.get(name));
                    let entity = self.aliases.display_name(name);
                    compute_metrics(entity, record, prev, &mut self.metrics);
                }
            }
        }

        build_lines(&mut self.lines, &self.metrics);
        write_lines(&mut self.writer, &self.lines)?;
        debug!(
            "emitted {} metrics for {} proxies",
            self.metrics.len(),
            current.len()
        );

        self.previous = Some(current);
        Ok(self.metrics.len())
    }

    /// Poll forever. Fetch and write failures are logged and the next cycle
    /// runs as usual; only a closed pipe on the writer ends the loop.
    pub fn run(&mut self, interval: Duration) {
        loop {
            let cycle_start = Instant::now();

            match self.poll_once() {
                Ok(_) => {}
                Err(CycleError::Write(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                    return;
                }
                Err(err) => error!("{}", err),
            }

            let cycle_duration = cycle_start.elapsed();
            if cycle_duration < interval {
                thread::sleep(interval - cycle_duration);
            }
        }
    }

    #[cfg(test)]
    pub fn previous(&self) -> Option<&EntitySnapshot> {
        self.previous.as_ref()
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

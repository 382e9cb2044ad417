use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

mod alias;
mod config;
mod constants;
mod delta;
mod output;
mod poll;
mod report;
mod transport;

use alias::AliasTable;
use config::Config;
use constants::DEFAULT_CONFIG_PATH;
use delta::MetricName;
use poll::Poller;
use transport::HttpStatsSource;

/// Poll the HAProxy statistics page and print per-interval metrics for a collector agent
#[derive(Parser)]
#[command(name = "haproxy-poller", version)]
struct Cli {
    /// JSON configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured poll interval (milliseconds)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Metric value as printed: counters and gauges as integers, occupancy as a ratio
enum MetricValue {
    Count(i64),
    Ratio(f64),
}

/// One output line
struct Metric {
    /// Which metric
    name: MetricName,
    value: MetricValue,
    /// Display name of the proxy
    entity: String,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
    let aliases = AliasTable::from_entries(&config.source, &config.proxies)
        .context("invalid proxy list")?;
    let source = HttpStatsSource::from_config(&config).context("failed to build HTTP client")?;

    let interval = cli
        .interval
        .map(Duration::from_millis)
        .unwrap_or(config.poll_interval);
    info!(
        "polling {} every {:?} for {} ({} proxies configured)",
        config.url,
        interval,
        config.source,
        aliases.entries().len()
    );

    let mut poller = Poller::new(source, io::stdout(), aliases);
    if cli.once {
        return match poller.poll_once() {
            Ok(_) => Ok(ExitCode::SUCCESS),
            Err(err) => {
                error!("{}", err);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    poller.run(interval);
    Ok(ExitCode::SUCCESS)
}

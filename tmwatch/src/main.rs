// tmwatch - live terminal monitor for Time Machine backups
// Polls tmutil and renders progress until the backup finishes or is interrupted

mod display;
mod monitor;
mod terminal;
mod tmutil;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tmwatch_common::WatchConfig;
use tokio_util::sync::CancellationToken;

use crate::display::Display;
use crate::terminal::AlternateScreen;
use crate::tmutil::TmUtil;

#[derive(Parser, Debug)]
#[command(name = "tmwatch", version, about = "Monitor Time Machine backup progress")]
struct Cli {
    /// Update interval in seconds
    #[arg(short = 'n', long, value_name = "SECONDS", value_parser = parse_interval)]
    interval: Option<f64>,

    /// Don't exit when backup completes
    #[arg(short = 'i', long)]
    run_indefinitely: bool,

    /// Show tmutil status output
    #[arg(short = 's', long)]
    show_status: bool,

    /// Disable progress bar
    #[arg(short = 'P', long)]
    hide_progress: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file and environment
    fn apply_to(&self, config: &mut WatchConfig) {
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if self.run_indefinitely {
            config.run_indefinitely = true;
        }
        if self.show_status {
            config.show_status = true;
        }
        if self.hide_progress {
            config.show_progress = false;
        }
    }
}

fn parse_interval(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("interval must be positive, got {}", value));
    }

    Ok(secs)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = WatchConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.ensure_visible_output();
    config.validate().map_err(anyhow::Error::msg)?;

    log::debug!("Configuration: {:?}", config);

    let cancel = CancellationToken::new();
    monitor::listen_for_interrupt(cancel.clone())?;

    let tmutil = TmUtil::new(&config.tmutil);
    log::info!(
        "Monitoring {} every {:?}",
        tmutil.program().display(),
        config.interval()
    );

    let outcome = {
        let _screen = if config.show_status {
            Some(AlternateScreen::enter()?)
        } else {
            None
        };
        let display = Display::new(&config);

        monitor::monitor(&tmutil, &display, &config, &cancel).await?
    };

    log::info!("Stopped: {:?}", outcome);

    Ok(ExitCode::from(outcome.exit_code(config.run_indefinitely)))
}

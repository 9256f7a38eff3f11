// Poll loop and interrupt handling

use crate::display::Display;
use crate::tmutil::StatusSource;
use anyhow::{Context, Result};
use std::time::Duration;
use tmwatch_common::{EXIT_INTERRUPTED, TmStatus, WatchConfig};
use tokio_util::sync::CancellationToken;

/// Why the poll loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backup is no longer running
    Completed,
    /// The user interrupted the wait
    Interrupted,
}

impl Outcome {
    /// Process exit status for this outcome
    pub fn exit_code(self, run_indefinitely: bool) -> u8 {
        match self {
            Outcome::Interrupted if !run_indefinitely => EXIT_INTERRUPTED,
            _ => 0,
        }
    }
}

/// Whether the loop should stop after showing `status`
pub fn should_exit(run_indefinitely: bool, status: &TmStatus) -> bool {
    !run_indefinitely && !status.is_running()
}

/// Cancel `cancel` when SIGINT arrives.
///
/// The handler is installed before this returns, so an interrupt during the
/// first poll is not lost.
pub fn listen_for_interrupt(cancel: CancellationToken) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

        tokio::spawn(async move {
            if sigint.recv().await.is_some() {
                log::debug!("Received SIGINT");
                cancel.cancel();
            }
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::debug!("Received Ctrl-C");
                cancel.cancel();
            }
        });
    }

    Ok(())
}

/// Sleep for `interval` unless cancelled first. Returns true if cancelled.
pub async fn wait_or_cancel(interval: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(interval) => false,
    }
}

/// Poll and render until the backup stops or the wait is cancelled.
/// Any tmutil failure ends the loop with an error.
pub async fn monitor<S: StatusSource + ?Sized>(
    source: &S,
    display: &Display,
    config: &WatchConfig,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    let interval = config.interval();

    let mut status = source.fetch_status()?;
    display.show(source, &status)?;

    loop {
        if should_exit(config.run_indefinitely, &status) {
            // Let a pending SIGINT reach the token before deciding
            tokio::task::yield_now().await;
            if cancel.is_cancelled() {
                log::debug!("Interrupted during the final poll, stopping");
                return Ok(Outcome::Interrupted);
            }

            log::debug!("Backup not running, stopping");
            return Ok(Outcome::Completed);
        }

        if wait_or_cancel(interval, cancel).await {
            log::debug!("Interrupted while waiting, stopping");
            return Ok(Outcome::Interrupted);
        }

        status = source.fetch_status()?;
        display.show(source, &status)?;
    }
}

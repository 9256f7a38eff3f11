// Progress bar and status block rendering

use crate::terminal;
use crate::tmutil::StatusSource;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use tmwatch_common::{TmStatus, WatchConfig, fit_label, format_etr, format_percent, truncate_block};

/// Bar positions per full backup
const BAR_SCALE: u64 = 1000;

/// Lines kept free above the status block for the bar
const BAR_LINES: usize = 2;

/// A single persistent bar showing phase, fill, percentage and ETR
pub struct PhaseBar {
    bar: ProgressBar,
    phase_width: usize,
}

impl PhaseBar {
    pub fn new(phase_width: usize, bar_width: usize) -> Self {
        Self::with_draw_target(ProgressDrawTarget::stdout(), phase_width, bar_width)
    }

    pub fn with_draw_target(
        target: ProgressDrawTarget,
        phase_width: usize,
        bar_width: usize,
    ) -> Self {
        let bar = ProgressBar::with_draw_target(Some(BAR_SCALE), target);
        bar.set_style(
            ProgressStyle::with_template(&format!("{{prefix}} |{{bar:{bar_width}}}| {{msg}}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        bar.set_prefix(fit_label("", phase_width));

        Self { bar, phase_width }
    }

    /// Update the bar from a status snapshot.
    ///
    /// Without a percentage the fill is left where it was and the bar is
    /// only redrawn.
    pub fn set(&self, status: &TmStatus) {
        let position = status.percent.map(to_position);

        self.bar.set_prefix(fit_label(&status.phase, self.phase_width));
        self.bar.set_message(suffix(
            position.unwrap_or_else(|| self.bar.position()),
            status.etr,
        ));

        match position {
            Some(position) => self.bar.set_position(position),
            None => self.bar.tick(),
        }
    }

    /// Stored fill, in thousandths
    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    #[cfg(test)]
    pub fn label(&self) -> String {
        self.bar.prefix()
    }

    #[cfg(test)]
    pub fn suffix(&self) -> String {
        self.bar.message()
    }
}

impl Drop for PhaseBar {
    fn drop(&mut self) {
        // Leave the last state on screen
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn to_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_SCALE as f64).round() as u64
}

fn suffix(position: u64, etr: Option<f64>) -> String {
    format!(
        "{} ETR {:>8}",
        format_percent(position as f64 / BAR_SCALE as f64),
        format_etr(etr)
    )
}

/// Text of the status block for a terminal of `columns` x `lines`
pub fn render_block(text: &str, (columns, lines): (usize, usize), with_bar: bool) -> String {
    let reserved = if with_bar { BAR_LINES } else { 0 };
    truncate_block(text, lines.saturating_sub(reserved), columns)
}

/// Everything drawn for one poll
pub struct Display {
    bar: Option<PhaseBar>,
    show_status: bool,
}

impl Display {
    pub fn new(config: &WatchConfig) -> Self {
        let bar = config
            .show_progress
            .then(|| PhaseBar::new(config.phase_width, config.bar_width));

        Self::with_bar(bar, config.show_status)
    }

    pub fn with_bar(bar: Option<PhaseBar>, show_status: bool) -> Self {
        Self { bar, show_status }
    }

    #[cfg(test)]
    pub fn bar(&self) -> Option<&PhaseBar> {
        self.bar.as_ref()
    }

    /// Render a snapshot to stdout. The status block is fetched and fitted
    /// to the terminal size at the time of the call.
    pub fn show<S: StatusSource + ?Sized>(&self, source: &S, status: &TmStatus) -> Result<()> {
        self.show_on(&mut io::stdout(), source, status, terminal::size())
    }

    /// Render a snapshot to `out` for a terminal of `size` (columns, lines).
    /// The bar draws through its own target.
    pub fn show_on<W, S>(
        &self,
        out: &mut W,
        source: &S,
        status: &TmStatus,
        size: (usize, usize),
    ) -> Result<()>
    where
        W: Write,
        S: StatusSource + ?Sized,
    {
        if !self.show_status {
            if let Some(bar) = &self.bar {
                bar.set(status);
            }
            return Ok(());
        }

        let text = source.status_text()?;
        let block = render_block(&text, size, self.bar.is_some());

        terminal::clear(out)?;

        if let Some(bar) = &self.bar {
            bar.set(status);
            out.write_all(b"\n\n")?;
        }
        out.write_all(block.as_bytes())?;
        out.flush()?;

        Ok(())
    }
}

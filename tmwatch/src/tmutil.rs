// Time Machine status queries via tmutil

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tmwatch_common::{RawStatus, TmStatus};

/// Anything that can report Time Machine status
pub trait StatusSource {
    /// Poll the structured status once
    fn fetch_status(&self) -> Result<TmStatus>;

    /// Full human-readable status text
    fn status_text(&self) -> Result<String>;
}

/// Status source backed by the tmutil command
#[derive(Debug, Clone)]
pub struct TmUtil {
    program: PathBuf,
}

impl TmUtil {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run tmutil with the given arguments and return its stdout.
    /// A non-zero exit is an error carrying tmutil's stderr.
    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        log::debug!("Running {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {} {}. Is Time Machine available?",
                    self.program.display(),
                    args.join(" ")
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} {} failed ({}): {}",
                self.program.display(),
                args.join(" "),
                output.status,
                stderr.trim()
            );
        }

        Ok(output.stdout)
    }

    /// Output of `tmutil currentphase`
    pub fn current_phase(&self) -> Result<String> {
        let stdout = self.run(&["currentphase"])?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl StatusSource for TmUtil {
    fn fetch_status(&self) -> Result<TmStatus> {
        let stdout = self.run(&["status", "-X"])?;
        let status = RawStatus::from_plist(&stdout)?.resolve(|| self.current_phase())?;

        log::debug!(
            "Status: phase={} percent={:?} etr={:?}",
            status.phase,
            status.percent,
            status.etr
        );

        Ok(status)
    }

    fn status_text(&self) -> Result<String> {
        let stdout = self.run(&["status"])?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

// Shared types and utilities for tmwatch

pub mod config;
pub mod format;
pub mod status;

pub use config::WatchConfig;
pub use format::{fit_label, format_etr, format_percent, truncate_block};
pub use status::{PHASE_NOT_RUNNING, RawProgress, RawStatus, TmStatus};

/// Exit status used when the user interrupts a monitor that would otherwise stop on its own
pub const EXIT_INTERRUPTED: u8 = 130;

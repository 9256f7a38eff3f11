//! Formatting utilities for the progress line and status block

/// Marker appended to labels cut to fit their column
const ELLIPSIS: char = '…';

/// Placeholder shown while tmutil has no time estimate
pub const ETR_UNKNOWN: &str = "--:--:--";

/// Fit a label into exactly `width` characters.
///
/// Longer labels keep their first `width - 1` characters followed by an
/// ellipsis; shorter ones are left-justified and padded with spaces.
///
/// # Examples
/// ```
/// use tmwatch_common::fit_label;
/// assert_eq!(fit_label("Copying", 10), "Copying   ");
/// assert_eq!(fit_label("ThinningPostBackup", 10), "ThinningP…");
/// ```
pub fn fit_label(label: &str, width: usize) -> String {
    let len = label.chars().count();

    if len > width {
        let mut fitted: String = label.chars().take(width.saturating_sub(1)).collect();
        fitted.push(ELLIPSIS);
        fitted
    } else {
        format!("{label:<width$}")
    }
}

/// Format an estimated time remaining as `H:MM:SS`
///
/// # Examples
/// ```
/// use tmwatch_common::format_etr;
/// assert_eq!(format_etr(Some(120.0)), "0:02:00");
/// assert_eq!(format_etr(Some(93784.0)), "26:03:04");
/// assert_eq!(format_etr(None), "--:--:--");
/// ```
pub fn format_etr(etr: Option<f64>) -> String {
    match etr {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            let secs = secs as u64;
            format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
        _ => ETR_UNKNOWN.to_string(),
    }
}

/// Format a completion fraction as a percentage with one decimal place,
/// right-aligned in five columns
///
/// # Examples
/// ```
/// use tmwatch_common::format_percent;
/// assert_eq!(format_percent(0.4216), " 42.2%");
/// assert_eq!(format_percent(1.0), "100.0%");
/// ```
pub fn format_percent(fraction: f64) -> String {
    format!("{:5.1}%", fraction.clamp(0.0, 1.0) * 100.0)
}

/// Cut multi-line text to fit a `lines` x `columns` area.
///
/// Trailing newlines are dropped, extra lines are discarded, and each kept
/// line is cut at `columns` characters. Nothing wraps.
pub fn truncate_block(text: &str, lines: usize, columns: usize) -> String {
    text.trim_end_matches('\n')
        .lines()
        .take(lines)
        .map(|line| line.chars().take(columns).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

// Time Machine status snapshot decoded from `tmutil status -X`

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

/// Phase reported by tmutil when no backup is in progress
pub const PHASE_NOT_RUNNING: &str = "BackupNotRunning";

/// Label used when neither tmutil source reports a phase
const PHASE_UNKNOWN: &str = "Unknown";

/// One poll of the backup tool
#[derive(Debug, Clone, PartialEq)]
pub struct TmStatus {
    /// Current backup stage (e.g., "Copying", "ThinningPreBackup")
    pub phase: String,

    /// Completion as a fraction of one, never negative
    pub percent: Option<f64>,

    /// Estimated seconds remaining
    pub etr: Option<f64>,
}

impl TmStatus {
    /// Build a snapshot, clamping negative progress to zero and dropping
    /// negative or non-finite time estimates
    pub fn new(phase: impl Into<String>, percent: Option<f64>, etr: Option<f64>) -> Self {
        Self {
            phase: phase.into(),
            percent: percent.map(|p| p.max(0.0)),
            etr: etr.filter(|secs| secs.is_finite() && *secs >= 0.0),
        }
    }

    /// Whether tmutil reports a backup in progress
    pub fn is_running(&self) -> bool {
        self.phase != PHASE_NOT_RUNNING
    }
}

/// The subset of the `tmutil status -X` property list we care about.
/// Every other key in the document is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RawStatus {
    #[serde(rename = "BackupPhase", default)]
    pub backup_phase: Option<String>,

    #[serde(rename = "Percent", default, deserialize_with = "lenient_number")]
    pub percent: Option<f64>,

    #[serde(rename = "Progress", default)]
    pub progress: Option<RawProgress>,
}

/// Nested `Progress` dictionary
#[derive(Debug, Default, Deserialize)]
pub struct RawProgress {
    #[serde(rename = "TimeRemaining", default, deserialize_with = "lenient_number")]
    pub time_remaining: Option<f64>,
}

impl RawStatus {
    /// Decode the raw output of `tmutil status -X`
    pub fn from_plist(bytes: &[u8]) -> Result<Self> {
        plist::from_bytes(bytes).context("Failed to decode tmutil status property list")
    }

    /// Turn the decoded document into a snapshot.
    ///
    /// `fallback_phase` is only called when `BackupPhase` is missing or empty;
    /// its output is trimmed before use.
    pub fn resolve<F>(self, fallback_phase: F) -> Result<TmStatus>
    where
        F: FnOnce() -> Result<String>,
    {
        let phase = match self.backup_phase.filter(|phase| !phase.is_empty()) {
            Some(phase) => phase,
            None => {
                let output = fallback_phase()?;
                let trimmed = output.trim();
                if trimmed.is_empty() {
                    log::warn!("tmutil reported no backup phase");
                    PHASE_UNKNOWN.to_string()
                } else {
                    trimmed.to_string()
                }
            }
        };

        let etr = self.progress.and_then(|progress| progress.time_remaining);

        Ok(TmStatus::new(phase, self.percent, etr))
    }
}

/// Accept plist reals, integers, and numeric strings.
/// Some tmutil releases emit `Percent` as a string.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<plist::Value>::deserialize(deserializer)?;

    Ok(value.and_then(|value| match value {
        plist::Value::Real(n) => Some(n),
        plist::Value::Integer(n) => n
            .as_signed()
            .map(|n| n as f64)
            .or_else(|| n.as_unsigned().map(|n| n as f64)),
        plist::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plist_doc(body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
{body}
</dict>
</plist>
"#
        )
        .into_bytes()
    }

    fn no_fallback() -> Result<String> {
        panic!("fallback phase should not be queried");
    }

    #[test]
    fn test_decode_copying_status() {
        let doc = plist_doc(
            r#"
    <key>BackupPhase</key>
    <string>Copying</string>
    <key>ClientID</key>
    <string>com.apple.backupd</string>
    <key>Percent</key>
    <real>0.4215</real>
    <key>Progress</key>
    <dict>
        <key>TimeRemaining</key>
        <integer>3725</integer>
        <key>bytes</key>
        <integer>1048576</integer>
    </dict>
    <key>Running</key>
    <true/>
"#,
        );

        let status = RawStatus::from_plist(&doc)
            .unwrap()
            .resolve(no_fallback)
            .unwrap();

        assert_eq!(status.phase, "Copying");
        assert_eq!(status.percent, Some(0.4215));
        assert_eq!(status.etr, Some(3725.0));
        assert!(status.is_running());
    }

    #[test]
    fn test_negative_percent_is_clamped() {
        let doc = plist_doc(
            r#"
    <key>BackupPhase</key>
    <string>Copying</string>
    <key>Percent</key>
    <integer>-5</integer>
    <key>Progress</key>
    <dict>
        <key>TimeRemaining</key>
        <real>120</real>
    </dict>
"#,
        );

        let status = RawStatus::from_plist(&doc)
            .unwrap()
            .resolve(no_fallback)
            .unwrap();

        assert_eq!(status.percent, Some(0.0));
        assert_eq!(status.etr, Some(120.0));
    }

    #[test]
    fn test_clamping_holds_for_any_negative_value() {
        for p in [-0.0001, -1.0, -5.0, -100.0, f64::MIN] {
            let status = TmStatus::new("Copying", Some(p), None);
            assert_eq!(status.percent, Some(0.0));
        }
    }

    #[test]
    fn test_empty_phase_uses_fallback() {
        let doc = plist_doc(
            r#"
    <key>BackupPhase</key>
    <string></string>
    <key>Percent</key>
    <real>10</real>
"#,
        );

        let status = RawStatus::from_plist(&doc)
            .unwrap()
            .resolve(|| Ok("ThinningPreBackup\n".to_string()))
            .unwrap();

        assert_eq!(status.phase, "ThinningPreBackup");
        assert_eq!(status.percent, Some(10.0));
        assert_eq!(status.etr, None);
    }

    #[test]
    fn test_missing_phase_uses_fallback() {
        let status = RawStatus::default()
            .resolve(|| Ok("  BackupNotRunning  \n".to_string()))
            .unwrap();

        assert_eq!(status.phase, PHASE_NOT_RUNNING);
        assert!(!status.is_running());
    }

    #[test]
    fn test_blank_fallback_phase_is_never_empty() {
        let status = RawStatus::default()
            .resolve(|| Ok("\n".to_string()))
            .unwrap();

        assert_eq!(status.phase, "Unknown");
    }

    #[test]
    fn test_fallback_error_propagates() {
        let result = RawStatus::default().resolve(|| Err(anyhow::anyhow!("tmutil failed")));
        assert!(result.is_err());
    }

    #[test]
    fn test_not_running_document() {
        let doc = plist_doc(
            r#"
    <key>BackupPhase</key>
    <string>BackupNotRunning</string>
    <key>Running</key>
    <false/>
"#,
        );

        let status = RawStatus::from_plist(&doc)
            .unwrap()
            .resolve(no_fallback)
            .unwrap();

        assert_eq!(
            status,
            TmStatus {
                phase: "BackupNotRunning".to_string(),
                percent: None,
                etr: None,
            }
        );
    }

    #[test]
    fn test_string_percent_and_empty_progress() {
        let doc = plist_doc(
            r#"
    <key>BackupPhase</key>
    <string>Finishing</string>
    <key>Percent</key>
    <string>0.97</string>
    <key>Progress</key>
    <dict/>
"#,
        );

        let status = RawStatus::from_plist(&doc)
            .unwrap()
            .resolve(no_fallback)
            .unwrap();

        assert_eq!(status.percent, Some(0.97));
        assert_eq!(status.etr, None);
    }

    #[test]
    fn test_negative_time_remaining_is_unknown() {
        let status = TmStatus::new("Copying", Some(0.1), Some(-1.0));
        assert_eq!(status.etr, None);
    }

    #[test]
    fn test_malformed_document_fails() {
        assert!(RawStatus::from_plist(b"not a property list").is_err());
        assert!(RawStatus::from_plist(b"").is_err());
    }
}

//! Gatekeeper configuration
//!
//! Built-in defaults reproduce the stock deployment (three demo UIDs,
//! 115200 baud, 10 s wait window). A TOML file may override any subset of
//! keys, and command-line flags override the file.

use crate::access::AllowList;
use crate::error::GateError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// UIDs accepted when no configuration says otherwise
pub const DEFAULT_ALLOWED_UIDS: &[&str] = &["12345ABC", "67890DEF", "54321XYZ"];

pub const DEFAULT_BAUD_RATE: u32 = 115200;

pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 10;

/// Per-read poll interval; must stay below one second
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Substring identifying serial character devices on this platform
#[cfg(windows)]
pub const DEFAULT_DEVICE_PATTERN: &str = "COM";
#[cfg(not(windows))]
pub const DEFAULT_DEVICE_PATTERN: &str = "tty";

/// What to do with a line that is not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Stop the gatekeeper with an error
    #[default]
    Fatal,
    /// Log the line, send nothing, keep waiting
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// UIDs that receive GRANTED
    pub allowed_uids: Vec<String>,
    pub baud_rate: u32,
    /// Silent period after which the wait window restarts
    pub session_timeout_secs: u64,
    /// Serial read timeout used for each poll
    pub poll_interval_ms: u64,
    /// Substring a device path must contain to be auto-selected
    pub device_pattern: String,
    /// Explicit device path; skips auto-detection when set
    pub port: Option<String>,
    pub on_decode_error: DecodePolicy,
    /// Append-only record of decisions and timeouts
    pub audit_log: Option<PathBuf>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            allowed_uids: DEFAULT_ALLOWED_UIDS.iter().map(|s| s.to_string()).collect(),
            baud_rate: DEFAULT_BAUD_RATE,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            device_pattern: DEFAULT_DEVICE_PATTERN.to_string(),
            port: None,
            on_decode_error: DecodePolicy::default(),
            audit_log: None,
        }
    }
}

impl GatekeeperConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse_content(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML content; missing keys take their defaults
    pub fn parse_content(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Render as TOML, e.g. for `generate config`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Reject settings the gatekeeper cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.allow_list().is_empty() {
            return Err(GateError::Config("allowed_uids is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(GateError::Config("baud_rate must be non-zero".into()));
        }
        if self.session_timeout_secs == 0 {
            return Err(GateError::Config(
                "session_timeout_secs must be non-zero".into(),
            ));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms >= 1000 {
            return Err(GateError::Config(format!(
                "poll_interval_ms must be between 1 and 999, got {}",
                self.poll_interval_ms
            )));
        }
        if self.port.is_none() && self.device_pattern.trim().is_empty() {
            return Err(GateError::Config(
                "device_pattern is empty and no port is set".into(),
            ));
        }
        Ok(())
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::new(&self.allowed_uids)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = GatekeeperConfig::default();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.session_timeout(), Duration::from_secs(10));
        assert!(config.poll_interval() < Duration::from_secs(1));
        assert_eq!(config.on_decode_error, DecodePolicy::Fatal);
        assert!(config.allow_list().contains("12345ABC"));
        assert!(config.allow_list().contains("67890DEF"));
        assert!(config.allow_list().contains("54321XYZ"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GatekeeperConfig::parse_content(
            r#"
allowed_uids = ["CAFEBABE"]
on_decode_error = "skip"
port = "/dev/ttyACM0"
"#,
        )
        .unwrap();

        assert_eq!(config.allowed_uids, vec!["CAFEBABE".to_string()]);
        assert_eq!(config.on_decode_error, DecodePolicy::Skip);
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.session_timeout_secs, DEFAULT_SESSION_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "baud_rate = 9600").unwrap();
        writeln!(file, "session_timeout_secs = 3").unwrap();

        let config = GatekeeperConfig::load(file.path()).unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.session_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GatekeeperConfig::load(Path::new("/nonexistent/gatekeeper.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_unknown_decode_policy_rejected() {
        assert!(GatekeeperConfig::parse_content("on_decode_error = \"retry\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatekeeperConfig::default();
        config.allowed_uids = vec!["  ".into()];
        assert!(matches!(config.validate(), Err(GateError::Config(_))));

        let mut config = GatekeeperConfig::default();
        config.poll_interval_ms = 1000;
        assert!(config.validate().is_err());

        let mut config = GatekeeperConfig::default();
        config.session_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GatekeeperConfig::default();
        config.device_pattern = String::new();
        assert!(config.validate().is_err());
        config.port = Some("/dev/ttyUSB0".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_toml_parses_back() {
        let config = GatekeeperConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("allowed_uids"));
        assert_eq!(GatekeeperConfig::parse_content(&text).unwrap(), config);
    }
}

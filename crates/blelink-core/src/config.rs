//! Link manager configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::WriteKind;

/// Default scan duration before the scan is stopped automatically
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the link manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Single-shot scan timeout
    pub scan_timeout: Duration,
    /// Write mode used by `send`
    pub write_kind: WriteKind,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            write_kind: WriteKind::WithResponse,
        }
    }
}

impl LinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scan timeout
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the write mode used for outgoing messages
    pub fn with_write_kind(mut self, kind: WriteKind) -> Self {
        self.write_kind = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LinkConfig::default();
        assert_eq!(config.scan_timeout, Duration::from_secs(60));
        assert_eq!(config.write_kind, WriteKind::WithResponse);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LinkConfig::new()
            .with_scan_timeout(Duration::from_secs(5))
            .with_write_kind(WriteKind::WithoutResponse);
        assert_eq!(config.scan_timeout, Duration::from_secs(5));
        assert_eq!(config.write_kind, WriteKind::WithoutResponse);
    }
}

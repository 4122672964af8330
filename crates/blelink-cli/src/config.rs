//! blelink CLI configuration
//!
//! Configuration is layered with figment, lowest priority first:
//! - built-in defaults
//! - `blelink.toml` in the working directory
//! - `~/.blelink/config.toml`
//! - the file named by `--config`
//! - `BLELINK_*` environment variables (`__` separates sections, e.g.
//!   `BLELINK_LINK__SCAN_TIMEOUT_SECS=30`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use blelink_ble::BleAdapterConfig;
use blelink_core::{parse_uuid, LinkConfig, LinkError, PeripheralId, SessionConfig, WriteKind};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the blelink CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub link: LinkSection,
    pub ble: BleSection,
    pub session: SessionSection,
    pub cli: CliSection,
}

/// Link manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSection {
    /// Seconds before a scan stops on its own
    pub scan_timeout_secs: u64,
    /// `with_response` or `without_response`
    pub write_kind: WriteKind,
}

/// Bluetooth adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleSection {
    pub adapter_index: usize,
    pub connection_timeout_secs: u64,
    /// Only report peripherals advertising one of these services
    pub scan_services: Vec<String>,
}

/// Default session for `connect`; all four fields or none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub peripheral: Option<String>,
    pub service: Option<String>,
    pub output: Option<String>,
    pub input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSection {
    pub verbose: bool,
    /// Prompt for the interactive `connect` session
    pub prompt: String,
}

// ----------------------------------------------------------------------------
// Default Implementations
// ----------------------------------------------------------------------------

impl Default for LinkSection {
    fn default() -> Self {
        let link = LinkConfig::default();
        Self {
            scan_timeout_secs: link.scan_timeout.as_secs(),
            write_kind: link.write_kind,
        }
    }
}

impl Default for BleSection {
    fn default() -> Self {
        let ble = BleAdapterConfig::default();
        Self {
            adapter_index: ble.adapter_index,
            connection_timeout_secs: ble.connection_timeout.as_secs(),
            scan_services: Vec::new(),
        }
    }
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            verbose: false,
            prompt: "blelink> ".to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load from the standard locations plus an optional explicit file
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(explicit))
    }

    /// Layered providers, exposed so callers can merge further overrides
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file("blelink.toml"));

        if let Some(home_config) = Self::default_config_path() {
            figment = figment.merge(Toml::file(home_config));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("BLELINK_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| ConfigError::Loading(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// `~/.blelink/config.toml`, when a home directory is known
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".blelink").join("config.toml"))
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.scan_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Scan timeout must be greater than 0".to_string(),
            ));
        }
        if self.ble.connection_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }
        for service in &self.ble.scan_services {
            parse_uuid(service)?;
        }

        self.session.validate()
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig::new()
            .with_scan_timeout(Duration::from_secs(self.link.scan_timeout_secs))
            .with_write_kind(self.link.write_kind)
    }

    pub fn ble_config(&self) -> Result<BleAdapterConfig, ConfigError> {
        let services = self
            .ble
            .scan_services
            .iter()
            .map(|s| parse_uuid(s).map_err(ConfigError::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BleAdapterConfig::new()
            .with_adapter_index(self.ble.adapter_index)
            .with_connection_timeout(Duration::from_secs(self.ble.connection_timeout_secs))
            .with_scan_services(services))
    }

    /// Session from the `[session]` section, with per-field overrides
    ///
    /// `None` when neither source names any field.
    pub fn session_config(
        &self,
        overrides: &SessionSection,
    ) -> Result<Option<SessionConfig>, ConfigError> {
        let merged = SessionSection {
            peripheral: overrides.peripheral.clone().or_else(|| self.session.peripheral.clone()),
            service: overrides.service.clone().or_else(|| self.session.service.clone()),
            output: overrides.output.clone().or_else(|| self.session.output.clone()),
            input: overrides.input.clone().or_else(|| self.session.input.clone()),
        };
        merged.validate()?;
        merged.to_session()
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let example = AppConfig {
            session: SessionSection {
                peripheral: Some("AA:BB:CC:DD:EE:01".to_string()),
                service: Some("FFE0".to_string()),
                output: Some("FFE1".to_string()),
                input: Some("FFE2".to_string()),
            },
            ..Default::default()
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

impl SessionSection {
    fn fields(&self) -> [(&'static str, &Option<String>); 4] {
        [
            ("peripheral", &self.peripheral),
            ("service", &self.service),
            ("output", &self.output),
            ("input", &self.input),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// All four fields or none, with parseable UUIDs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Ok(());
        }

        let missing: Vec<&str> = self
            .fields()
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(LinkError::IncompleteSessionConfig {
                missing: missing.join(", "),
            }
            .into());
        }

        for (_, value) in &self.fields()[1..] {
            if let Some(uuid) = value {
                parse_uuid(uuid)?;
            }
        }
        Ok(())
    }

    fn to_session(&self) -> Result<Option<SessionConfig>, ConfigError> {
        let (Some(peripheral), Some(service), Some(output), Some(input)) =
            (&self.peripheral, &self.service, &self.output, &self.input)
        else {
            return Ok(None);
        };

        Ok(Some(SessionConfig::new(
            PeripheralId::new(peripheral.as_str()),
            parse_uuid(service)?,
            parse_uuid(output)?,
            parse_uuid(input)?,
        )))
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Session configuration error: {0}")]
    Session(#[from] LinkError),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use blelink_core::uuid_from_u16;
    use figment::Jail;

    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert!(!config.cli.verbose);
        assert_eq!(config.cli.prompt, "blelink> ");
        assert_eq!(config.link.scan_timeout_secs, 60);
        assert_eq!(config.link.write_kind, WriteKind::WithResponse);
        assert!(config.session.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_link_config_conversion() {
        let mut config = AppConfig::default();
        config.link.scan_timeout_secs = 15;
        config.link.write_kind = WriteKind::WithoutResponse;

        let link = config.link_config();
        assert_eq!(link.scan_timeout, Duration::from_secs(15));
        assert_eq!(link.write_kind, WriteKind::WithoutResponse);
    }

    #[test]
    fn test_partial_session_is_rejected() {
        let mut config = AppConfig::default();
        config.session.peripheral = Some("AA:BB".to_string());
        config.session.service = Some("FFE0".to_string());

        match config.validate() {
            Err(ConfigError::Session(LinkError::IncompleteSessionConfig { missing })) => {
                assert_eq!(missing, "output, input");
            }
            other => panic!("expected incomplete session, got {:?}", other),
        }
    }

    #[test]
    fn test_session_with_bad_uuid_is_rejected() {
        let session = SessionSection {
            peripheral: Some("AA:BB".to_string()),
            service: Some("not-a-uuid".to_string()),
            output: Some("FFE1".to_string()),
            input: Some("FFE2".to_string()),
        };
        assert!(matches!(
            session.validate(),
            Err(ConfigError::Session(LinkError::InvalidUuid(_)))
        ));
    }

    #[test]
    fn test_session_overrides_fill_in_configured_fields() {
        let config = AppConfig {
            session: SessionSection {
                peripheral: Some("AA:BB:CC:DD:EE:01".to_string()),
                service: Some("FFE0".to_string()),
                output: Some("FFE1".to_string()),
                input: Some("FFE2".to_string()),
            },
            ..Default::default()
        };
        let overrides = SessionSection {
            peripheral: Some("AA:BB:CC:DD:EE:02".to_string()),
            ..Default::default()
        };

        let session = config.session_config(&overrides).unwrap().unwrap();
        assert_eq!(session.peripheral.as_str(), "AA:BB:CC:DD:EE:02");
        assert_eq!(session.service_uuid, uuid_from_u16(0xFFE0));
        assert_eq!(session.input_uuid, uuid_from_u16(0xFFE2));
    }

    #[test]
    fn test_no_session_anywhere() {
        let config = AppConfig::default();
        assert_eq!(config.session_config(&SessionSection::default()).unwrap(), None);
    }

    #[test]
    fn test_layered_loading() {
        Jail::expect_with(|jail| {
            let home = jail.directory().display().to_string();
            jail.set_env("HOME", home);
            jail.create_file(
                "blelink.toml",
                r#"
                [link]
                scan_timeout_secs = 20
                write_kind = "without_response"

                [cli]
                prompt = "> "
                "#,
            )?;
            jail.set_env("BLELINK_LINK__SCAN_TIMEOUT_SECS", "5");

            let config = AppConfig::load(None).map_err(|e| e.to_string())?;

            assert_eq!(config.link.scan_timeout_secs, 5);
            assert_eq!(config.link.write_kind, WriteKind::WithoutResponse);
            assert_eq!(config.cli.prompt, "> ");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_overrides_working_directory() {
        Jail::expect_with(|jail| {
            let home = jail.directory().display().to_string();
            jail.set_env("HOME", home);
            jail.create_file("blelink.toml", "[ble]\nadapter_index = 1\n")?;
            jail.create_file("custom.toml", "[ble]\nadapter_index = 2\n")?;

            let config =
                AppConfig::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.ble.adapter_index, 2);
            Ok(())
        });
    }

    #[test]
    fn test_incomplete_session_file_fails_to_load() {
        Jail::expect_with(|jail| {
            let home = jail.directory().display().to_string();
            jail.set_env("HOME", home);
            jail.create_file("blelink.toml", "[session]\nperipheral = \"AA:BB\"\n")?;

            assert!(matches!(
                AppConfig::load(None),
                Err(ConfigError::Session(LinkError::IncompleteSessionConfig { .. }))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_example_config_generation() {
        let example = AppConfig::example_config();
        assert!(example.contains("[link]"));
        assert!(example.contains("[session]"));
        assert!(example.contains("[cli]"));

        let parsed: AppConfig = toml::from_str(&example).unwrap();
        assert!(parsed.validate().is_ok());
    }
}

//! Configuration types for gcap

use serde::{Deserialize, Serialize};

use crate::{GcapError, Result};

/// Reader configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Index read-ahead tuning
    #[serde(default)]
    pub read_ahead: ReadAheadConfig,
    /// Packet unrolling limits
    #[serde(default)]
    pub unroll: UnrollConfig,
}

/// Index read-ahead tuning
///
/// When a request lands behind the index watermark but within
/// `trigger_distance` of it, the index is extended `span` positions past
/// the request before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadAheadConfig {
    /// Whether read-ahead is performed at all
    pub enabled: bool,
    /// Maximum distance behind the watermark that triggers read-ahead
    pub trigger_distance: u64,
    /// Positions to index past the requested one
    pub span: u64,
}

impl Default for ReadAheadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_distance: 10,
            span: 300,
        }
    }
}

/// Packet unrolling limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnrollConfig {
    /// Maximum composite nesting depth
    pub max_depth: usize,
}

impl Default for UnrollConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl ReaderConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GcapError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GcapError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.read_ahead.enabled && self.read_ahead.span == 0 {
            return Err(GcapError::Config(
                "read_ahead.span must be > 0 when read-ahead is enabled".to_string(),
            ));
        }

        if self.unroll.max_depth == 0 {
            return Err(GcapError::Config(
                "unroll.max_depth must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config: ReaderConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReaderConfig::default());
        assert_eq!(config.read_ahead.trigger_distance, 10);
        assert_eq!(config.read_ahead.span, 300);
        assert_eq!(config.unroll.max_depth, 32);
    }

    #[test]
    fn test_config_parse() {
        let config_toml = r"
            [read_ahead]
            span = 1000

            [unroll]
            max_depth = 8
        ";

        let config: ReaderConfig = toml::from_str(config_toml).unwrap();
        assert!(config.read_ahead.enabled);
        assert_eq!(config.read_ahead.trigger_distance, 10);
        assert_eq!(config.read_ahead.span, 1000);
        assert_eq!(config.unroll.max_depth, 8);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[read_ahead]\nenabled = false\nspan = 0\n")
            .unwrap();

        let config = ReaderConfig::from_file(file.path()).unwrap();
        assert!(!config.read_ahead.enabled);
    }

    #[test]
    fn test_invalid_config() {
        let config: ReaderConfig = toml::from_str("[unroll]\nmax_depth = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(GcapError::Config(_))));

        let config: ReaderConfig = toml::from_str("[read_ahead]\nspan = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}

use crate::core::domain::{RetryPolicy, TargetAddress};
use crate::core::error::{FtpError, FtpResult};
use crate::protocol::{DEFAULT_READ_CHUNK, MAX_WIRE_DATA_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    pub target: TargetAddress,
    /// Wait per attempt, in milliseconds
    pub timeout_ms: u64,
    /// Transmissions per exchange before giving up
    pub max_retries: u32,
    /// Optional bound on the whole retry loop of one exchange
    pub exchange_deadline_ms: Option<u64>,
    /// Bytes requested per READ_FILE
    pub read_chunk_size: u8,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            target: TargetAddress::default(),
            timeout_ms: 200,
            max_retries: 6,
            exchange_deadline_ms: None,
            read_chunk_size: DEFAULT_READ_CHUNK,
        }
    }
}

impl FtpConfig {
    /// Load configuration from file or create default
    pub fn load_or_default(config_path: Option<&str>) -> Self {
        if let Some(config) = config_path
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
        {
            return config;
        }
        Self::default()
    }

    /// Load configuration from a file, failing on unreadable or invalid content
    pub fn load(config_path: &str) -> FtpResult<Self> {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| FtpError::Config(format!("{}: {}", config_path, e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| FtpError::Config(format!("{}: {}", config_path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, config_path: &str) -> FtpResult<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| FtpError::Config(e.to_string()))?;
        std::fs::write(config_path, content)
            .map_err(|e| FtpError::Config(format!("{}: {}", config_path, e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> FtpResult<()> {
        if self.timeout_ms == 0 {
            return Err(FtpError::Config("timeout must be greater than 0".into()));
        }

        if self.max_retries == 0 {
            return Err(FtpError::Config("max retries must be greater than 0".into()));
        }

        if self.exchange_deadline_ms == Some(0) {
            return Err(FtpError::Config("exchange deadline must be greater than 0".into()));
        }

        if self.read_chunk_size == 0 || self.read_chunk_size as usize > MAX_WIRE_DATA_LEN {
            return Err(FtpError::Config(format!(
                "read chunk size must be between 1 and {}",
                MAX_WIRE_DATA_LEN
            )));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            max_attempts: self.max_retries,
            deadline: self.exchange_deadline_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FtpConfig::default();
        config.validate().expect("Default config should be valid");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.read_chunk_size, 230);
    }

    #[test]
    fn test_config_serialization() {
        let config = FtpConfig::default();
        let json = serde_json::to_string(&config).expect("Should serialize");
        let deserialized: FtpConfig = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: FtpConfig = serde_json::from_str(r#"{ "max_retries": 3 }"#).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout_ms, 200);
        assert_eq!(config.target, TargetAddress::default());
    }
}

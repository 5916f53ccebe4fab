use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dnssec::constants::MAX_NSEC3_ITERATIONS;
use crate::error::ConfigError;

/// Upper bound for the NSEC3 iteration limit (RFC 5155 section 10.3)
const NSEC3_ITERATIONS_CEILING: u16 = 2500;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Whether the validation layer is registered at all
    pub enabled: bool,

    /// NSEC3 records with more iterations are unusable for proofs
    pub max_nsec3_iterations: u16,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,

    /// Fixed validation time in seconds since the epoch (None = wall clock)
    pub time_override: Option<u32>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_nsec3_iterations: MAX_NSEC3_ITERATIONS,
            log_level: "info".to_string(),
            time_override: None,
        }
    }
}

impl ValidatorConfig {
    /// Create a ValidatorConfig from environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(enabled) = std::env::var("HEIMDALL_VALIDATOR_ENABLED") {
            config.enabled = parse_bool(&enabled, true);
        }

        if let Ok(iterations) = std::env::var("HEIMDALL_VALIDATOR_MAX_NSEC3_ITERATIONS") {
            config.max_nsec3_iterations = iterations
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidIterationLimit(iterations.clone()))?;
        }

        if let Ok(log_level) = std::env::var("HEIMDALL_VALIDATOR_LOG_LEVEL") {
            config.log_level = log_level.to_lowercase();
        }

        if let Ok(time) = std::env::var("HEIMDALL_VALIDATOR_TIME") {
            if !time.is_empty() {
                config.time_override = Some(time.parse::<u32>().map_err(|_| {
                    ConfigError::ParseError(format!("Invalid validation time: {}", time))
                })?);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nsec3_iterations == 0 {
            return Err(ConfigError::InvalidIterationLimit(
                "Iteration limit must be greater than 0".to_string(),
            ));
        }

        if self.max_nsec3_iterations > NSEC3_ITERATIONS_CEILING {
            return Err(ConfigError::InvalidIterationLimit(format!(
                "Iteration limit too large (max {})",
                NSEC3_ITERATIONS_CEILING
            )));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

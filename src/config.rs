//! Engine configuration.
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//!
//! ```json
//! { "order_capacity": 250000, "index_capacity": 16384 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arena::NULL_INDEX;
use crate::error::ConfigError;

/// Default number of orders the arena can hold.
pub const DEFAULT_ORDER_CAPACITY: u32 = 1_000_000;

/// Default number of order index entries reserved up front.
pub const DEFAULT_INDEX_CAPACITY: usize = 65_536;

/// Largest arena the `u32` index space can address (`NULL_INDEX` is reserved).
pub const MAX_ORDER_CAPACITY: u32 = NULL_INDEX - 1;

/// Sizing knobs for a [`MatchingEngine`](crate::matching::MatchingEngine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of simultaneously resting orders (arena size).
    pub order_capacity: u32,
    /// Order index entries to reserve at startup; the index grows past this.
    pub index_capacity: usize,
}

impl EngineConfig {
    /// Config for `order_capacity` orders, clamped to [`MAX_ORDER_CAPACITY`].
    pub fn with_capacity(order_capacity: u32) -> Self {
        let order_capacity = order_capacity.min(MAX_ORDER_CAPACITY);
        Self {
            order_capacity,
            index_capacity: DEFAULT_INDEX_CAPACITY.min(order_capacity as usize),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order_capacity > MAX_ORDER_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                requested: self.order_capacity,
                max: MAX_ORDER_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_capacity: DEFAULT_ORDER_CAPACITY,
            index_capacity: DEFAULT_INDEX_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.order_capacity, DEFAULT_ORDER_CAPACITY);
        assert_eq!(config.index_capacity, DEFAULT_INDEX_CAPACITY);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = EngineConfig::from_json(r#"{ "order_capacity": 250000 }"#).unwrap();
        assert_eq!(config.order_capacity, 250_000);
        assert_eq!(config.index_capacity, DEFAULT_INDEX_CAPACITY);

        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::with_capacity(4_096);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "order_capacity": 4294967295 }"#),
            Err(ConfigError::CapacityTooLarge { requested: u32::MAX, .. })
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "order_capacity": -1 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/lob-kernel.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_with_capacity_clamps_to_index_space() {
        let config = EngineConfig::with_capacity(u32::MAX);
        assert_eq!(config.order_capacity, MAX_ORDER_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_index_never_reserves_beyond_capacity() {
        let config = EngineConfig::with_capacity(500);
        assert_eq!(config.order_capacity, 500);
        assert_eq!(config.index_capacity, 500);

        let config = EngineConfig::with_capacity(2_000_000);
        assert_eq!(config.index_capacity, DEFAULT_INDEX_CAPACITY);
    }
}

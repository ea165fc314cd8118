use dotenv::dotenv;
use std::env;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

const INSTRUMENT_ID: &str = "LOB_INSTRUMENT_ID";
const PRICE_SCALE: &str = "LOB_PRICE_SCALE";
const SIZE_SCALE: &str = "LOB_SIZE_SCALE";
const CROSS_LIMIT_ORDERS: &str = "LOB_CROSS_LIMIT_ORDERS";
const WORKER_QUEUE: &str = "LOB_WORKER_QUEUE";
const LOG_LEVEL: &str = "LOB_LOG_LEVEL";

/// Largest scale rust_decimal can represent.
const MAX_SCALE: u32 = 28;

/// Errors raised while reading the engine configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse environment variable {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("scale {0} exceeds the supported maximum of 28 decimal places")]
    ScaleTooLarge(u32),

    #[error("worker queue capacity must be greater than zero")]
    EmptyQueue,
}

/// Runtime settings of one matching engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub instrument_id: Uuid,
    /// Decimal places of one price tick, used for display only.
    pub price_scale: u32,
    /// Decimal places of one size lot, used for display only.
    pub size_scale: u32,
    /// Cross marketable limit orders against the opposite side before resting them.
    pub cross_limit_orders: bool,
    /// Capacity of the engine worker's request queue.
    pub worker_queue: usize,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument_id: Uuid::new_v4(),
            price_scale: 2,
            size_scale: 0,
            cross_limit_orders: false,
            worker_queue: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration, falling back to defaults when the environment is invalid.
    pub fn from_env() -> EngineConfig {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => {
                warn!("invalid engine configuration ({}), using defaults", err);
                Self::default()
            }
        }
    }

    /// Loads the configuration from the environment (and a `.env` file if present).
    /// Unset variables keep their default value.
    pub fn try_from_env() -> Result<EngineConfig, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<EngineConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let instrument_id = match lookup(INSTRUMENT_ID) {
            Some(raw) => Uuid::parse_str(raw.trim()).map_err(|_| ConfigError::InvalidValue {
                name: INSTRUMENT_ID,
                value: raw,
            })?,
            None => defaults.instrument_id,
        };

        let price_scale = parse_or(&lookup, PRICE_SCALE, defaults.price_scale)?;
        let size_scale = parse_or(&lookup, SIZE_SCALE, defaults.size_scale)?;
        for scale in [price_scale, size_scale] {
            if scale > MAX_SCALE {
                return Err(ConfigError::ScaleTooLarge(scale));
            }
        }

        let cross_limit_orders = parse_or(&lookup, CROSS_LIMIT_ORDERS, defaults.cross_limit_orders)?;

        let worker_queue = parse_or(&lookup, WORKER_QUEUE, defaults.worker_queue)?;
        if worker_queue == 0 {
            return Err(ConfigError::EmptyQueue);
        }

        let log_level = lookup(LOG_LEVEL)
            .map(|raw| raw.trim().to_lowercase())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(defaults.log_level);

        Ok(EngineConfig {
            instrument_id,
            price_scale,
            size_scale,
            cross_limit_orders,
            worker_queue,
            log_level,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.price_scale, 2);
        assert_eq!(config.size_scale, 0);
        assert!(!config.cross_limit_orders);
        assert_eq!(config.worker_queue, 1024);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_reads_all_values() {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let config = EngineConfig::from_lookup(lookup_from(&[
            (INSTRUMENT_ID, id_str.as_str()),
            (PRICE_SCALE, "4"),
            (SIZE_SCALE, " 3 "),
            (CROSS_LIMIT_ORDERS, "true"),
            (WORKER_QUEUE, "16"),
            (LOG_LEVEL, "DEBUG"),
        ]))
        .unwrap();

        assert_eq!(config.instrument_id, id);
        assert_eq!(config.price_scale, 4);
        assert_eq!(config.size_scale, 3);
        assert!(config.cross_limit_orders);
        assert_eq!(config.worker_queue, 16);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = EngineConfig::from_lookup(lookup_from(&[(CROSS_LIMIT_ORDERS, "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue { name: CROSS_LIMIT_ORDERS, value: "maybe".to_string() }
        );

        let err = EngineConfig::from_lookup(lookup_from(&[(PRICE_SCALE, "40")])).unwrap_err();
        assert_eq!(err, ConfigError::ScaleTooLarge(40));

        let err = EngineConfig::from_lookup(lookup_from(&[(WORKER_QUEUE, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyQueue);

        assert!(EngineConfig::from_lookup(lookup_from(&[(INSTRUMENT_ID, "not-a-uuid")])).is_err());
    }
}

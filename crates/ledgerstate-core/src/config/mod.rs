//! Engine configuration.
//!
//! Parsed once at process start-up and handed to `State::with_config`; the
//! engine itself never reads the environment.

use crate::codec::DEFAULT_MAX_VALUE_BYTES;
use serde::Deserialize;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid state config: {0}")]
    Parse(String),

    #[error("invalid state config: {field} must be greater than zero")]
    Zero { field: &'static str },
}

///
/// PrivateListing
///
/// How `list_private` walks a private collection. Not every deployment
/// exposes a private partial-key iterator; `PublicKeys` walks the mirrored
/// public key space and fetches each private value by key.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PrivateListing {
    #[default]
    PrivateIterator,
    PublicKeys,
}

///
/// StateConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Upper bound on one stored payload, checked on encode and decode.
    pub max_value_bytes: usize,

    /// Row cap used by `State::query` when the builder sets no limit.
    pub query_page_size: u32,

    pub private_listing: PrivateListing,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
            query_page_size: 100,
            private_listing: PrivateListing::default(),
        }
    }
}

impl StateConfig {
    /// Parse a flat TOML document; missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_value_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "max_value_bytes",
            });
        }
        if self.query_page_size == 0 {
            return Err(ConfigError::Zero {
                field: "query_page_size",
            });
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = StateConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config, StateConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = StateConfig::from_toml_str(
            r#"
            max_value_bytes = 1024
            private_listing = "public_keys"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.max_value_bytes, 1024);
        assert_eq!(config.query_page_size, 100);
        assert_eq!(config.private_listing, PrivateListing::PublicKeys);
    }

    #[test]
    fn unknown_fields_and_zero_limits_are_rejected() {
        assert!(matches!(
            StateConfig::from_toml_str("max_rows = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StateConfig::from_toml_str("query_page_size = 0"),
            Err(ConfigError::Zero {
                field: "query_page_size"
            })
        ));
    }
}

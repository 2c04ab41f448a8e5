//! Registry configuration from defaults and environment variables.

use crate::domain::value_objects::Address;
use crate::domain::verification::ExistenceCheck;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Well-known address of the token-ledger service (`0x…0167`).
pub const DEFAULT_TOKEN_SERVICE_ADDRESS: Address = Address::from_low_u64(0x167);

/// Default number of retained operation traces.
pub const DEFAULT_TRACE_HISTORY: usize = 64;

/// How the token-service adapter treats a call that did not complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenServiceMode {
    /// Propagate the communication failure as-is.
    Strict,
    /// Substitute `INVALID_TRANSACTION` for the communication failure.
    #[default]
    Defensive,
}

impl FromStr for TokenServiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "defensive" => Ok(Self::Defensive),
            other => Err(format!("expected `strict` or `defensive`, got `{other}`")),
        }
    }
}

/// Configuration for [`crate::service::BiodiversityRegistryService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Failure strategy of the token-service adapter.
    pub token_service_mode: TokenServiceMode,
    /// Address every token-service call is dispatched to.
    pub token_service_address: Address,
    /// Existence rule applied by verification.
    pub existence_check: ExistenceCheck,
    /// Number of recent operation traces kept for inspection.
    pub trace_history: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            token_service_mode: TokenServiceMode::default(),
            token_service_address: DEFAULT_TOKEN_SERVICE_ADDRESS,
            existence_check: ExistenceCheck::default(),
            trace_history: DEFAULT_TRACE_HISTORY,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BR_TOKEN_SERVICE_MODE`: `strict` or `defensive` (default: defensive)
    /// - `BR_TOKEN_SERVICE_ADDRESS`: 0x-hex address (default: 0x…0167)
    /// - `BR_EXISTENCE_CHECK`: `score` or `presence` (default: score)
    /// - `BR_TRACE_HISTORY`: retained traces (default: 64)
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if a value is present but unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            token_service_mode: parse_var(&lookup, "BR_TOKEN_SERVICE_MODE")?
                .unwrap_or(defaults.token_service_mode),
            token_service_address: parse_var(&lookup, "BR_TOKEN_SERVICE_ADDRESS")?
                .unwrap_or(defaults.token_service_address),
            existence_check: parse_var(&lookup, "BR_EXISTENCE_CHECK")?
                .unwrap_or(defaults.existence_check),
            trace_history: parse_var(&lookup, "BR_TRACE_HISTORY")?
                .unwrap_or(defaults.trace_history),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
    }
}
